//! Interactive dashboard over the organized port list.
//!
//! The controller is independent of any terminal library: rendering and
//! clipboard access go through [`DashboardHost`].

mod controller;
mod keymap;
mod state;

pub use controller::{Dashboard, DashboardHost, COMMAND_PLACEHOLDER, KILL_GRACE_PERIOD, NO_LOGS};
pub use keymap::{Keymap, Shortcut};
pub use state::{build_rows, ConfirmAction, DashboardState, DashboardView, SortKey, VisibleRow};
