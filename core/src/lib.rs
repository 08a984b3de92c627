//! PortScope Core Library
//!
//! Cross-platform library for inspecting listening ports and the processes
//! that own them. Provides functionality to:
//! - Detect listening TCP and UDP ports with their owning processes
//! - Classify ports by role (dev server, API, database, ...)
//! - Group classified ports for display
//! - Kill or inspect the owning process
//! - Drive a keyboard dashboard over the result
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//! - `dashboard`: Interactive state machine, independent of the terminal
//!
//! # Platform Support
//! - Linux: Uses `ss`, falling back to `lsof`, plus `ps`
//! - macOS and other Unix-likes: Uses `lsof` and `ps`
//! - Windows: Uses `netstat`, `tasklist` and PowerShell

pub mod adapters;
pub mod application;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{
    default_presets, PortCategory, PortDetectionResult, PortGroup, PortInfo, PortRange, Protocol,
    TypeClassifier, TypePreset,
};

// Re-export other commonly used types
pub use adapters::Platform;
pub use application::{PortOrganizer, PortRegistry};
pub use cache::TtlCache;
pub use config::{Config, ConfigStore};
pub use dashboard::{Dashboard, DashboardHost, DashboardState, DashboardView, Keymap, Shortcut};
pub use error::{Error, Result};
pub use ports::PlatformAdapter;
