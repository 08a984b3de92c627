//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod port_organizer;
mod port_registry;
pub mod process;

pub use port_organizer::{compare_groups, group_ports, PortOrganizer};
pub use port_registry::{deduplicate, PortRegistry, DEFAULT_FRESHNESS_WINDOW};
pub use process::{full_command, ProcessDetails, ProcessLogs};
