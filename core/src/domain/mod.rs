//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod category;
mod classifier;
mod group;
mod port;
mod preset;

// Re-export all domain types
pub use category::PortCategory;
pub use classifier::{default_presets, TypeClassifier};
pub use group::{PortDetectionResult, PortGroup};
pub use port::{ListenerKey, PortInfo, Protocol};
pub use preset::{PortRange, TypePreset};
