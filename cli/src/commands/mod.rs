//! Non-interactive sub-commands.

pub mod config;
pub mod inspect;
pub mod kill;
pub mod list;

use portscope_core::{Config, Platform, PortOrganizer, PortRegistry};

fn registry(config: &Config) -> PortRegistry<Platform> {
    PortRegistry::with_freshness(Platform::detect(), config.freshness_window())
}

fn organizer(config: &Config) -> PortOrganizer {
    PortOrganizer::new(config.classifier())
}
