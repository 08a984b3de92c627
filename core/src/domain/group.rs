//! Grouped detection results handed to the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PortCategory, PortInfo};

/// Ports sharing one category, rebuilt on every classification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortGroup {
    /// Stable identifier, `category:<name>`.
    pub id: String,
    /// Display label.
    pub name: String,
    pub category: PortCategory,
    pub ports: Vec<PortInfo>,
    pub collapsed: bool,
}

impl PortGroup {
    pub fn new(category: PortCategory) -> Self {
        Self {
            id: format!("category:{}", category.as_str()),
            name: category.display_name().to_string(),
            category,
            ports: Vec::new(),
            collapsed: false,
        }
    }
}

/// One refresh worth of classified ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDetectionResult {
    /// Flat list of classified ports, in detection order.
    pub ports: Vec<PortInfo>,
    /// Groups in display order.
    pub groups: Vec<PortGroup>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}
