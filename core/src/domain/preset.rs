//! Declarative classification rules.

use serde::{Deserialize, Serialize};

use super::{PortCategory, PortInfo};

/// Inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl PortRange {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, port: u16) -> bool {
        self.min <= port && port <= self.max
    }
}

/// A classification rule.
///
/// A preset matches when any one of its criteria matches. A preset without
/// any criteria matches everything and belongs at the lowest priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypePreset {
    /// Category assigned on match.
    pub name: PortCategory,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub port_ranges: Vec<PortRange>,
    /// Case-insensitive substrings of the command line.
    #[serde(default)]
    pub command_patterns: Vec<String>,
    /// Case-insensitive substrings of the process name.
    #[serde(default)]
    pub process_patterns: Vec<String>,
    /// Higher priority is checked first.
    #[serde(default)]
    pub priority: i32,
}

impl TypePreset {
    pub fn new(name: PortCategory, priority: i32) -> Self {
        Self {
            name,
            ports: Vec::new(),
            port_ranges: Vec::new(),
            command_patterns: Vec::new(),
            process_patterns: Vec::new(),
            priority,
        }
    }

    pub fn with_ports(mut self, ports: &[u16]) -> Self {
        self.ports = ports.to_vec();
        self
    }

    pub fn with_ranges(mut self, ranges: &[PortRange]) -> Self {
        self.port_ranges = ranges.to_vec();
        self
    }

    pub fn with_command_patterns(mut self, patterns: &[&str]) -> Self {
        self.command_patterns = patterns.iter().map(|p| p.to_lowercase()).collect();
        self
    }

    pub fn with_process_patterns(mut self, patterns: &[&str]) -> Self {
        self.process_patterns = patterns.iter().map(|p| p.to_lowercase()).collect();
        self
    }

    /// True when the preset declares no criteria at all.
    pub fn is_fallback(&self) -> bool {
        self.ports.is_empty()
            && self.port_ranges.is_empty()
            && self.command_patterns.is_empty()
            && self.process_patterns.is_empty()
    }

    /// Evaluate this rule against a port.
    pub fn matches(&self, port: &PortInfo) -> bool {
        if self.is_fallback() {
            return true;
        }

        if self.ports.contains(&port.port) {
            return true;
        }

        if self.port_ranges.iter().any(|r| r.contains(port.port)) {
            return true;
        }

        let command = port.command.to_lowercase();
        if contains_any(&command, &self.command_patterns) {
            return true;
        }

        let process = port.process_name.to_lowercase();
        contains_any(&process, &self.process_patterns)
    }
}

fn contains_any(haystack: &str, patterns: &[String]) -> bool {
    !haystack.is_empty()
        && patterns
            .iter()
            .any(|p| !p.is_empty() && haystack.contains(&p.to_lowercase()))
}
