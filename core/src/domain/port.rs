//! Port and process domain models.

use serde::{Deserialize, Serialize};

use super::PortCategory;

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ListenerKey
// ============================================================================

/// Identity of one logical listener: the same port bound by the same process.
///
/// Protocol is not part of the key, a TCP and a UDP socket on the same
/// port/pid pair collapse into one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    pub port: u16,
    pub pid: u32,
}

impl std::fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.port, self.pid)
    }
}

// ============================================================================
// PortInfo
// ============================================================================

/// Information about a listening port and its owning process.
///
/// Produced by a detection pass and never mutated afterwards; classification
/// yields a new value through [`PortInfo::with_category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfo {
    /// The port number (1-65535).
    pub port: u16,
    /// Transport protocol of the socket.
    pub protocol: Protocol,
    /// Process ID of the owning process.
    pub pid: u32,
    /// Name of the owning process.
    pub process_name: String,
    /// Local address the socket is bound to (e.g. "*", "127.0.0.1", "::1").
    pub address: String,
    /// Command line that started the process. May be truncated by the adapter.
    pub command: String,
    /// Working directory of the process, when the platform reports it.
    pub cwd: Option<String>,
    /// Username of the process owner.
    pub user: String,
    /// Resident memory in KB.
    pub memory: Option<u64>,
    /// CPU usage percentage.
    pub cpu: Option<f32>,
    /// Process uptime in seconds.
    pub lifetime: Option<u64>,
    /// Category assigned by the classifier.
    pub category: Option<PortCategory>,
}

impl PortInfo {
    /// Create a raw observation with no enrichment.
    pub fn new(port: u16, protocol: Protocol, pid: u32, process_name: impl Into<String>) -> Self {
        Self {
            port,
            protocol,
            pid,
            process_name: process_name.into(),
            address: "*".to_string(),
            command: String::new(),
            cwd: None,
            user: String::new(),
            memory: None,
            cpu: None,
            lifetime: None,
            category: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_cwd(mut self, cwd: Option<String>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn with_usage(mut self, memory: Option<u64>, cpu: Option<f32>) -> Self {
        self.memory = memory;
        self.cpu = cpu;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Option<u64>) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Return a copy of this observation tagged with a category.
    pub fn with_category(mut self, category: PortCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Deduplication and cache key.
    pub fn key(&self) -> ListenerKey {
        ListenerKey {
            port: self.port,
            pid: self.pid,
        }
    }

    /// Check if this port matches a search query.
    ///
    /// Searches across process name, port number, PID, address, user, command
    /// and the category label.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
            || self.address.to_lowercase().contains(&query_lower)
            || self.user.to_lowercase().contains(&query_lower)
            || self.command.to_lowercase().contains(&query_lower)
            || self
                .category
                .as_ref()
                .is_some_and(|c| c.as_str().contains(&query_lower))
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{} (PID: {}, Process: {})",
            self.address, self.port, self.protocol, self.pid, self.process_name
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_port_defaults() {
        let port = PortInfo::new(3000, Protocol::Tcp, 1234, "node");
        assert_eq!(port.port, 3000);
        assert_eq!(port.pid, 1234);
        assert_eq!(port.address, "*");
        assert!(port.category.is_none());
        assert!(port.cwd.is_none());
    }

    #[test]
    fn test_key_ignores_protocol() {
        let tcp = PortInfo::new(5353, Protocol::Tcp, 10, "mdns");
        let udp = PortInfo::new(5353, Protocol::Udp, 10, "mdns");
        assert_eq!(tcp.key(), udp.key());
        assert_eq!(tcp.key().to_string(), "5353-10");
    }

    #[test]
    fn test_matches_search() {
        let port = PortInfo::new(3000, Protocol::Tcp, 1234, "node")
            .with_address("127.0.0.1")
            .with_user("testuser")
            .with_command("node server.js")
            .with_category(PortCategory::DevServer);

        assert!(port.matches_search("node"));
        assert!(port.matches_search("3000"));
        assert!(port.matches_search("1234"));
        assert!(port.matches_search("127.0.0.1"));
        assert!(port.matches_search("TESTUSER"));
        assert!(port.matches_search("server.js"));
        assert!(port.matches_search("dev-server"));
        assert!(port.matches_search(""));
        assert!(!port.matches_search("nginx"));
    }

    #[test]
    fn test_protocol_serializes_uppercase() {
        let json = serde_json::to_string(&Protocol::Udp).unwrap();
        assert_eq!(json, "\"UDP\"");
    }
}
