//! List command - show all listening ports.

use anyhow::Result;
use portscope_core::{Config, PortInfo};

use crate::format::truncate;

pub fn filter_ports(
    ports: Vec<PortInfo>,
    port_filter: Option<u16>,
    name_filter: Option<&str>,
) -> Vec<PortInfo> {
    let name_lower = name_filter.map(str::to_lowercase);
    ports
        .into_iter()
        .filter(|port| port_filter.map_or(true, |p| port.port == p))
        .filter(|port| {
            name_lower
                .as_deref()
                .map_or(true, |name| port.process_name.to_lowercase().contains(name))
        })
        .collect()
}

pub async fn run(
    config: &Config,
    port_filter: Option<u16>,
    name_filter: Option<String>,
    json: bool,
) -> Result<()> {
    let registry = super::registry(config);
    let ports = registry.detect_ports().await?;
    let ports = filter_ports(ports, port_filter, name_filter.as_deref());
    let result = super::organizer(config).organize(ports);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.ports.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    // Table header
    println!(
        "{:<6} {:<5} {:<8} {:<20} {:<15} {:<10} COMMAND",
        "PORT", "PROTO", "PID", "PROCESS", "ADDRESS", "USER"
    );
    println!("{}", "-".repeat(90));

    for group in &result.groups {
        println!("\n{} ({})", group.name, group.ports.len());
        for port in &group.ports {
            println!(
                "{:<6} {:<5} {:<8} {:<20} {:<15} {:<10} {}",
                port.port,
                port.protocol,
                port.pid,
                truncate(&port.process_name, 20),
                truncate(&port.address, 15),
                truncate(&port.user, 10),
                truncate(&port.command, 40)
            );
        }
    }

    println!("\nTotal: {} ports", result.ports.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portscope_core::Protocol;

    fn sample() -> Vec<PortInfo> {
        vec![
            PortInfo::new(3000, Protocol::Tcp, 1, "node"),
            PortInfo::new(5432, Protocol::Tcp, 2, "postgres"),
            PortInfo::new(3000, Protocol::Tcp, 3, "Node"),
        ]
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(filter_ports(sample(), None, None).len(), 3);
    }

    #[test]
    fn test_port_filter() {
        let ports = filter_ports(sample(), Some(3000), None);
        assert_eq!(ports.len(), 2);
        assert!(ports.iter().all(|p| p.port == 3000));
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let ports = filter_ports(sample(), None, Some("NODE"));
        assert_eq!(ports.len(), 2);

        let ports = filter_ports(sample(), Some(5432), Some("node"));
        assert!(ports.is_empty());
    }
}
