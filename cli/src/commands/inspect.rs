//! Inspect command - details about the processes on one port.

use anyhow::{bail, Result};
use portscope_core::application::{full_command, process};
use portscope_core::{Config, PlatformAdapter, PortInfo};
use serde::Serialize;
use tracing::debug;

use crate::format::{format_duration, format_memory, or_dash};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Inspection {
    #[serde(flatten)]
    port: PortInfo,
    category_label: String,
    full_command: String,
}

pub async fn run(config: &Config, port: u16, json: bool) -> Result<()> {
    let registry = super::registry(config);
    let ports: Vec<PortInfo> = registry
        .detect_ports()
        .await?
        .into_iter()
        .filter(|p| p.port == port)
        .collect();

    if ports.is_empty() {
        bail!("No process is listening on port {}", port);
    }

    let result = super::organizer(config).organize(ports);
    let adapter = registry.adapter();
    let mut inspections = Vec::with_capacity(result.ports.len());

    for mut info in result.ports {
        if let Some(details) = process::process_details(adapter, info.pid).await {
            if info.cwd.is_none() {
                info.cwd = details.cwd;
            }
        }
        if info.lifetime.is_none() {
            info.lifetime = adapter.get_process_lifetime(info.pid).await.unwrap_or_else(|e| {
                debug!(pid = info.pid, error = %e, "Lifetime unavailable");
                None
            });
        }
        let command = match adapter.get_process_command(info.pid).await {
            Ok(command) if !command.trim().is_empty() => command,
            _ => full_command(&info),
        };

        inspections.push(Inspection {
            category_label: info.category.clone().unwrap_or_default().display_name().to_string(),
            full_command: command,
            port: info,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&inspections)?);
        return Ok(());
    }

    for (i, inspection) in inspections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_inspection(inspection);
    }
    Ok(())
}

fn print_inspection(inspection: &Inspection) {
    let port = &inspection.port;
    println!("Port:       {}/{}", port.port, port.protocol);
    println!("Category:   {}", inspection.category_label);
    println!("Process:    {} (PID {})", port.process_name, port.pid);
    println!("Address:    {}", port.address);
    println!("User:       {}", or_dash(Some(port.user.clone())));
    println!("Uptime:     {}", or_dash(port.lifetime.map(format_duration)));
    println!("Memory:     {}", or_dash(port.memory.map(format_memory)));
    println!("CPU:        {}", or_dash(port.cpu.map(|c| format!("{:.1}%", c))));
    println!("Directory:  {}", or_dash(port.cwd.clone()));
    println!("Command:    {}", inspection.full_command);
}
