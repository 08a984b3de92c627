//! Kill command - terminate every process listening on a port.

use anyhow::{bail, Result};
use portscope_core::application::process;
use portscope_core::Config;

pub async fn run(config: &Config, port: u16, force: bool) -> Result<()> {
    let registry = super::registry(config);
    let targets: Vec<_> = registry
        .detect_ports()
        .await?
        .into_iter()
        .filter(|p| p.port == port)
        .collect();

    if targets.is_empty() {
        bail!("No process is listening on port {}", port);
    }

    let mut failed = 0;
    for target in &targets {
        if process::kill_process(registry.adapter(), target.pid, force).await {
            println!(
                "Killed {} (PID {}) on port {}",
                target.process_name, target.pid, port
            );
        } else {
            eprintln!(
                "Failed to kill {} (PID {}) on port {}",
                target.process_name, target.pid, port
            );
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("Failed to kill {} of {} processes", failed, targets.len());
    }
    Ok(())
}
