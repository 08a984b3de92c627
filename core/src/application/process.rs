//! Process-utility helpers used by the dashboard and the CLI.

use serde::Serialize;
use tracing::debug;

use crate::domain::PortInfo;
use crate::ports::PlatformAdapter;

/// What the adapter knows about a running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessDetails {
    pub pid: u32,
    pub command: String,
    pub cwd: Option<String>,
}

/// Log output associated with a process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessLogs {
    pub stdout: String,
    pub stderr: String,
}

/// Look up a process, treating any adapter failure as absence.
pub async fn process_details<A: PlatformAdapter>(adapter: &A, pid: u32) -> Option<ProcessDetails> {
    match adapter.get_process_info(pid).await {
        Ok(info) => Some(ProcessDetails {
            pid,
            command: info.command,
            cwd: info.cwd,
        }),
        Err(e) => {
            debug!(pid = pid, error = %e, "Failed to get process details");
            None
        }
    }
}

pub async fn kill_process<A: PlatformAdapter>(adapter: &A, pid: u32, force: bool) -> bool {
    adapter.kill_process(pid, force).await
}

/// Live output of arbitrary processes is not captured, so the logs carry a
/// note naming the process command instead.
pub async fn process_logs<A: PlatformAdapter>(adapter: &A, pid: u32) -> Option<ProcessLogs> {
    let command = match adapter.get_process_command(pid).await {
        Ok(command) => command,
        Err(e) => {
            debug!(pid = pid, error = %e, "Failed to get process command for logs");
            return None;
        }
    };
    Some(ProcessLogs {
        stdout: format!(
            "Process: {}\n\nNote: Live logs are not available for processes started outside portscope.",
            command
        ),
        stderr: String::new(),
    })
}

/// Stored command line, or the process name when none was recorded.
pub fn full_command(port: &PortInfo) -> String {
    if port.command.trim().is_empty() {
        port.process_name.clone()
    } else {
        port.command.clone()
    }
}
