//! Platform adapter port (interface).

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::domain::PortInfo;
use crate::error::Result;

/// Command line and working directory of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub command: String,
    pub cwd: Option<String>,
}

/// Port for OS-level socket and process queries.
///
/// Implementations shell out to native tools. Every query except
/// [`PlatformAdapter::kill_process`] reports failures to the caller instead of
/// swallowing them.
pub trait PlatformAdapter: Send + Sync {
    /// List raw listening-socket observations. Entries are not deduplicated.
    fn detect_ports(&self) -> impl Future<Output = Result<Vec<PortInfo>>> + Send;

    /// Get the command line and working directory of a process.
    fn get_process_info(&self, pid: u32) -> impl Future<Output = Result<ProcessInfo>> + Send;

    /// Get the process uptime in seconds, `None` when the platform can't tell.
    fn get_process_lifetime(&self, pid: u32)
        -> impl Future<Output = Result<Option<u64>>> + Send;

    /// Terminate a process. Returns `false` on any failure.
    fn kill_process(&self, pid: u32, force: bool) -> impl Future<Output = bool> + Send;

    /// Get the full, untruncated command line of a process.
    fn get_process_command(&self, pid: u32) -> impl Future<Output = Result<String>> + Send;
}
