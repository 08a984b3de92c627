//! Platform adapters.
//!
//! Exactly one variant is active per run. [`Platform::detect`] picks it once
//! from the host OS identifier; every call afterwards dispatches on the tag.

mod unix;
mod utils;
mod windows;

pub use unix::UnixAdapter;
pub use windows::WindowsAdapter;

use crate::domain::PortInfo;
use crate::error::Result;
use crate::ports::{PlatformAdapter, ProcessInfo};

/// The platform adapter selected for this host.
pub enum Platform {
    Unix(UnixAdapter),
    Windows(WindowsAdapter),
}

impl Platform {
    /// Select the adapter for the running operating system.
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    /// Select the adapter for an OS identifier as reported by
    /// [`std::env::consts::OS`]. Everything but `windows` is Unix-like.
    pub fn for_os(os: &str) -> Self {
        if os == "windows" {
            Platform::Windows(WindowsAdapter::new())
        } else {
            Platform::Unix(UnixAdapter::new())
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Unix(_) => "unix",
            Platform::Windows(_) => "windows",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

impl PlatformAdapter for Platform {
    async fn detect_ports(&self) -> Result<Vec<PortInfo>> {
        match self {
            Platform::Unix(a) => a.detect_ports().await,
            Platform::Windows(a) => a.detect_ports().await,
        }
    }

    async fn get_process_info(&self, pid: u32) -> Result<ProcessInfo> {
        match self {
            Platform::Unix(a) => a.get_process_info(pid).await,
            Platform::Windows(a) => a.get_process_info(pid).await,
        }
    }

    async fn get_process_lifetime(&self, pid: u32) -> Result<Option<u64>> {
        match self {
            Platform::Unix(a) => a.get_process_lifetime(pid).await,
            Platform::Windows(a) => a.get_process_lifetime(pid).await,
        }
    }

    async fn kill_process(&self, pid: u32, force: bool) -> bool {
        match self {
            Platform::Unix(a) => a.kill_process(pid, force).await,
            Platform::Windows(a) => a.kill_process(pid, force).await,
        }
    }

    async fn get_process_command(&self, pid: u32) -> Result<String> {
        match self {
            Platform::Unix(a) => a.get_process_command(pid).await,
            Platform::Windows(a) => a.get_process_command(pid).await,
        }
    }
}
