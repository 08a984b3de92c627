//! Unix-like adapter (Linux, macOS, BSDs).
//!
//! Sockets come from `ss` on Linux and `lsof` elsewhere, with `lsof` as the
//! Linux fallback when `ss` is missing. Owner details come from one batched
//! `ps` call per detection pass, memoised per pid.

use std::collections::HashSet;

use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::domain::{PortInfo, Protocol};
use crate::error::{Error, Result};
use crate::ports::{PlatformAdapter, ProcessInfo};

use super::utils;

/// Owner details gathered from `ps`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProcessSnapshot {
    pub user: String,
    pub command: String,
    pub memory: Option<u64>,
    pub cpu: Option<f32>,
    pub lifetime: Option<u64>,
}

/// Unix-like platform adapter.
pub struct UnixAdapter {
    processes: Mutex<TtlCache<u32, ProcessSnapshot>>,
}

impl UnixAdapter {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(TtlCache::default()),
        }
    }

    async fn scan_sockets(&self) -> Result<Vec<PortInfo>> {
        if cfg!(target_os = "linux") {
            match self.scan_with_ss().await {
                Ok(ports) => return Ok(ports),
                Err(e) => debug!(error = %e, "ss unavailable, falling back to lsof"),
            }
        }
        self.scan_with_lsof().await
    }

    async fn scan_with_ss(&self) -> Result<Vec<PortInfo>> {
        let (tcp_ok, tcp) = utils::run("ss", &["-Htlnp"]).await?;
        let (udp_ok, udp) = utils::run("ss", &["-Hulnp"]).await?;
        if !tcp_ok && !udp_ok {
            return Err(Error::CommandFailed("ss exited with failure".to_string()));
        }

        let mut ports = parse_ss_output(&tcp, Protocol::Tcp);
        ports.extend(parse_ss_output(&udp, Protocol::Udp));
        Ok(ports)
    }

    async fn scan_with_lsof(&self) -> Result<Vec<PortInfo>> {
        let (ok, stdout) =
            utils::run("lsof", &["-nP", "-iTCP", "-sTCP:LISTEN", "-iUDP", "+c", "0"]).await?;
        // lsof exits 1 when nothing matched, which is an empty result, not a failure
        if !ok && !stdout.trim().is_empty() {
            return Err(Error::CommandFailed("lsof exited with failure".to_string()));
        }
        Ok(parse_lsof_output(&stdout))
    }

    /// Make sure every pid in `pids` has a fresh snapshot, querying `ps` once
    /// for the missing ones.
    async fn load_snapshots(&self, pids: &HashSet<u32>) {
        let missing: Vec<String> = {
            let mut cache = self.processes.lock();
            pids.iter()
                .filter(|pid| !cache.has(pid))
                .map(|pid| pid.to_string())
                .collect()
        };
        if missing.is_empty() {
            return;
        }

        let pid_list = missing.join(",");
        let stdout = match utils::run(
            "ps",
            &["-ww", "-o", "pid=,user=,rss=,%cpu=,etime=,command=", "-p", &pid_list],
        )
        .await
        {
            Ok((_, stdout)) => stdout,
            Err(e) => {
                warn!(error = %e, "Failed to query process details");
                return;
            }
        };

        let mut cache = self.processes.lock();
        for (pid, snapshot) in parse_ps_output(&stdout) {
            cache.set(pid, snapshot);
        }
    }

    async fn read_cwd(&self, pid: u32) -> Option<String> {
        if cfg!(target_os = "linux") {
            return tokio::fs::read_link(format!("/proc/{}/cwd", pid))
                .await
                .ok()
                .map(|p| p.to_string_lossy().into_owned());
        }

        let (_, stdout) = utils::run("lsof", &["-a", "-p", &pid.to_string(), "-d", "cwd", "-Fn"])
            .await
            .ok()?;
        stdout
            .lines()
            .find_map(|line| line.strip_prefix('n'))
            .map(str::to_string)
    }
}

impl Default for UnixAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for UnixAdapter {
    async fn detect_ports(&self) -> Result<Vec<PortInfo>> {
        self.processes.lock().cleanup();

        let raw = self.scan_sockets().await?;
        let pids: HashSet<u32> = raw.iter().map(|p| p.pid).collect();
        self.load_snapshots(&pids).await;

        let mut ports = Vec::with_capacity(raw.len());
        for port in raw {
            let snapshot = self.processes.lock().get(&port.pid);
            let cwd = if cfg!(target_os = "linux") {
                self.read_cwd(port.pid).await
            } else {
                None
            };
            let port = match snapshot {
                Some(s) => {
                    let user = if port.user.is_empty() { s.user } else { port.user.clone() };
                    port.with_user(user)
                        .with_command(utils::truncate_command(&s.command))
                        .with_usage(s.memory, s.cpu)
                        .with_lifetime(s.lifetime)
                }
                None => {
                    let command = port.process_name.clone();
                    port.with_command(command)
                }
            };
            ports.push(port.with_cwd(cwd));
        }

        debug!(count = ports.len(), "Detected listening sockets");
        Ok(ports)
    }

    async fn get_process_info(&self, pid: u32) -> Result<ProcessInfo> {
        let command = self.get_process_command(pid).await?;
        let cwd = self.read_cwd(pid).await;
        Ok(ProcessInfo { command, cwd })
    }

    async fn get_process_lifetime(&self, pid: u32) -> Result<Option<u64>> {
        let (ok, stdout) = utils::run("ps", &["-o", "etime=", "-p", &pid.to_string()]).await?;
        if !ok || stdout.trim().is_empty() {
            return Err(Error::ProcessNotFound(pid));
        }
        Ok(utils::parse_etime(&stdout))
    }

    async fn kill_process(&self, pid: u32, force: bool) -> bool {
        self.processes.lock().delete(&pid);
        match send_signal(pid, force) {
            Ok(()) => true,
            Err(e) => {
                warn!(pid = pid, error = %e, "Failed to signal process");
                false
            }
        }
    }

    async fn get_process_command(&self, pid: u32) -> Result<String> {
        let (ok, stdout) =
            utils::run("ps", &["-ww", "-o", "command=", "-p", &pid.to_string()]).await?;
        let command = stdout.trim();
        if !ok || command.is_empty() {
            return Err(Error::ProcessNotFound(pid));
        }
        Ok(command.to_string())
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, force: bool) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| Error::ProcessNotFound(pid))?;
    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };

    debug!(pid = pid, signal = ?signal, "Sending signal to process");
    kill(Pid::from_raw(raw), signal).map_err(|errno| signal_error(pid, errno))
}

#[cfg(unix)]
fn signal_error(pid: u32, errno: nix::errno::Errno) -> Error {
    use nix::errno::Errno;

    match errno {
        Errno::EPERM => Error::PermissionDenied(format!("cannot signal PID {}", pid)),
        Errno::ESRCH => Error::ProcessNotFound(pid),
        other => Error::CommandFailed(format!("kill({}): {}", pid, other)),
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _force: bool) -> Result<()> {
    Err(Error::UnsupportedPlatform(
        "signals are not available on this platform".to_string(),
    ))
}

/// Parse `ss -H{t,u}lnp` output.
///
/// ```text
/// LISTEN 0      511          *:3000      *:*    users:(("node",pid=4242,fd=23))
/// UNCONN 0      0      0.0.0.0:5353 0.0.0.0:*   users:(("avahi",pid=812,fd=12),("avahi",pid=813,fd=12))
/// ```
pub(crate) fn parse_ss_output(output: &str, protocol: Protocol) -> Vec<PortInfo> {
    let Ok(regex) = Regex::new(r#"\("(.+?)",pid=(\d+),fd=\d+\)"#) else {
        return Vec::new();
    };

    let mut ports = Vec::new();
    for line in output.lines() {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 6 {
            continue;
        }

        let Some((address, port)) = utils::parse_address(components[3]) else {
            continue;
        };

        let users = components[5..].join(" ");
        for caps in regex.captures_iter(&users) {
            let Ok(pid) = caps[2].parse::<u32>() else {
                continue;
            };
            ports.push(PortInfo::new(port, protocol, pid, &caps[1]).with_address(address.clone()));
        }
    }
    ports
}

/// Parse `lsof -nP -iTCP -sTCP:LISTEN -iUDP` output.
pub(crate) fn parse_lsof_output(output: &str) -> Vec<PortInfo> {
    let mut ports = Vec::new();

    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 9 {
            continue;
        }

        let process_name = components[0].replace("\\x20", " ").replace("\\x2f", "/");
        let Ok(pid) = components[1].parse::<u32>() else {
            continue;
        };
        let user = components[2];

        let protocol = match components.iter().skip(4).find(|c| **c == "TCP" || **c == "UDP") {
            Some(&"TCP") => Protocol::Tcp,
            Some(_) => Protocol::Udp,
            None => continue,
        };

        let Some(name) = components.iter().skip(8).rev().find(|c| c.contains(':')) else {
            continue;
        };
        // connected sockets ("a:1->b:2") are not listeners
        if name.contains("->") {
            continue;
        }
        let Some((address, port)) = utils::parse_address(name) else {
            continue;
        };

        ports.push(
            PortInfo::new(port, protocol, pid, process_name)
                .with_address(address)
                .with_user(user),
        );
    }

    ports
}

/// Parse `ps -o pid=,user=,rss=,%cpu=,etime=,command=` output.
pub(crate) fn parse_ps_output(output: &str) -> Vec<(u32, ProcessSnapshot)> {
    let mut snapshots = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(pid), Some(user), Some(rss), Some(cpu), Some(etime)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };

        let command = parts.collect::<Vec<_>>().join(" ");
        snapshots.push((
            pid,
            ProcessSnapshot {
                user: user.to_string(),
                command,
                memory: rss.parse().ok(),
                cpu: cpu.parse().ok(),
                lifetime: utils::parse_etime(etime),
            },
        ));
    }
    snapshots
}
