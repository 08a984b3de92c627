//! Windows adapter.
//!
//! Uses `netstat -ano` for sockets, `tasklist /V /FO CSV` for process names,
//! owners and memory, PowerShell CIM queries for command lines and start
//! times, and `taskkill` for termination.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::domain::{PortInfo, Protocol};
use crate::error::{Error, Result};
use crate::ports::{PlatformAdapter, ProcessInfo};

use super::utils;

const COMMAND_LINES_SCRIPT: &str =
    "Get-CimInstance Win32_Process | ForEach-Object { [string]$_.ProcessId + [char]9 + $_.CommandLine }";

/// Row of `tasklist /V /FO CSV`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TaskEntry {
    pub name: String,
    pub user: String,
    pub memory: Option<u64>,
}

/// Windows platform adapter.
pub struct WindowsAdapter {
    command_lines: Mutex<TtlCache<u32, String>>,
}

impl WindowsAdapter {
    pub fn new() -> Self {
        Self {
            command_lines: Mutex::new(TtlCache::default()),
        }
    }

    async fn powershell(script: &str) -> Result<(bool, String)> {
        utils::run("powershell", &["-NoProfile", "-NonInteractive", "-Command", script]).await
    }

    /// Refresh cached command lines when any of `pids` is missing.
    async fn load_command_lines(&self, pids: &[u32]) {
        let missing = {
            let mut cache = self.command_lines.lock();
            pids.iter().any(|pid| !cache.has(pid))
        };
        if !missing {
            return;
        }

        match Self::powershell(COMMAND_LINES_SCRIPT).await {
            Ok((_, stdout)) => {
                let mut cache = self.command_lines.lock();
                for (pid, command) in parse_command_lines(&stdout) {
                    cache.set(pid, command);
                }
            }
            Err(e) => warn!(error = %e, "Failed to query command lines"),
        }
    }
}

impl Default for WindowsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for WindowsAdapter {
    async fn detect_ports(&self) -> Result<Vec<PortInfo>> {
        self.command_lines.lock().cleanup();

        let (netstat, tasklist) = tokio::join!(
            utils::run("netstat", &["-ano"]),
            utils::run("tasklist", &["/V", "/FO", "CSV", "/NH"])
        );

        let (ok, netstat) = netstat?;
        if !ok {
            return Err(Error::CommandFailed("netstat -ano failed".to_string()));
        }
        let tasks = match tasklist {
            Ok((_, stdout)) => parse_tasklist_output(&stdout),
            Err(e) => {
                warn!(error = %e, "tasklist failed, process names unavailable");
                HashMap::new()
            }
        };

        let sockets = parse_netstat_output(&netstat);
        let pids: Vec<u32> = sockets.iter().map(|(_, _, pid, _)| *pid).collect();
        self.load_command_lines(&pids).await;

        let mut cache = self.command_lines.lock();
        let ports: Vec<PortInfo> = sockets
            .into_iter()
            .map(|(protocol, port, pid, address)| {
                let task = tasks.get(&pid);
                let name = task
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| format!("PID {}", pid));
                let command = cache
                    .get(&pid)
                    .filter(|c| !c.is_empty())
                    .map(|c| utils::truncate_command(&c))
                    .unwrap_or_else(|| name.clone());

                PortInfo::new(port, protocol, pid, name)
                    .with_address(address)
                    .with_command(command)
                    .with_user(task.map(|t| t.user.clone()).unwrap_or_default())
                    .with_usage(task.and_then(|t| t.memory), None)
            })
            .collect();

        debug!(count = ports.len(), "Detected listening sockets");
        Ok(ports)
    }

    async fn get_process_info(&self, pid: u32) -> Result<ProcessInfo> {
        let command = self.get_process_command(pid).await?;
        // Windows exposes no working directory for foreign processes
        Ok(ProcessInfo { command, cwd: None })
    }

    async fn get_process_lifetime(&self, pid: u32) -> Result<Option<u64>> {
        let script = format!(
            "$p = Get-Process -Id {} -ErrorAction Stop; [int]((Get-Date) - $p.StartTime).TotalSeconds",
            pid
        );
        let (ok, stdout) = Self::powershell(&script).await?;
        if !ok {
            return Err(Error::ProcessNotFound(pid));
        }
        Ok(stdout.trim().parse().ok())
    }

    async fn kill_process(&self, pid: u32, force: bool) -> bool {
        self.command_lines.lock().delete(&pid);

        let pid_arg = pid.to_string();
        let mut args = vec!["/PID", pid_arg.as_str()];
        if force {
            args.push("/F");
        }

        debug!(pid = pid, force = force, "Executing taskkill");
        match utils::run("taskkill", &args).await {
            Ok((true, _)) => true,
            Ok((false, _)) => {
                warn!(pid = pid, "taskkill reported failure");
                false
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Failed to run taskkill");
                false
            }
        }
    }

    async fn get_process_command(&self, pid: u32) -> Result<String> {
        let script = format!(
            "(Get-CimInstance Win32_Process -Filter \"ProcessId={}\" -ErrorAction Stop).CommandLine",
            pid
        );
        let (ok, stdout) = Self::powershell(&script).await?;
        if !ok {
            return Err(Error::ProcessNotFound(pid));
        }
        Ok(stdout.trim().to_string())
    }
}

/// Parse `netstat -ano` into `(protocol, port, pid, address)` tuples.
///
/// ```text
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
///   UDP    0.0.0.0:5353           *:*                                    2740
/// ```
pub(crate) fn parse_netstat_output(output: &str) -> Vec<(Protocol, u16, u32, String)> {
    let mut results = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (protocol, local, pid) = match parts.as_slice() {
            ["TCP", local, _, "LISTENING", pid] => (Protocol::Tcp, *local, *pid),
            ["UDP", local, _, pid] => (Protocol::Udp, *local, *pid),
            _ => continue,
        };

        let Some((address, port)) = utils::parse_address(local) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };
        results.push((protocol, port, pid, address));
    }

    results
}

/// Parse `tasklist /V /FO CSV` into a PID -> entry map.
pub(crate) fn parse_tasklist_output(output: &str) -> HashMap<u32, TaskEntry> {
    let mut map = HashMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("\"Image Name\"") {
            continue;
        }

        let fields = utils::parse_csv_line(line);
        if fields.len() < 2 {
            continue;
        }
        let Ok(pid) = fields[1].parse::<u32>() else {
            continue;
        };

        let name = fields[0].strip_suffix(".exe").unwrap_or(fields[0]).to_string();
        let user = match fields.get(6) {
            Some(&"N/A") | None => String::new(),
            Some(user) => user.to_string(),
        };
        let memory = fields.get(4).and_then(|m| utils::parse_memory_kb(m));

        map.insert(pid, TaskEntry { name, user, memory });
    }

    map
}

/// Parse `<pid>\t<command line>` rows.
pub(crate) fn parse_command_lines(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.split_once('\t')?;
            Some((pid.trim().parse().ok()?, command.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_netstat_output() {
        let output = r#"
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
  TCP    127.0.0.1:3000         0.0.0.0:0              LISTENING       5432
  TCP    127.0.0.1:50123        127.0.0.1:3000         ESTABLISHED     7777
  TCP    [::1]:6379             [::]:0                 LISTENING       8080
  UDP    0.0.0.0:5353           *:*                                    2740
"#;
        let results = parse_netstat_output(output);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], (Protocol::Tcp, 135, 1020, "*".to_string()));
        assert_eq!(results[2], (Protocol::Tcp, 6379, 8080, "::1".to_string()));
        assert_eq!(results[3], (Protocol::Udp, 5353, 2740, "*".to_string()));
    }

    #[test]
    fn test_parse_tasklist_output() {
        let output = r#"
"System Idle Process","0","Services","0","8 K","Unknown","NT AUTHORITY\SYSTEM","0:00:00","N/A"
"node.exe","5432","Console","1","45,000 K","Running","DESKTOP\dev","0:00:12","N/A"
"svchost.exe","1020","Services","0","12,004 K","Unknown","N/A","0:00:01","N/A"
"#;
        let map = parse_tasklist_output(output);

        let node = &map[&5432];
        assert_eq!(node.name, "node");
        assert_eq!(node.user, "DESKTOP\\dev");
        assert_eq!(node.memory, Some(45_000));

        assert_eq!(map[&1020].user, "");
        assert_eq!(map[&0].name, "System Idle Process");
    }

    #[test]
    fn test_parse_command_lines() {
        let output = "4\t\n5432\tnode C:\\app\\server.js --port 3000\nnot a row\n";
        let rows = parse_command_lines(output);
        assert_eq!(
            rows,
            vec![
                (4, String::new()),
                (5432, "node C:\\app\\server.js --port 3000".to_string())
            ]
        );
    }
}
