//! Parsing and command helpers shared by the platform adapters.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Longest command line kept on a detected port. The full text is always
/// available through `get_process_command`.
pub const MAX_STORED_COMMAND: usize = 200;

/// Run a command and return its stdout.
///
/// Spawn failures map to [`Error::CommandFailed`]. A non-zero exit status is
/// not an error here, callers decide what an empty or failed run means.
pub async fn run(program: &str, args: &[&str]) -> Result<(bool, String)> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    Ok((output.status.success(), stdout))
}

/// Parse an address:port string.
///
/// Handles multiple address formats:
/// - IPv4: "127.0.0.1:3000" or "*:8080"
/// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
/// - ss interface scoping: "127.0.0.53%lo:53"
pub fn parse_address(address: &str) -> Option<(String, u16)> {
    let (addr, port_str) = if address.starts_with('[') {
        let bracket_end = address.find(']')?;
        if bracket_end + 1 >= address.len() || address.as_bytes()[bracket_end + 1] != b':' {
            return None;
        }
        (&address[1..bracket_end], &address[bracket_end + 2..])
    } else {
        let last_colon = address.rfind(':')?;
        (&address[..last_colon], &address[last_colon + 1..])
    };

    let port: u16 = port_str.parse().ok()?;
    if port == 0 {
        return None;
    }

    let addr = addr.split('%').next().unwrap_or(addr);
    let addr = match addr {
        "" | "0.0.0.0" | "::" => "*",
        other => other,
    };
    Some((addr.to_string(), port))
}

/// Parse `ps` elapsed time (`[[dd-]hh:]mm:ss`) into seconds.
pub fn parse_etime(etime: &str) -> Option<u64> {
    let etime = etime.trim();
    if etime.is_empty() {
        return None;
    }

    let (days, clock) = match etime.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, etime),
    };

    let parts: Vec<u64> = clock
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<_>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    Some(days * 86_400 + hours * 3_600 + minutes * 60 + seconds)
}

/// Parse a tasklist memory column ("45,000 K") into KB.
pub fn parse_memory_kb(field: &str) -> Option<u64> {
    let digits: String = field.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Cut a command line down to [`MAX_STORED_COMMAND`] characters.
pub fn truncate_command(command: &str) -> String {
    if command.chars().count() > MAX_STORED_COMMAND {
        let cut: String = command.chars().take(MAX_STORED_COMMAND).collect();
        format!("{}...", cut)
    } else {
        command.to_string()
    }
}

/// Parse a CSV line, handling quoted fields
pub fn parse_csv_line(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut field_start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        match c {
            '"' => {
                if in_quotes {
                    if let Some(start) = field_start {
                        fields.push(&line[start..i]);
                    }
                    field_start = None;
                    in_quotes = false;
                } else {
                    in_quotes = true;
                    field_start = Some(i + 1);
                }
            }
            ',' if !in_quotes => {
                if let Some(start) = field_start {
                    fields.push(&line[start..i]);
                    field_start = None;
                }
            }
            _ => {
                if field_start.is_none() && !in_quotes {
                    field_start = Some(i);
                }
            }
        }
    }

    if let Some(start) = field_start {
        if !in_quotes {
            fields.push(&line[start..]);
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_address() {
        assert_eq!(parse_address("127.0.0.1:3000"), Some(("127.0.0.1".into(), 3000)));
        assert_eq!(parse_address("*:8080"), Some(("*".into(), 8080)));
        assert_eq!(parse_address("0.0.0.0:135"), Some(("*".into(), 135)));
    }

    #[test]
    fn test_parse_ipv6_address() {
        assert_eq!(parse_address("[::1]:3000"), Some(("::1".into(), 3000)));
        assert_eq!(parse_address("[::]:445"), Some(("*".into(), 445)));
        assert_eq!(parse_address("[fe80::1]:8080"), Some(("fe80::1".into(), 8080)));
    }

    #[test]
    fn test_parse_address_rejects_port_zero_and_garbage() {
        assert_eq!(parse_address("*:0"), None);
        assert_eq!(parse_address("*:*"), None);
        assert_eq!(parse_address("[::1]"), None);
    }

    #[test]
    fn test_parse_address_strips_interface() {
        assert_eq!(parse_address("127.0.0.53%lo:53"), Some(("127.0.0.53".into(), 53)));
    }

    #[test]
    fn test_parse_etime() {
        assert_eq!(parse_etime("00:05"), Some(5));
        assert_eq!(parse_etime("12:34"), Some(754));
        assert_eq!(parse_etime("01:00:00"), Some(3_600));
        assert_eq!(parse_etime("2-03:04:05"), Some(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5));
        assert_eq!(parse_etime("  "), None);
        assert_eq!(parse_etime("abc"), None);
    }

    #[test]
    fn test_parse_memory_kb() {
        assert_eq!(parse_memory_kb("45,000 K"), Some(45_000));
        assert_eq!(parse_memory_kb("8 K"), Some(8));
        assert_eq!(parse_memory_kb("N/A"), None);
    }

    #[test]
    fn test_truncate_command() {
        let long = "x".repeat(250);
        let cut = truncate_command(&long);
        assert_eq!(cut.len(), MAX_STORED_COMMAND + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_command("node server.js"), "node server.js");
    }

    #[test]
    fn test_parse_csv_line() {
        let line = r#""node.exe","5432","Console","1","45,000 K""#;
        let fields = parse_csv_line(line);
        assert_eq!(fields, vec!["node.exe", "5432", "Console", "1", "45,000 K"]);
    }
}
