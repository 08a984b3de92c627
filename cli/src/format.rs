//! Text formatting shared by the commands and the dashboard.

/// Shorten to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Human-readable uptime, e.g. `3d 4h 12m` or `5m 07s`.
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Memory given in KB.
pub fn format_memory(kb: u64) -> String {
    const MB: u64 = 1024;
    const GB: u64 = 1024 * 1024;

    if kb >= GB {
        format!("{:.1} GB", kb as f64 / GB as f64)
    } else if kb >= MB {
        format!("{:.1} MB", kb as f64 / MB as f64)
    } else {
        format!("{} KB", kb)
    }
}

pub fn or_dash(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("node", 10), "node");
        assert_eq!(truncate("com.docker.backend", 8), "com.doc…");
        assert_eq!(truncate("⚠️ Unexpected", 3), "⚠️…");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(427), "7m 07s");
        assert_eq!(format_duration(3 * 3600 + 5), "3h 00m 05s");
        assert_eq!(format_duration(2 * 86_400 + 3600 + 120), "2d 1h 2m");
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(512), "512 KB");
        assert_eq!(format_memory(1536), "1.5 MB");
        assert_eq!(format_memory(3 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some(String::new())), "-");
        assert_eq!(or_dash(Some("root".into())), "root");
    }
}
