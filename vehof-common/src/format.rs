//! Display formatting for durations and counts

/// Format seconds as `H:MM:SS` or `M:SS`
///
/// Without parsed seconds the raw `fallback` text is used, then `"—"`.
pub fn format_duration(seconds: Option<i64>, fallback: Option<&str>) -> String {
    let Some(seconds) = seconds else {
        return fallback.unwrap_or("—").to_string();
    };

    let hh = seconds / 3600;
    let mm = (seconds % 3600) / 60;
    let ss = seconds % 60;

    if hh > 0 {
        format!("{}:{:02}:{:02}", hh, mm, ss)
    } else {
        format!("{}:{:02}", mm, ss)
    }
}

/// Compact count such as `950`, `1.2K`, `3.4M`, `5.6B`
pub fn format_compact_number(n: Option<f64>) -> String {
    let Some(n) = n else {
        return "—".to_string();
    };

    let abs = n.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (n / 1e9, "B")
    } else if abs >= 1e6 {
        (n / 1e6, "M")
    } else if abs >= 1e3 {
        (n / 1e3, "K")
    } else {
        (n, "")
    };

    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as i64, suffix)
    } else {
        format!("{:.1}{}", rounded, suffix)
    }
}
