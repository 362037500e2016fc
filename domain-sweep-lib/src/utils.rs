//! Small parsing helpers shared by the config layers and the CLI.

use crate::types::SourceKind;
use std::time::Duration;

/// Parse a duration like "500ms", "10s", "2m", or bare seconds ("10").
///
/// # Returns
///
/// The parsed duration, or None if the string is not a whole number with an
/// optional unit.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Parse a boolean switch: true/false, 1/0, yes/no, on/off.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a fallback selection, where "none" (or "off") disables the fallback.
pub fn parse_fallback(value: &str) -> Result<Option<SourceKind>, String> {
    match value.trim().to_lowercase().as_str() {
        "none" | "off" => Ok(None),
        other => other.parse::<SourceKind>().map(Some),
    }
}

/// Render a duration compactly for summaries ("850ms", "12.4s", "3m 05s").
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
