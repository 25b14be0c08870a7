//! Time and timestamp utilities

use chrono::{DateTime, NaiveDateTime, Utc};

/// Compact UTC stamp used in generated asset file names
pub fn file_stamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Parse a schedule timestamp as entered in a document
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS` (local wall time, as
/// produced by datetime inputs) and RFC 3339.
pub fn parse_schedule_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
