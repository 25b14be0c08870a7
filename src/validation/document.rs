//! Save-time validation of configuration documents

use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::types::{AssetRef, ConfigurationDocument, EventId};
use crate::utils::parse_schedule_time;

/// Upper bound for the poll and subtitle intervals, in seconds
pub const MAX_INTERVAL_SECS: u32 = 86_400;

/// Check a document before it is persisted for `owner`
///
/// `asset_dir` is the owner's asset directory; every stored reference must
/// name an existing file inside it. All problems are reported together.
pub fn validate_document(
    doc: &ConfigurationDocument,
    owner: &EventId,
    asset_dir: &Path,
) -> StoreResult<()> {
    let mut problems = Vec::new();

    for (field, raw) in doc.image_fields() {
        match AssetRef::parse_owned(raw, owner) {
            Ok(AssetRef::Stored { file, .. }) => {
                if !asset_dir.join(&file).is_file() {
                    problems.push(format!("{}: asset '{}' does not exist", field.key(), raw));
                }
            }
            Ok(_) => {}
            Err(e) => problems.push(format!("{}: {}", field.key(), message_of(e))),
        }
    }

    let start = check_time("startTime", &doc.start_time, &mut problems);
    let end = check_time("endTime", &doc.end_time, &mut problems);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            problems.push("endTime is before startTime".to_string());
        }
    }

    for (name, value) in [
        ("pollInterval", doc.poll_interval),
        ("subtitleInterval", doc.subtitle_interval),
    ] {
        if value == 0 || value > MAX_INTERVAL_SECS {
            problems.push(format!("{} must be between 1 and {} seconds", name, MAX_INTERVAL_SECS));
        }
    }

    for (key, color) in &doc.colors {
        if !is_hex_color(color) {
            problems.push(format!("colors.{}: '{}' is not a #rgb, #rrggbb or #rrggbbaa color", key, color));
        }
    }

    let links = [
        ("homeUrl", &doc.home_url),
        ("buttons.btn1.link", &doc.buttons.btn1.link),
        ("buttons.btn2.link", &doc.buttons.btn2.link),
        ("buttons.btn3.link", &doc.buttons.btn3.link),
        ("buttons.btn4.link", &doc.buttons.btn4.link),
        ("socials.social1.link", &doc.socials.social1.link),
        ("socials.social2.link", &doc.socials.social2.link),
        ("socials.social3.link", &doc.socials.social3.link),
        ("socials.social4.link", &doc.socials.social4.link),
    ];
    for (name, link) in links {
        if is_script_link(link) {
            problems.push(format!("{}: script links are not allowed", name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation(problems.join("; ")))
    }
}

fn message_of(e: StoreError) -> String {
    match e {
        StoreError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

fn check_time(
    name: &str,
    raw: &str,
    problems: &mut Vec<String>,
) -> Option<chrono::NaiveDateTime> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_schedule_time(raw);
    if parsed.is_none() {
        problems.push(format!("{}: '{}' is not a valid date and time", name, raw));
    }
    parsed
}

pub fn is_hex_color(raw: &str) -> bool {
    match raw.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

fn is_script_link(raw: &str) -> bool {
    let lower: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:text/html")
}
