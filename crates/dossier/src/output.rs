//! Table rendering for queue and audit listings.

use chrono::{TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use dossier_protocol::{AuditEntry, Suggestion};

const SHORT_ID_LEN: usize = 12;

pub fn suggestions_table(suggestions: &[Suggestion]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "File", "Case guess", "Top slot", "Conf", "Size", "Revised"]);

    for s in suggestions {
        let top = s.guessed_slots.first();
        table.add_row(vec![
            Cell::new(short_id(&s.id)),
            Cell::new(&s.display_name),
            Cell::new(s.guessed_case_id.as_deref().unwrap_or("-")),
            Cell::new(top.map(|m| m.slot.as_str()).unwrap_or("-")),
            Cell::new(
                top.map(|m| format!("{:.2}", m.confidence))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(human_size(s.size_bytes)),
            Cell::new(human_time(s.revised_at)),
        ]);
    }
    table
}

pub fn audit_table(entries: &[AuditEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["When", "Action", "Case", "Slot", "File", "By", "Reason"]);

    for e in entries {
        table.add_row(vec![
            Cell::new(human_time(e.at)),
            Cell::new(e.action.as_str()),
            Cell::new(e.case_id.as_deref().unwrap_or("-")),
            Cell::new(e.slot.map(|s| s.as_str()).unwrap_or("-")),
            Cell::new(&e.remote_path),
            Cell::new(&e.by),
            Cell::new(e.reason.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

pub fn short_id(id: &str) -> &str {
    &id[..id.len().min(SHORT_ID_LEN)]
}

fn human_size(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn human_time(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdef0123456789"), "abcdef012345");
        assert_eq!(short_id("abc"), "abc");
    }
}
