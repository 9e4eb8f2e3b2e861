use chrono::{DateTime, Utc};
use metrics_core::{EventRecord, format_event_type, relative_time};
use serde::Serialize;

use crate::parser::record_instants;
use crate::types::Result;

pub const DEFAULT_TIMELINE_LIMIT: usize = 20;

const USER_TAG_CHARS: usize = 8;

/// One row of the recent-activity feed, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub time_ago: String,
    pub title: String,
    pub icon: &'static str,
    pub details: Option<String>,
    pub user_tag: String,
}

pub fn event_icon(event_type: &str) -> &'static str {
    match event_type {
        "request" => "🔍",
        "successful_generation" => "✨",
        "rate_limit_hit" => "⚠️",
        "follow" => "👤",
        "error" => "❌",
        _ => "📝",
    }
}

fn ranked(records: &[EventRecord]) -> Result<Vec<(DateTime<Utc>, &EventRecord)>> {
    let instants = record_instants(records)?;
    let mut ranked: Vec<(DateTime<Utc>, &EventRecord)> =
        instants.into_iter().zip(records).collect();
    // stable: equal instants keep input order
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(ranked)
}

/// Most recent records first. Equal timestamps keep their input order.
pub fn recent_events(records: &[EventRecord], limit: usize) -> Result<Vec<&EventRecord>> {
    Ok(ranked(records)?
        .into_iter()
        .take(limit)
        .map(|(_, record)| record)
        .collect())
}

fn details_line(record: &EventRecord) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(media_type) = record.media_type() {
        parts.push(format!("Media Type: {media_type}"));
    }
    if let Some(ms) = record.response_time_ms() {
        parts.push(format!("Response Time: {ms}ms"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" • "))
    }
}

fn user_tag(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(USER_TAG_CHARS).collect();
    format!("User ID: {prefix}...")
}

pub fn timeline_entries(
    records: &[EventRecord],
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<TimelineEntry>> {
    Ok(ranked(records)?
        .into_iter()
        .take(limit)
        .map(|(timestamp, record)| TimelineEntry {
            timestamp,
            event_type: record.event_type.clone(),
            time_ago: relative_time(timestamp, now),
            title: format_event_type(&record.event_type),
            icon: event_icon(&record.event_type),
            details: details_line(record),
            user_tag: user_tag(&record.user_id),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AggregateError;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let records = vec![
            EventRecord::new("request", "a", "2024-01-01T01:00:00Z"),
            EventRecord::new("request", "b", "2024-01-01T03:00:00Z"),
            EventRecord::new("request", "c", "2024-01-01T02:00:00Z"),
        ];
        let recent = recent_events(&records, 2).expect("recent");
        let users: Vec<&str> = recent.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["b", "c"]);
        assert_eq!(records[0].user_id, "a");
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            EventRecord::new("request", "first", "2024-01-01T01:00:00Z"),
            EventRecord::new("request", "second", "2024-01-01T01:00:00Z"),
            EventRecord::new("request", "third", "2024-01-01T01:00:00+00:00"),
        ];
        let recent = recent_events(&records, DEFAULT_TIMELINE_LIMIT).expect("recent");
        let users: Vec<&str> = recent.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["first", "second", "third"]);
    }

    #[test]
    fn compares_instants_not_strings() {
        let records = vec![
            EventRecord::new("request", "east", "2024-01-01T10:00:00+09:00"),
            EventRecord::new("request", "utc", "2024-01-01T02:00:00Z"),
        ];
        let recent = recent_events(&records, 5).expect("recent");
        assert_eq!(recent[0].user_id, "utc");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let records = vec![EventRecord::new("request", "a", "soon")];
        let err = recent_events(&records, 5).expect_err("malformed");
        assert!(matches!(err, AggregateError::MalformedRecord { index: 0, .. }));
    }

    #[test]
    fn entries_render_display_fields() {
        let records = vec![
            EventRecord::new("successful_generation", "1234567890abc", "2024-01-01T11:58:00Z")
                .with_details(Some("image"), Some(1250.0)),
            EventRecord::new("custom_thing", "u2", "2024-01-01T11:59:30Z"),
        ];
        let now = at("2024-01-01T12:00:00Z");
        let entries = timeline_entries(&records, now, 10).expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Custom Thing");
        assert_eq!(entries[0].icon, "📝");
        assert_eq!(entries[0].time_ago, "30 seconds ago");
        assert_eq!(entries[0].details, None);
        assert_eq!(entries[0].user_tag, "User ID: u2...");

        assert_eq!(entries[1].title, "Successful Generation");
        assert_eq!(entries[1].icon, "✨");
        assert_eq!(entries[1].time_ago, "2 minutes ago");
        assert_eq!(
            entries[1].details.as_deref(),
            Some("Media Type: image • Response Time: 1250ms")
        );
        assert_eq!(entries[1].user_tag, "User ID: 12345678...");
    }
}
