use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const HOURS_PER_DAY: usize = 24;

/// Optional payload attached to an event. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One raw record as served by the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "EventType")]
    pub event_type: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
}

impl EventRecord {
    pub fn new(
        event_type: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            user_id: user_id.into(),
            timestamp: timestamp.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, media_type: Option<&str>, response_time: Option<f64>) -> Self {
        self.details = Some(EventDetails {
            media_type: media_type.map(str::to_string),
            response_time,
            extra: Map::new(),
        });
        self
    }

    pub fn media_type(&self) -> Option<&str> {
        self.details.as_ref()?.media_type.as_deref()
    }

    pub fn response_time_ms(&self) -> Option<f64> {
        self.details.as_ref()?.response_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSample {
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEngagement {
    pub active_user_count: u64,
    pub new_user_count: u64,
}

/// Aggregate statistics derived from one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub event_counts: BTreeMap<String, u64>,
    pub media_type_counts: BTreeMap<String, u64>,
    pub unique_user_count: u64,
    pub image_response_samples: Vec<ResponseSample>,
    pub hourly_activity: [u64; HOURS_PER_DAY],
    pub hourly_avg_response_time: [f64; HOURS_PER_DAY],
    pub avg_response_time_overall: u64,
    pub daily_engagement: BTreeMap<NaiveDate, DailyEngagement>,
}

impl MetricsSummary {
    pub fn total_events(&self) -> u64 {
        self.event_counts.values().sum()
    }

    pub fn count_for(&self, event_type: &str) -> u64 {
        self.event_counts.get(event_type).copied().unwrap_or(0)
    }
}

const TIME_UNITS: &[(&str, i64)] = &[
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// `"rate_limit_hit"` becomes `"Rate Limit Hit"`.
pub fn format_event_type(event_type: &str) -> String {
    event_type
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coarse "time ago" label; the largest unit with a whole quotient wins.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - timestamp).num_seconds();
    for (unit, seconds) in TIME_UNITS {
        let count = elapsed / seconds;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {unit}{plural} ago");
        }
    }
    "just now".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn format_event_type_title_cases_words() {
        assert_eq!(format_event_type("rate_limit_hit"), "Rate Limit Hit");
        assert_eq!(format_event_type("request"), "Request");
        assert_eq!(format_event_type(""), "");
    }

    #[test]
    fn format_event_type_keeps_rest_of_word() {
        assert_eq!(format_event_type("new_AccountActivity"), "New AccountActivity");
        assert_eq!(format_event_type("a__b"), "A  B");
    }

    #[test]
    fn relative_time_minute_boundary() {
        let now = at("2024-01-01T12:00:00Z");
        assert_eq!(
            relative_time(now - Duration::seconds(59), now),
            "59 seconds ago"
        );
        assert_eq!(relative_time(now - Duration::seconds(60), now), "1 minute ago");
        assert_eq!(relative_time(now, now), "just now");
    }

    #[test]
    fn relative_time_picks_largest_unit() {
        let now = at("2024-06-01T00:00:00Z");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(13), now), "1 week ago");
        assert_eq!(relative_time(now - Duration::days(60), now), "2 months ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn relative_time_future_is_just_now() {
        let now = at("2024-01-01T12:00:00Z");
        assert_eq!(relative_time(now + Duration::seconds(30), now), "just now");
    }

    #[test]
    fn record_deserializes_wire_names() {
        let raw = r#"{"Timestamp":"2024-01-01T05:00:00Z","UserID":"109","EventType":"successful_generation","Details":{"mediaType":"image","responseTime":1250,"granted":true}}"#;
        let record: EventRecord = serde_json::from_str(raw).expect("record");
        assert_eq!(record.event_type, "successful_generation");
        assert_eq!(record.user_id, "109");
        assert_eq!(record.media_type(), Some("image"));
        assert_eq!(record.response_time_ms(), Some(1250.0));
        let details = record.details.expect("details");
        assert_eq!(details.extra.get("granted"), Some(&Value::Bool(true)));
    }

    #[test]
    fn record_accepts_null_details() {
        let raw = r#"{"Timestamp":"2024-01-01T05:00:00Z","UserID":"7","EventType":"follow","Details":null}"#;
        let record: EventRecord = serde_json::from_str(raw).expect("record");
        assert!(record.details.is_none());
        assert_eq!(record.media_type(), None);
    }

    #[test]
    fn summary_totals_and_lookups() {
        let mut summary = MetricsSummary::default();
        summary.event_counts.insert("request".to_string(), 3);
        summary.event_counts.insert("rate_limit_hit".to_string(), 2);
        assert_eq!(summary.total_events(), 5);
        assert_eq!(summary.count_for("rate_limit_hit"), 2);
        assert_eq!(summary.count_for("error"), 0);
    }
}
