use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use metrics_core::EventRecord;
use serde::Serialize;

use crate::parser::record_instants;
use crate::types::{AggregateError, Result};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub count: u64,
}

/// Users ranked by how many `event_type` records they produced.
///
/// Ties are broken by user id so the ranking is deterministic.
pub fn leaderboard(
    records: &[EventRecord],
    event_type: &str,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut scores: HashMap<&str, u64> = HashMap::new();
    for record in records.iter().filter(|record| record.event_type == event_type) {
        *scores.entry(record.user_id.as_str()).or_insert(0) += 1;
    }
    let mut entries: Vec<LeaderboardEntry> = scores
        .into_iter()
        .map(|(user_id, count)| LeaderboardEntry {
            user_id: user_id.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
    entries.truncate(limit);
    entries
}

/// Event counts for records strictly after `since`.
pub fn window_counts(
    records: &[EventRecord],
    since: DateTime<Utc>,
) -> Result<BTreeMap<String, u64>> {
    let instants = record_instants(records)?;
    let mut counts = BTreeMap::new();
    for (record, instant) in records.iter().zip(&instants) {
        if *instant > since {
            *counts.entry(record.event_type.clone()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Periodic digest: windowed event counts plus an all-time leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub event_counts: BTreeMap<String, u64>,
    pub leaderboard_event_type: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl WeeklyReport {
    pub fn count_for(&self, event_type: &str) -> u64 {
        self.event_counts.get(event_type).copied().unwrap_or(0)
    }

    pub fn leaderboard_lines(&self) -> Vec<String> {
        self.leaderboard
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                format!("{}. @{} ({} events)", rank + 1, entry.user_id, entry.count)
            })
            .collect()
    }
}

pub fn weekly_report(
    records: &[EventRecord],
    now: DateTime<Utc>,
    days: i64,
    leaderboard_event_type: &str,
    top: usize,
) -> Result<WeeklyReport> {
    let since = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| AggregateError::InvalidWindow(format!("{days} days is out of range")))?;
    Ok(WeeklyReport {
        since,
        until: now,
        event_counts: window_counts(records, since)?,
        leaderboard_event_type: leaderboard_event_type.to_string(),
        leaderboard: leaderboard(records, leaderboard_event_type, top),
    })
}
