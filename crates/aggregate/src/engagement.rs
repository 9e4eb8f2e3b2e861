use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use metrics_core::{DailyEngagement, EventRecord};

use crate::zone::ZonePolicy;

/// Earliest instant per user across the whole batch, converted to a date.
fn first_seen_dates<'a>(
    records: &'a [EventRecord],
    instants: &[DateTime<Utc>],
    zone: ZonePolicy,
) -> HashMap<&'a str, NaiveDate> {
    let mut earliest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for (record, instant) in records.iter().zip(instants) {
        earliest
            .entry(record.user_id.as_str())
            .and_modify(|seen| {
                if *instant < *seen {
                    *seen = *instant;
                }
            })
            .or_insert(*instant);
    }
    earliest
        .into_iter()
        .map(|(user, instant)| (user, zone.date_of(&instant)))
        .collect()
}

/// Active and newly seen users per calendar date.
///
/// Dates before `since` are left out, but first-seen dates still come from
/// the full batch, so a user seen before the window is never new inside it.
pub(crate) fn daily_engagement(
    records: &[EventRecord],
    instants: &[DateTime<Utc>],
    zone: ZonePolicy,
    since: Option<NaiveDate>,
) -> BTreeMap<NaiveDate, DailyEngagement> {
    let first_seen = first_seen_dates(records, instants, zone);
    let mut active: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for (record, instant) in records.iter().zip(instants) {
        let date = zone.date_of(instant);
        if since.is_some_and(|start| date < start) {
            continue;
        }
        active
            .entry(date)
            .or_default()
            .insert(record.user_id.as_str());
    }
    active
        .into_iter()
        .map(|(date, users)| {
            let new_users = users
                .iter()
                .filter(|user| first_seen.get(*user) == Some(&date))
                .count();
            (
                date,
                DailyEngagement {
                    active_user_count: users.len() as u64,
                    new_user_count: new_users as u64,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record_instants;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn engagement(
        records: &[EventRecord],
        since: Option<NaiveDate>,
    ) -> BTreeMap<NaiveDate, DailyEngagement> {
        let instants = record_instants(records).expect("instants");
        daily_engagement(records, &instants, ZonePolicy::Utc, since)
    }

    #[test]
    fn first_seen_uses_global_minimum() {
        let records = vec![
            EventRecord::new("request", "u1", "2024-01-02T10:00:00Z"),
            EventRecord::new("request", "u1", "2024-01-01T10:00:00Z"),
        ];
        let days = engagement(&records, None);
        assert_eq!(days[&date(2024, 1, 1)].new_user_count, 1);
        assert_eq!(days[&date(2024, 1, 2)].new_user_count, 0);
        assert_eq!(days[&date(2024, 1, 2)].active_user_count, 1);
    }

    #[test]
    fn repeat_events_count_user_once_per_day() {
        let records = vec![
            EventRecord::new("request", "u1", "2024-01-01T01:00:00Z"),
            EventRecord::new("request", "u1", "2024-01-01T02:00:00Z"),
            EventRecord::new("follow", "u2", "2024-01-01T03:00:00Z"),
        ];
        let days = engagement(&records, None);
        assert_eq!(
            days[&date(2024, 1, 1)],
            DailyEngagement {
                active_user_count: 2,
                new_user_count: 2,
            }
        );
    }

    #[test]
    fn window_hides_early_dates_but_keeps_history() {
        let records = vec![
            EventRecord::new("request", "old", "2024-01-01T10:00:00Z"),
            EventRecord::new("request", "old", "2024-01-05T10:00:00Z"),
            EventRecord::new("request", "fresh", "2024-01-05T11:00:00Z"),
        ];
        let days = engagement(&records, Some(date(2024, 1, 3)));
        assert!(!days.contains_key(&date(2024, 1, 1)));
        assert_eq!(
            days[&date(2024, 1, 5)],
            DailyEngagement {
                active_user_count: 2,
                new_user_count: 1,
            }
        );
    }
}
