use aggregate::ZonePolicy;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{AppError, Result};

/// Resolves a named engagement window into its first visible date.
///
/// `None` means every date is shown.
pub fn resolve_engagement_since(
    window: Option<&str>,
    now: DateTime<Utc>,
    zone: ZonePolicy,
) -> Result<Option<NaiveDate>> {
    let today = zone.date_of(&now);
    let since = match window.map(str::trim).unwrap_or("alltime") {
        "today" => today,
        "last7days" => today - Duration::days(7),
        "last14days" => today - Duration::days(14),
        "thismonth" => zone.first_of_month(&now),
        "alltime" => return Ok(None),
        value => NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
            AppError::InvalidInput(format!("unsupported engagement window {}", value))
        })?,
    };
    Ok(Some(since))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-20T23:30:00Z")
            .expect("now")
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn named_windows() {
        let zone = ZonePolicy::Utc;
        assert_eq!(resolve_engagement_since(None, now(), zone).expect("all"), None);
        assert_eq!(
            resolve_engagement_since(Some("today"), now(), zone).expect("today"),
            Some(date(2024, 3, 20))
        );
        assert_eq!(
            resolve_engagement_since(Some("last7days"), now(), zone).expect("7"),
            Some(date(2024, 3, 13))
        );
        assert_eq!(
            resolve_engagement_since(Some("thismonth"), now(), zone).expect("month"),
            Some(date(2024, 3, 1))
        );
        assert_eq!(
            resolve_engagement_since(Some("2024-02-29"), now(), zone).expect("date"),
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn today_follows_zone() {
        let zone: ZonePolicy = "+02:00".parse().expect("zone");
        assert_eq!(
            resolve_engagement_since(Some("today"), now(), zone).expect("today"),
            Some(date(2024, 3, 21))
        );
    }

    #[test]
    fn rejects_unknown_window() {
        let err = resolve_engagement_since(Some("fortnight"), now(), ZonePolicy::Utc)
            .expect_err("invalid");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
