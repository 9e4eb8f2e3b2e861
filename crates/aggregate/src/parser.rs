use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics_core::EventRecord;
use serde_json::Value;

use crate::types::{AggregateError, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 timestamp into an absolute instant.
///
/// Offsets are honoured; naive date-times and bare dates are read as UTC, not
/// the host's local zone. Local wall-clock bucketing happens afterwards through
/// [`ZonePolicy`](crate::ZonePolicy).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc));
    }
    None
}

/// Checks one record and returns its parsed instant.
pub(crate) fn validate_record(index: usize, record: &EventRecord) -> Result<DateTime<Utc>> {
    let instant = parse_timestamp(&record.timestamp).ok_or_else(|| {
        AggregateError::malformed(index, format!("invalid timestamp {:?}", record.timestamp))
    })?;
    if let Some(ms) = record.response_time_ms()
        && (!ms.is_finite() || ms < 0.0)
    {
        return Err(AggregateError::malformed(
            index,
            format!("invalid responseTime {ms}"),
        ));
    }
    Ok(instant)
}

/// Parses every record's instant, failing on the first malformed record.
pub(crate) fn record_instants(records: &[EventRecord]) -> Result<Vec<DateTime<Utc>>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| validate_record(index, record))
        .collect()
}

pub fn parse_records_from_value(value: Value) -> Result<Vec<EventRecord>> {
    let Value::Array(items) = value else {
        return Err(AggregateError::InvalidPayload(
            "expected a JSON array of records".to_string(),
        ));
    };
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record: EventRecord = serde_json::from_value(item)
            .map_err(|err| AggregateError::malformed(index, err.to_string()))?;
        validate_record(index, &record)?;
        records.push(record);
    }
    Ok(records)
}

/// Decodes the `/api/metrics` payload.
pub fn parse_records(json: &str) -> Result<Vec<EventRecord>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| AggregateError::InvalidPayload(err.to_string()))?;
    parse_records_from_value(value)
}

pub fn parse_records_from_reader<R: Read>(reader: R) -> Result<Vec<EventRecord>> {
    let value: Value = serde_json::from_reader(reader)
        .map_err(|err| AggregateError::InvalidPayload(err.to_string()))?;
    parse_records_from_value(value)
}
