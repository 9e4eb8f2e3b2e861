use std::collections::HashSet;

use chrono::NaiveDate;
use metrics_core::{EventRecord, HOURS_PER_DAY, MetricsSummary, ResponseSample};

use crate::engagement::daily_engagement;
use crate::parser::record_instants;
use crate::types::Result;
use crate::zone::ZonePolicy;

pub const GENERATION_EVENT_TYPE: &str = "successful_generation";
pub const LATENCY_MEDIA_TYPE: &str = "image";

/// Knobs for one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub hour_zone: ZonePolicy,
    pub date_zone: ZonePolicy,
    /// Event type whose details feed media counts and latency samples.
    pub generation_event_type: String,
    /// Media type whose `responseTime` is sampled.
    pub latency_media_type: String,
    /// First date reported in `daily_engagement`.
    pub engagement_since: Option<NaiveDate>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            hour_zone: ZonePolicy::Local,
            date_zone: ZonePolicy::Utc,
            generation_event_type: GENERATION_EVENT_TYPE.to_string(),
            latency_media_type: LATENCY_MEDIA_TYPE.to_string(),
            engagement_since: None,
        }
    }
}

impl AggregateOptions {
    /// Both bucket kinds read from the same zone.
    pub fn pinned(zone: ZonePolicy) -> Self {
        Self {
            hour_zone: zone,
            date_zone: zone,
            ..Self::default()
        }
    }
}

fn mean_rounded(samples: &[ResponseSample]) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let sum: f64 = samples.iter().map(|sample| sample.response_time_ms).sum();
    (sum / samples.len() as f64).round() as u64
}

fn hourly_average(samples: &[ResponseSample], zone: ZonePolicy) -> [f64; HOURS_PER_DAY] {
    let mut sums = [0.0f64; HOURS_PER_DAY];
    let mut counts = [0u32; HOURS_PER_DAY];
    for sample in samples {
        let hour = zone.hour_of(&sample.timestamp) as usize;
        sums[hour] += sample.response_time_ms;
        counts[hour] += 1;
    }
    let mut averages = [0.0f64; HOURS_PER_DAY];
    for hour in 0..HOURS_PER_DAY {
        if counts[hour] > 0 {
            averages[hour] = sums[hour] / f64::from(counts[hour]);
        }
    }
    averages
}

/// Builds a fresh summary from a batch of records.
///
/// Every timestamp is validated before anything is counted, so a malformed
/// record fails the whole batch.
pub fn aggregate(records: &[EventRecord], options: &AggregateOptions) -> Result<MetricsSummary> {
    let instants = record_instants(records)?;
    let mut summary = MetricsSummary::default();
    let mut users: HashSet<&str> = HashSet::new();
    let mut samples = Vec::new();

    for (record, instant) in records.iter().zip(&instants) {
        *summary
            .event_counts
            .entry(record.event_type.clone())
            .or_insert(0) += 1;
        users.insert(record.user_id.as_str());
        summary.hourly_activity[options.hour_zone.hour_of(instant) as usize] += 1;

        if record.event_type != options.generation_event_type {
            continue;
        }
        let Some(media_type) = record.media_type() else {
            continue;
        };
        *summary
            .media_type_counts
            .entry(media_type.to_string())
            .or_insert(0) += 1;
        if media_type == options.latency_media_type
            && let Some(response_time_ms) = record.response_time_ms()
        {
            samples.push(ResponseSample {
                timestamp: *instant,
                response_time_ms,
            });
        }
    }

    summary.unique_user_count = users.len() as u64;
    summary.avg_response_time_overall = mean_rounded(&samples);
    summary.hourly_avg_response_time = hourly_average(&samples, options.hour_zone);
    summary.daily_engagement = daily_engagement(
        records,
        &instants,
        options.date_zone,
        options.engagement_since,
    );
    summary.image_response_samples = samples;
    Ok(summary)
}
