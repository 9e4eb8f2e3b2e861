use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use aggregate::{TimelineEntry, timeline_entries};
use chrono::{DateTime, Utc};
use metrics_core::{EventRecord, HOURS_PER_DAY, MetricsSummary};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const EVENT_PALETTE: [&str; 5] = ["#6366f1", "#8b5cf6", "#d946ef", "#ec4899", "#f43f5e"];
pub const MEDIA_PALETTE: [&str; 3] = ["#6366f1", "#8b5cf6", "#d946ef"];
pub const ACTIVITY_COLOR: &str = "rgba(99, 102, 241, 0.5)";
pub const LATENCY_COLOR: &str = "#ef4444";

const RATE_LIMIT_EVENT_TYPE: &str = "rate_limit_hit";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn text_color(self) -> &'static str {
        match self {
            Self::Light => "#1e293b",
            Self::Dark => "#f1f5f9",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(AppError::InvalidInput(format!("unsupported theme {other}"))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// Gradient endpoints used to tag a timeline row.
pub fn event_color(event_type: &str) -> (&'static str, &'static str) {
    match event_type {
        "successful_generation" => ("#22c55e", "#16a34a"),
        "rate_limit_hit" => ("#f59e0b", "#d97706"),
        "follow" => ("#06b6d4", "#0891b2"),
        "error" => ("#ef4444", "#dc2626"),
        _ => ("#6366f1", "#8b5cf6"),
    }
}

pub fn hour_labels() -> Vec<String> {
    (0..HOURS_PER_DAY).map(|hour| format!("{hour}:00")).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: u64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: &'static str,
    pub slices: Vec<Slice>,
}

impl PieChart {
    /// Colors repeat once the palette runs out.
    pub fn from_counts(
        title: &'static str,
        counts: &BTreeMap<String, u64>,
        palette: &[&'static str],
    ) -> Self {
        let slices = counts
            .iter()
            .zip(palette.iter().cycle())
            .map(|((label, value), color)| Slice {
                label: label.clone(),
                value: *value,
                color: *color,
            })
            .collect();
        Self { title, slices }
    }

    pub fn total(&self) -> u64 {
        self.slices.iter().map(|slice| slice.value).sum()
    }
}

/// Activity bars plus the average latency line, one point per hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedChart {
    pub labels: Vec<String>,
    pub activity: [u64; HOURS_PER_DAY],
    pub avg_response_ms: [f64; HOURS_PER_DAY],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSlots {
    pub total_events: u64,
    pub unique_users: u64,
    pub avg_response_time: String,
    pub rate_limit_hits: u64,
    pub last_updated: DateTime<Utc>,
}

/// Everything a presenter needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub stats: StatSlots,
    pub events_pie: PieChart,
    pub media_pie: PieChart,
    pub combined: CombinedChart,
    pub timeline: Vec<TimelineEntry>,
}

pub fn build_view(
    summary: &MetricsSummary,
    records: &[EventRecord],
    now: DateTime<Utc>,
    timeline_limit: usize,
) -> Result<DashboardView> {
    let stats = StatSlots {
        total_events: summary.total_events(),
        unique_users: summary.unique_user_count,
        avg_response_time: format!("{}ms", summary.avg_response_time_overall),
        rate_limit_hits: summary.count_for(RATE_LIMIT_EVENT_TYPE),
        last_updated: now,
    };
    Ok(DashboardView {
        stats,
        events_pie: PieChart::from_counts("Events", &summary.event_counts, &EVENT_PALETTE),
        media_pie: PieChart::from_counts(
            "Media Types",
            &summary.media_type_counts,
            &MEDIA_PALETTE,
        ),
        combined: CombinedChart {
            labels: hour_labels(),
            activity: summary.hourly_activity,
            avg_response_ms: summary.hourly_avg_response_time,
        },
        timeline: timeline_entries(records, now, timeline_limit)?,
    })
}
