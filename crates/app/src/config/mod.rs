use std::time::Duration;

use aggregate::{AggregateOptions, DEFAULT_TIMELINE_LIMIT, ZonePolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::presenter::Theme;
use crate::util::time::resolve_engagement_since;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api/metrics";
pub const DEFAULT_REFRESH_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub endpoint: String,
    pub refresh_secs: u64,
    pub timeline_limit: usize,
    pub hour_zone: ZonePolicy,
    pub date_zone: ZonePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_window: Option<String>,
    pub theme: Theme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let options = AggregateOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            refresh_secs: DEFAULT_REFRESH_SECS,
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            hour_zone: options.hour_zone,
            date_zone: options.date_zone,
            engagement_window: None,
            theme: Theme::default(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.refresh_secs == 0 {
            return Err(AppError::InvalidInput(
                "refresh_secs must be at least 1".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(AppError::InvalidInput("endpoint is empty".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    /// Options for an aggregation pass run at `now`.
    pub fn aggregate_options(&self, now: DateTime<Utc>) -> Result<AggregateOptions> {
        Ok(AggregateOptions {
            hour_zone: self.hour_zone,
            date_zone: self.date_zone,
            engagement_since: resolve_engagement_since(
                self.engagement_window.as_deref(),
                now,
                self.date_zone,
            )?,
            ..AggregateOptions::default()
        })
    }
}
