mod aggregator;
mod engagement;
mod parser;
mod rollup;
mod timeline;
mod types;
mod zone;

pub use aggregator::{
    AggregateOptions, GENERATION_EVENT_TYPE, LATENCY_MEDIA_TYPE, aggregate,
};
pub use parser::{
    parse_records, parse_records_from_reader, parse_records_from_value, parse_timestamp,
};
pub use rollup::{
    DEFAULT_LEADERBOARD_SIZE, LeaderboardEntry, WeeklyReport, leaderboard, weekly_report,
    window_counts,
};
pub use timeline::{
    DEFAULT_TIMELINE_LIMIT, TimelineEntry, event_icon, recent_events, timeline_entries,
};
pub use types::{AggregateError, Result};
pub use zone::ZonePolicy;
