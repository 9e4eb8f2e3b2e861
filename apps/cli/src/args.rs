use std::path::PathBuf;

use aggregate::{DEFAULT_LEADERBOARD_SIZE, GENERATION_EVENT_TYPE, ZonePolicy};
use clap::{Args, Parser, Subcommand};
use metrics_app::Theme;

/// Poll a metrics endpoint and summarize its event records
#[derive(Parser, Debug)]
#[command(name = "metrics-dashboard", version, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh the dashboard on a fixed cadence
    Watch(WatchArgs),
    /// Print the aggregated summary of a metrics file as JSON
    Summarize(SummarizeArgs),
    /// Print the weekly rollup of a metrics file
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Metrics endpoint URL
    #[arg(long, value_name = "URL", conflicts_with = "file")]
    pub endpoint: Option<String>,

    /// Read a local metrics.json instead of the endpoint
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Seconds between refreshes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    #[arg(long, value_name = "light|dark")]
    pub theme: Option<Theme>,

    /// Render one frame and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Metrics file, or `-` for stdin
    #[arg(value_name = "PATH|-")]
    pub input: PathBuf,

    /// Zone for hour-of-day buckets (local, utc, +HH:MM)
    #[arg(long, value_name = "ZONE")]
    pub hour_zone: Option<ZonePolicy>,

    /// Zone for calendar-date buckets
    #[arg(long, value_name = "ZONE")]
    pub date_zone: Option<ZonePolicy>,

    /// Engagement window (today, last7days, last14days, thismonth, alltime, YYYY-MM-DD)
    #[arg(long, value_name = "WINDOW")]
    pub window: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Metrics file, or `-` for stdin
    #[arg(value_name = "PATH|-")]
    pub input: PathBuf,

    /// Event type ranked on the leaderboard
    #[arg(long, default_value = GENERATION_EVENT_TYPE)]
    pub event_type: String,

    #[arg(long, default_value_t = DEFAULT_LEADERBOARD_SIZE)]
    pub top: usize,

    /// Length of the counting window in days
    #[arg(long, default_value_t = 7)]
    pub days: i64,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}
