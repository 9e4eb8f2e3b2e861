mod args;
mod config;
mod terminal;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use aggregate::{aggregate, parse_records_from_reader, weekly_report};
use chrono::Utc;
use clap::Parser;
use metrics_app::{
    AppError, DashboardConfig, FileSource, HttpSource, MetricsSource, Poller, PollerHandle, Theme,
};
use metrics_core::EventRecord;
use tracing::{info, warn};

use crate::args::{Cli, Command, ReportArgs, SummarizeArgs, WatchArgs};
use crate::terminal::TerminalPresenter;

const DEFAULT_LOG_FILTER: &str = "metrics_dashboard=info,metrics_app=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let loaded = config::load_or_create(cli.config.as_deref()).map_err(io::Error::other)?;
    if loaded.created {
        info!(path = %loaded.file.display(), "created default config");
    }

    match cli.command {
        Command::Watch(args) => watch(loaded.config, args).await?,
        Command::Summarize(args) => summarize(loaded.config, args)?,
        Command::Report(args) => report(args)?,
    }
    Ok(())
}

fn apply_watch_overrides(mut config: DashboardConfig, args: &WatchArgs) -> DashboardConfig {
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(secs) = args.interval {
        config.refresh_secs = secs;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    config
}

async fn watch(config: DashboardConfig, args: WatchArgs) -> Result<(), AppError> {
    let config = apply_watch_overrides(config, &args);
    config.validate()?;
    match &args.file {
        Some(path) => run_watch(FileSource::new(path), config, args.once).await,
        None => {
            let source = HttpSource::new(config.endpoint.clone())?;
            run_watch(source, config, args.once).await
        }
    }
}

async fn run_watch<S>(source: S, config: DashboardConfig, once: bool) -> Result<(), AppError>
where
    S: MetricsSource + 'static,
{
    let theme = config.theme;
    let (mut poller, handle) = Poller::new(source, TerminalPresenter::stdout(), config);
    if once {
        return poller.refresh().await;
    }
    spawn_theme_toggle(handle, theme);
    poller.run(shutdown_signal()).await;
    Ok(())
}

/// SIGUSR1 flips between the light and dark themes.
#[cfg(unix)]
fn spawn_theme_toggle(handle: PollerHandle, mut theme: Theme) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut signals = match signal(SignalKind::user_defined1()) {
            Ok(signals) => signals,
            Err(err) => {
                warn!(error = %err, "theme toggle unavailable");
                return;
            }
        };
        while signals.recv().await.is_some() {
            theme = theme.toggled();
            if !handle.set_theme(theme) {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_theme_toggle(_handle: PollerHandle, _theme: Theme) {}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn read_records(input: &Path) -> Result<Vec<EventRecord>, AppError> {
    if input == Path::new("-") {
        return Ok(parse_records_from_reader(io::stdin().lock())?);
    }
    let file = File::open(input)?;
    Ok(parse_records_from_reader(BufReader::new(file))?)
}

fn summarize(mut config: DashboardConfig, args: SummarizeArgs) -> Result<(), AppError> {
    if let Some(zone) = args.hour_zone {
        config.hour_zone = zone;
    }
    if let Some(zone) = args.date_zone {
        config.date_zone = zone;
    }
    if args.window.is_some() {
        config.engagement_window = args.window;
    }
    let records = read_records(&args.input)?;
    let options = config.aggregate_options(Utc::now())?;
    let summary = aggregate(&records, &options)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn report(args: ReportArgs) -> Result<(), AppError> {
    if args.days < 0 {
        return Err(AppError::InvalidInput("--days must not be negative".to_string()));
    }
    let records = read_records(&args.input)?;
    let report = weekly_report(&records, Utc::now(), args.days, &args.event_type, args.top)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "Summary {} to {}",
        report.since.format("%Y-%m-%d %H:%M"),
        report.until.format("%Y-%m-%d %H:%M")
    );
    if report.event_counts.is_empty() {
        println!("  no events in window");
    }
    for (event_type, count) in &report.event_counts {
        println!("  {:<24} {count}", metrics_core::format_event_type(event_type));
    }
    println!(
        "Top users by {}:",
        metrics_core::format_event_type(&report.leaderboard_event_type)
    );
    for line in report.leaderboard_lines() {
        println!("  {line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_flags_override_config() {
        let args = WatchArgs {
            endpoint: Some("http://10.0.0.2/api/metrics".to_string()),
            interval: Some(5),
            theme: Some(Theme::Dark),
            ..WatchArgs::default()
        };
        let config = apply_watch_overrides(DashboardConfig::default(), &args);
        assert_eq!(config.endpoint, "http://10.0.0.2/api/metrics");
        assert_eq!(config.refresh_secs, 5);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.timeline_limit, 20);
    }

    #[test]
    fn reads_records_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("metrics.json");
        std::fs::write(
            &path,
            r#"[{"Timestamp":"2024-01-01T00:00:00Z","UserID":"u","EventType":"follow"}]"#,
        )
        .expect("write");
        let records = read_records(&path).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "follow");
    }
}
