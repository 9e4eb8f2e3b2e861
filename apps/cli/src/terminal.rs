use std::io::{self, Write};

use aggregate::TimelineEntry;
use metrics_app::presenter::{ACTIVITY_COLOR, CombinedChart, LATENCY_COLOR, PieChart, event_color};
use metrics_app::{
    AppError, ChartHandle, ChartRegistry, ChartSlot, DashboardView, Presenter, Result, Theme,
};

const BAR_WIDTH: usize = 30;
const RESET: &str = "\x1b[0m";

/// Parses `#rrggbb` or `rgba(r, g, b, a)` into an RGB triple.
fn rgb(color: &str) -> Option<(u8, u8, u8)> {
    if let Some(hex) = color.strip_prefix('#')
        && hex.len() == 6
    {
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        return Some((channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }
    let inner = color.strip_prefix("rgba(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|part| part.trim().parse::<u8>().ok());
    Some((parts.next()??, parts.next()??, parts.next()??))
}

fn paint(text: &str, color: &str, enabled: bool) -> String {
    match rgb(color) {
        Some((r, g, b)) if enabled => format!("\x1b[38;2;{r};{g};{b}m{text}{RESET}"),
        _ => text.to_string(),
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells.clamp(1, BAR_WIDTH))
}

/// Pre-rendered lines for one chart slot.
#[derive(Debug)]
pub struct TextChart {
    lines: Vec<String>,
}

impl TextChart {
    fn pie(chart: &PieChart, colored: bool) -> Self {
        let total = chart.total();
        let max = chart.slices.iter().map(|s| s.value).max().unwrap_or(0) as f64;
        let mut lines = vec![format!("{} ({total})", chart.title)];
        if chart.slices.is_empty() {
            lines.push("  no data".to_string());
        }
        for slice in &chart.slices {
            let share = if total == 0 {
                0.0
            } else {
                slice.value as f64 * 100.0 / total as f64
            };
            lines.push(format!(
                "  {:<24} {:>6} {:>5.1}% {}",
                slice.label,
                slice.value,
                share,
                paint(&bar(slice.value as f64, max), slice.color, colored)
            ));
        }
        Self { lines }
    }

    fn combined(chart: &CombinedChart, colored: bool) -> Self {
        let max_activity = chart.activity.iter().copied().max().unwrap_or(0) as f64;
        let mut lines = vec!["Activity by hour / Avg Response Time (ms)".to_string()];
        for (hour, label) in chart.labels.iter().enumerate() {
            let count = chart.activity[hour];
            let latency = chart.avg_response_ms[hour];
            let latency = if latency > 0.0 {
                paint(&format!("{latency:.0}ms"), LATENCY_COLOR, colored)
            } else {
                "-".to_string()
            };
            lines.push(format!(
                "  {:>5} {:<width$} {:>5}  {}",
                label,
                paint(&bar(count as f64, max_activity), ACTIVITY_COLOR, colored),
                count,
                latency,
                width = if colored { 0 } else { BAR_WIDTH },
            ));
        }
        Self { lines }
    }
}

impl ChartHandle for TextChart {
    fn destroy(&mut self) {
        self.lines.clear();
    }
}

/// Writes each frame as plain text, optionally with ANSI colors.
pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    colored: bool,
    charts: ChartRegistry<TextChart>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self {
            out,
            colored,
            charts: ChartRegistry::new(),
        }
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }

    fn write_chart(&mut self, slot: ChartSlot) -> io::Result<()> {
        if let Some(chart) = self.charts.get(slot) {
            for line in &chart.lines {
                writeln!(self.out, "{line}")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_timeline(&mut self, entries: &[TimelineEntry], theme: Theme) -> io::Result<()> {
        writeln!(self.out, "Recent activity")?;
        if entries.is_empty() {
            writeln!(self.out, "  no events")?;
        }
        for entry in entries {
            let title = paint(&entry.title, theme.text_color(), self.colored);
            writeln!(self.out, "  {} {}  ({})", entry.icon, title, entry.time_ago)?;
            if let Some(details) = &entry.details {
                writeln!(self.out, "      {details}")?;
            }
            let (tag_color, _) = event_color(&entry.event_type);
            writeln!(self.out, "      {}", paint(&entry.user_tag, tag_color, self.colored))?;
        }
        Ok(())
    }

    fn write_frame(&mut self, view: &DashboardView, theme: Theme) -> io::Result<()> {
        let stats = &view.stats;
        let heading = paint("Metrics dashboard", theme.text_color(), self.colored);
        writeln!(self.out, "{heading}  [{theme}]")?;
        writeln!(
            self.out,
            "Total events: {}  Users: {}  Avg response: {}  Rate limits: {}",
            stats.total_events, stats.unique_users, stats.avg_response_time, stats.rate_limit_hits
        )?;
        writeln!(
            self.out,
            "Last updated: {}",
            stats.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.out)?;
        for slot in ChartSlot::ALL {
            self.write_chart(slot)?;
        }
        self.write_timeline(&view.timeline, theme)?;
        self.out.flush()
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &DashboardView, theme: Theme) -> Result<()> {
        let colored = self.colored;
        self.charts.replace(ChartSlot::EventsPie, || {
            Ok(TextChart::pie(&view.events_pie, colored))
        })?;
        self.charts.replace(ChartSlot::MediaTypePie, || {
            Ok(TextChart::pie(&view.media_pie, colored))
        })?;
        self.charts.replace(ChartSlot::Combined, || {
            Ok(TextChart::combined(&view.combined, colored))
        })?;
        self.write_frame(view, theme).map_err(AppError::from)
    }

    fn report_failure(&mut self, err: &AppError) {
        let _ = writeln!(self.out, "! refresh failed: {err} (showing last good data)");
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregate::{AggregateOptions, ZonePolicy, aggregate};
    use chrono::{DateTime, Utc};
    use metrics_app::build_view;
    use metrics_core::EventRecord;

    fn view() -> DashboardView {
        let records = vec![
            EventRecord::new("request", "abcdefghijk", "2024-01-01T10:00:00Z"),
            EventRecord::new("successful_generation", "abcdefghijk", "2024-01-01T10:00:03Z")
                .with_details(Some("image"), Some(750.0)),
        ];
        let summary =
            aggregate(&records, &AggregateOptions::pinned(ZonePolicy::Utc)).expect("summary");
        let now = DateTime::parse_from_rfc3339("2024-01-01T10:05:03Z")
            .expect("now")
            .with_timezone(&Utc);
        build_view(&summary, &records, now, 20).expect("view")
    }

    fn rendered(presenter: &TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.output().clone()).expect("utf8")
    }

    #[test]
    fn renders_plain_frame() {
        let mut presenter = TerminalPresenter::new(Vec::new(), false);
        presenter.render(&view(), Theme::Light).expect("render");
        let text = rendered(&presenter);
        assert!(text.contains("Total events: 2  Users: 1  Avg response: 750ms  Rate limits: 0"));
        assert!(text.contains("Events (2)"));
        assert!(text.contains("Media Types (1)"));
        assert!(text.contains("10:00"));
        assert!(text.contains("750ms"));
        assert!(text.contains("✨ Successful Generation  (5 minutes ago)"));
        assert!(text.contains("Media Type: image • Response Time: 750ms"));
        assert!(text.contains("User ID: abcdefgh..."));
        assert!(!text.contains('\x1b'));
        assert_eq!(presenter.charts.len(), 3);
    }

    #[test]
    fn colored_frame_uses_theme_text_color() {
        let mut presenter = TerminalPresenter::new(Vec::new(), true);
        presenter.render(&view(), Theme::Dark).expect("render");
        let text = rendered(&presenter);
        // #f1f5f9
        assert!(text.contains("\x1b[38;2;241;245;249m"));
    }

    #[test]
    fn failure_is_reported_inline() {
        let mut presenter = TerminalPresenter::new(Vec::new(), false);
        presenter.report_failure(&AppError::Status {
            status: 502,
            url: "http://localhost/api/metrics".to_string(),
        });
        assert!(rendered(&presenter).starts_with("! refresh failed: endpoint"));
    }

    #[test]
    fn parses_palette_colors() {
        assert_eq!(rgb("#6366f1"), Some((99, 102, 241)));
        assert_eq!(rgb("rgba(99, 102, 241, 0.5)"), Some((99, 102, 241)));
        assert_eq!(rgb("teal"), None);
    }
}
