use std::future::Future;

use aggregate::aggregate;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::presenter::{DashboardView, Presenter, Theme, build_view};
use crate::services::MetricsSource;

const TRIGGER_QUEUE: usize = 16;

async fn load<S: MetricsSource>(
    source: &S,
    config: &DashboardConfig,
    now: DateTime<Utc>,
) -> Result<DashboardView> {
    let records = source.fetch().await?;
    let options = config.aggregate_options(now)?;
    let summary = aggregate(&records, &options)?;
    build_view(&summary, &records, now, config.timeline_limit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Interval,
    Manual,
    ThemeChanged(Theme),
}

/// Cloneable sender for out-of-band refresh requests.
#[derive(Clone, Debug)]
pub struct PollerHandle {
    tx: mpsc::Sender<RefreshTrigger>,
}

impl PollerHandle {
    /// Returns false when the poller is gone. A full queue still counts as
    /// delivered since pending triggers are coalesced anyway.
    pub fn request(&self, trigger: RefreshTrigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.request(RefreshTrigger::ThemeChanged(theme))
    }
}

/// Fetch, aggregate and render on a fixed cadence.
///
/// The poller owns its presenter, so refreshes never overlap.
pub struct Poller<S, P> {
    source: S,
    presenter: P,
    config: DashboardConfig,
    theme: Theme,
    last_view: Option<DashboardView>,
    triggers: mpsc::Receiver<RefreshTrigger>,
    clock: fn() -> DateTime<Utc>,
}

impl<S, P> Poller<S, P>
where
    S: MetricsSource,
    P: Presenter,
{
    pub fn new(source: S, presenter: P, config: DashboardConfig) -> (Self, PollerHandle) {
        let (tx, triggers) = mpsc::channel(TRIGGER_QUEUE);
        let poller = Self {
            source,
            presenter,
            theme: config.theme,
            config,
            last_view: None,
            triggers,
            clock: Utc::now,
        };
        (poller, PollerHandle { tx })
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn last_view(&self) -> Option<&DashboardView> {
        self.last_view.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// One full cycle. On failure the previous view is kept and the
    /// presenter is told.
    pub async fn refresh(&mut self) -> Result<()> {
        let now = (self.clock)();
        let view = match load(&self.source, &self.config, now).await {
            Ok(view) => view,
            Err(err) => {
                warn!(source = %self.source.describe(), error = %err, "refresh failed");
                self.presenter.report_failure(&err);
                return Err(err);
            }
        };
        debug!(
            events = view.stats.total_events,
            users = view.stats.unique_users,
            "rendering refreshed view"
        );
        self.presenter.render(&view, self.theme)?;
        self.last_view = Some(view);
        Ok(())
    }

    /// Draws the last good view again without fetching. A render failure is
    /// reported to the presenter the same way a failed refresh is.
    pub fn rerender(&mut self) -> Result<bool> {
        let Some(view) = &self.last_view else {
            return Ok(false);
        };
        if let Err(err) = self.presenter.render(view, self.theme) {
            warn!(error = %err, "rerender failed");
            self.presenter.report_failure(&err);
            return Err(err);
        }
        Ok(true)
    }

    /// Handles `first` plus everything already queued as a single step.
    async fn dispatch(&mut self, first: Option<RefreshTrigger>) -> usize {
        let mut pending: Vec<RefreshTrigger> = first.into_iter().collect();
        while let Ok(trigger) = self.triggers.try_recv() {
            pending.push(trigger);
        }
        let handled = pending.len();
        let mut fetch = false;
        let mut theme = None;
        for trigger in pending {
            match trigger {
                RefreshTrigger::ThemeChanged(next) => theme = Some(next),
                RefreshTrigger::Startup | RefreshTrigger::Interval | RefreshTrigger::Manual => {
                    fetch = true
                }
            }
        }
        if let Some(next) = theme {
            info!(theme = %next, "theme changed");
            self.theme = next;
        }
        let outcome = if fetch {
            self.refresh().await
        } else if theme.is_some() {
            self.rerender().map(|_| ())
        } else {
            Ok(())
        };
        if let Err(err) = outcome {
            debug!(error = %err, "refresh step ended with error");
        }
        handled
    }

    /// Applies queued triggers without waiting; returns how many were drained.
    pub async fn process_pending(&mut self) -> usize {
        self.dispatch(None).await
    }

    /// Runs until `shutdown` resolves. The first tick fires immediately.
    pub async fn run<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        info!(
            source = %self.source.describe(),
            every_secs = self.config.refresh_interval().as_secs(),
            "poller started"
        );
        let mut first = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let trigger = if first {
                        RefreshTrigger::Startup
                    } else {
                        RefreshTrigger::Interval
                    };
                    first = false;
                    self.dispatch(Some(trigger)).await;
                }
                Some(trigger) = self.triggers.recv() => {
                    self.dispatch(Some(trigger)).await;
                }
            }
        }
        info!("poller stopped");
        self
    }
}
