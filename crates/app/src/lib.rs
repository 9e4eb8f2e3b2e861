pub mod config;
pub mod error;
pub mod presenter;
pub mod services;
pub mod util;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_REFRESH_SECS, DashboardConfig};
pub use error::{AppError, Result};
pub use presenter::{
    ChartHandle, ChartRegistry, ChartSlot, DashboardView, Presenter, Theme, build_view,
};
pub use services::{FileSource, HttpSource, MetricsSource, Poller, PollerHandle, RefreshTrigger};
pub use util::time::resolve_engagement_since;
