mod registry;
mod view;

use crate::error::{AppError, Result};

pub use registry::{ChartHandle, ChartRegistry, ChartSlot};
pub use view::{
    ACTIVITY_COLOR, CombinedChart, DashboardView, EVENT_PALETTE, LATENCY_COLOR, MEDIA_PALETTE,
    PieChart, Slice, StatSlots, Theme, build_view, event_color, hour_labels,
};

/// Display surface driven by the poller.
pub trait Presenter: Send {
    fn render(&mut self, view: &DashboardView, theme: Theme) -> Result<()>;

    /// Non-fatal; whatever was last rendered stays visible.
    fn report_failure(&mut self, err: &AppError);
}
