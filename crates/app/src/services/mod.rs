mod poller;
mod sources;

pub use poller::{Poller, PollerHandle, RefreshTrigger};
pub use sources::{FileSource, HttpSource, MetricsSource};
