use std::collections::BTreeMap;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartSlot {
    EventsPie,
    MediaTypePie,
    Combined,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 3] = [Self::EventsPie, Self::MediaTypePie, Self::Combined];

    pub fn name(self) -> &'static str {
        match self {
            Self::EventsPie => "eventsPie",
            Self::MediaTypePie => "mediaTypePie",
            Self::Combined => "combinedChart",
        }
    }
}

/// A live chart owned by a presenter.
pub trait ChartHandle {
    /// Releases whatever the chart holds. Called exactly once per handle.
    fn destroy(&mut self);
}

/// Named chart slots with at most one live handle each.
#[derive(Debug)]
pub struct ChartRegistry<H: ChartHandle> {
    charts: BTreeMap<ChartSlot, H>,
}

impl<H: ChartHandle> Default for ChartRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ChartHandle> ChartRegistry<H> {
    pub fn new() -> Self {
        Self {
            charts: BTreeMap::new(),
        }
    }

    /// Destroys the slot's current chart, then installs a freshly created one.
    ///
    /// If `create` fails the slot stays empty.
    pub fn replace<F>(&mut self, slot: ChartSlot, create: F) -> Result<&mut H>
    where
        F: FnOnce() -> Result<H>,
    {
        self.destroy(slot);
        let handle = create()?;
        Ok(self.charts.entry(slot).or_insert(handle))
    }

    pub fn get(&self, slot: ChartSlot) -> Option<&H> {
        self.charts.get(&slot)
    }

    pub fn destroy(&mut self, slot: ChartSlot) -> bool {
        match self.charts.remove(&slot) {
            Some(mut handle) => {
                handle.destroy();
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&mut self) {
        for slot in ChartSlot::ALL {
            self.destroy(slot);
        }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

impl<H: ChartHandle> Drop for ChartRegistry<H> {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
