//! All-cells-loaded coordination per layout instance.

use std::collections::{BTreeSet, HashMap};

use crf_model::{CellId, LayoutUid};

/// Outcome of reporting progress to the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchStatus {
    /// Cells still expected before the instance is loaded.
    Pending(usize),
    /// This call released the latch; initial criteria must run now.
    Completed,
    /// The latch was released earlier.
    AlreadyFired,
    /// No latch is registered for the instance.
    Unknown,
}

#[derive(Debug, Default)]
struct Countdown {
    waiting: BTreeSet<CellId>,
    fired: bool,
}

/// Countdown latch keyed by layout instance. It fires exactly once, when the
/// last expected cell of the instance reports that it is mounted.
#[derive(Debug, Default)]
pub struct CellLoadingLatch {
    instances: HashMap<LayoutUid, Countdown>,
}

impl CellLoadingLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts waiting for `cells` of an instance. Re-registering a live instance is ignored.
    pub fn register<'a>(&mut self, layout_uid: &LayoutUid, cells: impl IntoIterator<Item = &'a CellId>) {
        self.instances
            .entry(layout_uid.clone())
            .or_insert_with(|| Countdown {
                waiting: cells.into_iter().cloned().collect(),
                fired: false,
            });
    }

    /// Records that one cell is mounted. Mounting a cell twice counts once.
    pub fn cell_loaded(&mut self, layout_uid: &LayoutUid, cell: &CellId) -> LatchStatus {
        let Some(countdown) = self.instances.get_mut(layout_uid) else {
            return LatchStatus::Unknown;
        };
        if countdown.fired {
            return LatchStatus::AlreadyFired;
        }
        countdown.waiting.remove(cell);
        if countdown.waiting.is_empty() {
            countdown.fired = true;
            LatchStatus::Completed
        } else {
            LatchStatus::Pending(countdown.waiting.len())
        }
    }

    /// Releases the latch regardless of the cells still expected.
    pub fn complete(&mut self, layout_uid: &LayoutUid) -> LatchStatus {
        let Some(countdown) = self.instances.get_mut(layout_uid) else {
            return LatchStatus::Unknown;
        };
        if countdown.fired {
            return LatchStatus::AlreadyFired;
        }
        countdown.waiting.clear();
        countdown.fired = true;
        LatchStatus::Completed
    }

    pub fn is_fired(&self, layout_uid: &LayoutUid) -> bool {
        self.instances
            .get(layout_uid)
            .is_some_and(|countdown| countdown.fired)
    }

    /// Forgets an instance, e.g. when its repeated row is removed.
    pub fn release(&mut self, layout_uid: &LayoutUid) -> bool {
        self.instances.remove(layout_uid).is_some()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}
