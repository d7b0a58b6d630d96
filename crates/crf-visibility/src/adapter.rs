//! Presentation adapters: one per mounted cell instance and one per layout.
//!
//! An adapter owns the bus subscription for its own address and applies the
//! visibility events delivered to it. The view decides what to broadcast next.

use serde::Serialize;

use crf_model::{CellId, Dataset, DatasetId, FieldModelId, LayoutId, LayoutType, LayoutUid};

use crate::bus::Subscription;
use crate::state::{Transition, VisibilityState};

/// Address of a cell inside one layout instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellKey {
    pub layout_uid: LayoutUid,
    pub cell_id: CellId,
}

impl CellKey {
    pub fn new(layout_uid: LayoutUid, cell_id: CellId) -> Self {
        Self { layout_uid, cell_id }
    }
}

/// The runtime field displayed by a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub dataset_id: DatasetId,
    pub field_model_id: FieldModelId,
    pub read_only: bool,
}

impl FieldSlot {
    pub fn dataset<'a>(&self, datasets: &'a [Dataset]) -> Option<&'a Dataset> {
        datasets.iter().find(|dataset| dataset.id == self.dataset_id)
    }

    pub fn value<'a>(&self, datasets: &'a [Dataset]) -> Option<&'a str> {
        self.dataset(datasets)?
            .field(&self.field_model_id)?
            .value
            .as_deref()
    }
}

#[derive(Debug)]
pub struct CellAdapter {
    pub key: CellKey,
    pub layout_id: LayoutId,
    pub field: Option<FieldSlot>,
    subscription: Subscription,
}

impl CellAdapter {
    pub fn new(key: CellKey, layout_id: LayoutId, field: Option<FieldSlot>, subscription: Subscription) -> Self {
        Self {
            key,
            layout_id,
            field,
            subscription,
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Sets the cell's visibility; `None` when the cell is no longer mounted.
    pub fn apply(&self, state: &mut VisibilityState, shown: bool) -> Option<Transition> {
        state.set_cell(&self.key.layout_uid, &self.key.cell_id, shown)
    }

    /// Copies the cell's visibility onto its field.
    pub fn mirror(&self, datasets: &mut [Dataset], shown: bool) {
        let Some(slot) = &self.field else {
            return;
        };
        if let Some(field) = datasets
            .iter_mut()
            .find(|dataset| dataset.id == slot.dataset_id)
            .and_then(|dataset| dataset.field_mut(&slot.field_model_id))
        {
            field.shown = shown;
        }
    }

    /// A cell with a field is disabled when explicitly requested, when the
    /// dataset is not writable, or when the field model is read-only. A cell
    /// without a field is never disabled.
    pub fn disabled(&self, explicit: bool, datasets: &[Dataset]) -> bool {
        let Some(slot) = &self.field else {
            return false;
        };
        explicit || slot.read_only || slot.dataset(datasets).is_none_or(|dataset| !dataset.can_write)
    }
}

#[derive(Debug)]
pub struct LayoutAdapter {
    pub layout_id: LayoutId,
    pub layout_type: LayoutType,
    subscription: Subscription,
}

impl LayoutAdapter {
    pub fn new(layout_id: LayoutId, layout_type: LayoutType, subscription: Subscription) -> Self {
        Self {
            layout_id,
            layout_type,
            subscription,
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn apply(&self, state: &mut VisibilityState, shown: bool) -> Option<Transition> {
        state.set_layout(&self.layout_id, shown)
    }
}
