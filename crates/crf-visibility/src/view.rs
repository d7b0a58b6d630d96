//! Form view: the visibility engine of one open form.
//!
//! A view owns the visibility state, the event bus and one adapter per
//! mounted cell instance and per layout. Every inbound operation publishes
//! its verdicts on the bus and drains it before returning, so callers always
//! observe a quiescent state together with the ordered list of changes the
//! operation caused.
//!
//! Propagation rules:
//! - a cell that becomes hidden forces every target of its criteria hidden
//!   (cell targets within the same layout instance, layout targets globally);
//! - a cell that becomes shown re-evaluates its own criteria;
//! - a SINGLE layout that changes visibility applies the same visibility to
//!   every cell of its instance;
//! - a MULTIPLE layout only flags its instance datasets, instances are shown
//!   or hidden by the repeating container.
//!
//! Only transitions propagate, which makes cyclic hide chains terminate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crf_model::{
    CellId, Dataset, DatasetId, DatasetModelId, Field, FieldModelId, FormModel, LayoutId, LayoutType,
    LayoutUid, SubmissionPlan, Target,
};

use crate::adapter::{CellAdapter, CellKey, FieldSlot, LayoutAdapter};
use crate::bus::{EventBus, EventFilter, SubscriptionId, VisibilityEvent};
use crate::config::EngineConfig;
use crate::error::{Result, VisibilityError};
use crate::evaluator::{evaluate, verdicts};
use crate::latch::{CellLoadingLatch, LatchStatus};
use crate::state::{Transition, VisibilityState};
use crate::store::CriterionStore;

/// Outbound visibility notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisibilityChange {
    Cell {
        cell_id: CellId,
        layout_uid: LayoutUid,
        shown: bool,
    },
    Layout {
        layout_id: LayoutId,
        shown: bool,
    },
}

/// What one inbound operation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Visibility transitions, in the order they were applied.
    pub changes: Vec<VisibilityChange>,
    /// Events taken from the bus.
    pub delivered: usize,
    /// Criteria evaluated.
    pub evaluations: usize,
    /// Events or inbound operations dropped because their target is gone.
    pub stale: usize,
}

impl DispatchReport {
    fn dropped() -> Self {
        Self {
            stale: 1,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Appends the outcome of a later operation.
    pub fn merge(&mut self, other: DispatchReport) {
        self.changes.extend(other.changes);
        self.delivered += other.delivered;
        self.evaluations += other.evaluations;
        self.stale += other.stale;
    }
}

/// One mounted instance of a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInstance {
    pub layout_id: LayoutId,
    pub layout_type: LayoutType,
    /// Dataset backing a MULTIPLE instance.
    pub dataset_id: Option<DatasetId>,
}

/// Read-only view of one mounted cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSnapshot {
    pub layout_uid: LayoutUid,
    pub cell_id: CellId,
    pub shown: bool,
    pub field_model_id: Option<FieldModelId>,
    pub value: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
enum Route {
    Cell(CellKey),
    Layout(LayoutId),
}

#[derive(Debug)]
pub struct FormView {
    form: Arc<FormModel>,
    store: CriterionStore,
    config: EngineConfig,
    state: VisibilityState,
    bus: EventBus,
    latch: CellLoadingLatch,
    datasets: Vec<Dataset>,
    instances: BTreeMap<LayoutUid, LayoutInstance>,
    cells: BTreeMap<CellKey, CellAdapter>,
    layouts: BTreeMap<LayoutId, LayoutAdapter>,
    routes: HashMap<SubscriptionId, Route>,
    closed: bool,
}

impl FormView {
    /// Opens a view over `form` with the user's datasets.
    ///
    /// Every SINGLE layout gets one instance; every MULTIPLE layout gets one
    /// instance per live dataset of its dataset model. All cells start shown.
    ///
    /// # Errors
    ///
    /// [`VisibilityError::MissingRights`] when a displayed field belongs to a
    /// dataset model for which no dataset was provided.
    pub fn open(form: Arc<FormModel>, datasets: Vec<Dataset>, config: EngineConfig) -> Result<Self> {
        let store = CriterionStore::build(&form);
        let mut view = Self {
            form,
            store,
            config,
            state: VisibilityState::new(),
            bus: EventBus::new(),
            latch: CellLoadingLatch::new(),
            datasets,
            instances: BTreeMap::new(),
            cells: BTreeMap::new(),
            layouts: BTreeMap::new(),
            routes: HashMap::new(),
            closed: false,
        };

        let layouts: Vec<(LayoutId, LayoutType, Option<DatasetModelId>)> = view
            .store
            .layouts()
            .map(|layout| (layout.id.clone(), layout.layout_type, layout.dataset_model_id.clone()))
            .collect();
        for (layout_id, layout_type, dataset_model_id) in layouts {
            view.mount_layout(&layout_id, layout_type);
            match layout_type {
                LayoutType::Single => {
                    view.mount_instance(&layout_id, LayoutUid::single(&layout_id), None)?;
                }
                LayoutType::Multiple => {
                    let rows: Vec<DatasetId> = view
                        .datasets
                        .iter()
                        .filter(|dataset| !dataset.removed && Some(&dataset.model_id) == dataset_model_id.as_ref())
                        .map(|dataset| dataset.id.clone())
                        .collect();
                    for dataset_id in rows {
                        let uid = LayoutUid::instance(&layout_id, &dataset_id);
                        view.mount_instance(&layout_id, uid, Some(dataset_id))?;
                    }
                }
            }
        }

        info!(
            form = %view.form.id,
            layouts = view.layouts.len(),
            instances = view.instances.len(),
            cells = view.cells.len(),
            criteria = view.store.criterion_count(),
            "form view opened"
        );
        Ok(view)
    }

    fn mount_layout(&mut self, layout_id: &LayoutId, layout_type: LayoutType) {
        self.state.mount_layout(layout_id);
        let subscription = self.bus.subscribe(EventFilter::Layout {
            layout_id: layout_id.clone(),
        });
        self.routes
            .insert(subscription.id(), Route::Layout(layout_id.clone()));
        self.layouts.insert(
            layout_id.clone(),
            LayoutAdapter::new(layout_id.clone(), layout_type, subscription),
        );
    }

    /// Mounts every cell of one layout instance and registers its loading latch.
    fn mount_instance(&mut self, layout_id: &LayoutId, uid: LayoutUid, row: Option<DatasetId>) -> Result<()> {
        if self.instances.contains_key(&uid) {
            return Err(VisibilityError::DuplicateInstance(uid));
        }
        let Some(layout) = self.store.layout(layout_id) else {
            return Ok(());
        };
        let row_model = row.as_ref().and_then(|row| {
            self.datasets
                .iter()
                .find(|dataset| &dataset.id == row)
                .map(|dataset| dataset.model_id.clone())
        });

        let mut mounted = Vec::with_capacity(layout.cells.len());
        for cell in &layout.cells {
            let slot = match (&cell.field, &cell.field_model) {
                (Some(field), Some(model)) => {
                    let dataset_id = match (&row, &row_model) {
                        (Some(row), Some(row_model)) if row_model == &field.dataset_model_id => row.clone(),
                        _ => self
                            .datasets
                            .iter()
                            .find(|dataset| !dataset.removed && dataset.model_id == field.dataset_model_id)
                            .map(|dataset| dataset.id.clone())
                            .ok_or_else(|| VisibilityError::MissingRights {
                                dataset_model: field.dataset_model_id.clone(),
                            })?,
                    };
                    Some(FieldSlot {
                        dataset_id,
                        field_model_id: field.field_model_id.clone(),
                        read_only: model.read_only,
                    })
                }
                _ => None,
            };
            mounted.push((cell.id.clone(), slot));
        }
        let layout_type = layout.layout_type;

        for slot in mounted.iter().filter_map(|(_, slot)| slot.as_ref()) {
            if let Some(dataset) = self
                .datasets
                .iter_mut()
                .find(|dataset| dataset.id == slot.dataset_id)
            {
                dataset.field_or_insert(&slot.field_model_id);
            }
        }

        self.latch.register(&uid, mounted.iter().map(|(cell_id, _)| cell_id));
        for (cell_id, slot) in mounted {
            self.state.mount_cell(&uid, &cell_id);
            let subscription = self.bus.subscribe(EventFilter::Cell {
                cell_id: cell_id.clone(),
                layout_uid: uid.clone(),
            });
            let key = CellKey::new(uid.clone(), cell_id);
            self.routes
                .insert(subscription.id(), Route::Cell(key.clone()));
            self.cells.insert(
                key.clone(),
                CellAdapter::new(key, layout_id.clone(), slot, subscription),
            );
        }
        self.instances.insert(
            uid,
            LayoutInstance {
                layout_id: layout_id.clone(),
                layout_type,
                dataset_id: row,
            },
        );
        Ok(())
    }

    /// A cell of an instance finished its initial mount. Once every cell of
    /// the instance has reported, the instance's criteria are evaluated.
    pub fn cell_mounted(&mut self, cell_id: &CellId, layout_uid: &LayoutUid) -> Result<DispatchReport> {
        let key = CellKey::new(layout_uid.clone(), cell_id.clone());
        if self.closed || !self.cells.contains_key(&key) {
            debug!(cell = %cell_id, layout_uid = %layout_uid, "mount of unknown cell dropped");
            return Ok(DispatchReport::dropped());
        }
        match self.latch.cell_loaded(layout_uid, cell_id) {
            LatchStatus::Completed => self.run_instance_criteria(layout_uid),
            LatchStatus::Pending(remaining) => {
                debug!(layout_uid = %layout_uid, remaining, "waiting for cells");
                Ok(DispatchReport::default())
            }
            LatchStatus::AlreadyFired | LatchStatus::Unknown => Ok(DispatchReport::default()),
        }
    }

    /// Every cell of an instance is mounted; releases its latch if still pending.
    pub fn all_cells_mounted(&mut self, layout_uid: &LayoutUid) -> Result<DispatchReport> {
        if self.closed || !self.instances.contains_key(layout_uid) {
            debug!(layout_uid = %layout_uid, "loading signal for unknown instance dropped");
            return Ok(DispatchReport::dropped());
        }
        match self.latch.complete(layout_uid) {
            LatchStatus::Completed => self.run_instance_criteria(layout_uid),
            _ => Ok(DispatchReport::default()),
        }
    }

    fn run_instance_criteria(&mut self, layout_uid: &LayoutUid) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();
        let Some(instance) = self.instances.get(layout_uid) else {
            return Ok(report);
        };
        let Some(layout) = self.store.layout(&instance.layout_id) else {
            return Ok(report);
        };
        debug!(layout_uid = %layout_uid, "all cells loaded");
        for cell in layout.cells.iter().filter(|cell| cell.is_source()) {
            let key = CellKey::new(layout_uid.clone(), cell.id.clone());
            if let Some(adapter) = self.cells.get(&key) {
                for event in self.evaluate_source(adapter, &mut report) {
                    self.bus.publish(event);
                }
            }
        }
        self.dispatch(&mut report)?;
        Ok(report)
    }

    /// Stores a new value for the field of a cell and evaluates the cell's criteria.
    pub fn field_value_changed(
        &mut self,
        cell_id: &CellId,
        layout_uid: &LayoutUid,
        value: Option<String>,
    ) -> Result<DispatchReport> {
        let key = CellKey::new(layout_uid.clone(), cell_id.clone());
        let Some(adapter) = self.cells.get(&key).filter(|_| !self.closed) else {
            debug!(cell = %cell_id, layout_uid = %layout_uid, "value change for unknown cell dropped");
            return Ok(DispatchReport::dropped());
        };
        let Some(slot) = &adapter.field else {
            debug!(cell = %cell_id, layout_uid = %layout_uid, "value change for cell without field dropped");
            return Ok(DispatchReport::dropped());
        };
        debug!(
            cell = %cell_id,
            layout_uid = %layout_uid,
            value = self.config.loggable(value.as_deref()),
            "field value changed"
        );
        if let Some(dataset) = self
            .datasets
            .iter_mut()
            .find(|dataset| dataset.id == slot.dataset_id)
        {
            dataset.field_or_insert(&slot.field_model_id).value = value;
        }

        let mut report = DispatchReport::default();
        for event in self.evaluate_source(adapter, &mut report) {
            self.bus.publish(event);
        }
        self.dispatch(&mut report)?;
        Ok(report)
    }

    /// Shows or hides one instance of a MULTIPLE layout on behalf of the
    /// repeating container.
    pub fn set_instance_visibility(&mut self, layout_uid: &LayoutUid, shown: bool) -> Result<DispatchReport> {
        let Some(instance) = self.instances.get(layout_uid).filter(|_| !self.closed) else {
            debug!(layout_uid = %layout_uid, "visibility of unknown instance dropped");
            return Ok(DispatchReport::dropped());
        };
        if instance.layout_type != LayoutType::Multiple {
            return Err(VisibilityError::NotMultiple {
                layout: instance.layout_id.clone(),
            });
        }
        if let Some(dataset) = instance
            .dataset_id
            .as_ref()
            .and_then(|id| self.datasets.iter_mut().find(|dataset| &dataset.id == id))
        {
            dataset.shown = shown;
        }
        for cell_id in self
            .store
            .layout(&instance.layout_id)
            .into_iter()
            .flat_map(|layout| layout.cell_ids())
        {
            self.bus.publish(VisibilityEvent::Cell {
                cell_id: cell_id.clone(),
                layout_uid: layout_uid.clone(),
                shown,
            });
        }
        let mut report = DispatchReport::default();
        self.dispatch(&mut report)?;
        Ok(report)
    }

    /// Mounts a new instance of a MULTIPLE layout backed by `dataset`.
    ///
    /// Its criteria run once its cells report as mounted.
    pub fn add_instance(&mut self, layout_id: &LayoutId, mut dataset: Dataset) -> Result<DispatchReport> {
        if self.closed {
            debug!(layout = %layout_id, "instance added to closed view dropped");
            return Ok(DispatchReport::dropped());
        }
        let Some(layout) = self
            .store
            .layout(layout_id)
            .filter(|layout| layout.layout_type == LayoutType::Multiple)
        else {
            return Err(VisibilityError::NotMultiple {
                layout: layout_id.clone(),
            });
        };
        if layout.dataset_model_id.as_ref() != Some(&dataset.model_id) {
            return Err(VisibilityError::InstanceModelMismatch {
                layout: layout_id.clone(),
                dataset_model: dataset.model_id,
            });
        }
        let uid = LayoutUid::instance(layout_id, &dataset.id);
        if self.instances.contains_key(&uid) || self.datasets.iter().any(|known| known.id == dataset.id) {
            return Err(VisibilityError::DuplicateInstance(uid));
        }
        if let Some(model) = self.form.dataset_model(&dataset.model_id) {
            for field_model in &model.field_models {
                dataset.field_or_insert(&field_model.id);
            }
        }
        let dataset_id = dataset.id.clone();
        self.datasets.push(dataset);
        self.mount_instance(layout_id, uid.clone(), Some(dataset_id))?;
        info!(layout_uid = %uid, "layout instance added");

        let mut report = DispatchReport::default();
        self.dispatch(&mut report)?;
        Ok(report)
    }

    /// Unmounts an instance of a MULTIPLE layout. A persisted dataset is
    /// flagged removed with `rationale`; a dataset never submitted is dropped.
    ///
    /// # Errors
    ///
    /// [`VisibilityError::RationaleRequired`] when the dataset is persisted
    /// and `rationale` is missing or blank. Nothing is unmounted then.
    pub fn remove_instance(&mut self, layout_uid: &LayoutUid, rationale: Option<String>) -> Result<DispatchReport> {
        let Some(instance) = self.instances.get(layout_uid).filter(|_| !self.closed) else {
            debug!(layout_uid = %layout_uid, "removal of unknown instance dropped");
            return Ok(DispatchReport::dropped());
        };
        if instance.layout_type != LayoutType::Multiple {
            return Err(VisibilityError::NotMultiple {
                layout: instance.layout_id.clone(),
            });
        }
        let dataset_id = instance.dataset_id.clone();
        let rationale = rationale.filter(|rationale| !rationale.trim().is_empty());
        if let Some(dataset) = dataset_id
            .as_ref()
            .and_then(|id| self.datasets.iter().find(|dataset| &dataset.id == id))
            && dataset.pk.is_some()
            && rationale.is_none()
        {
            return Err(VisibilityError::RationaleRequired(dataset.id.clone()));
        }

        let keys: Vec<CellKey> = self
            .cells
            .keys()
            .filter(|key| &key.layout_uid == layout_uid)
            .cloned()
            .collect();
        for key in keys {
            if let Some(adapter) = self.cells.remove(&key) {
                self.routes.remove(&adapter.subscription().id());
            }
        }
        self.state.unmount_instance(layout_uid);
        self.latch.release(layout_uid);
        self.instances.remove(layout_uid);

        if let Some(position) = dataset_id
            .as_ref()
            .and_then(|id| self.datasets.iter().position(|dataset| &dataset.id == id))
        {
            if self.datasets[position].pk.is_some() {
                let dataset = &mut self.datasets[position];
                dataset.removed = true;
                dataset.rationale = rationale;
            } else {
                self.datasets.remove(position);
            }
        }
        info!(layout_uid = %layout_uid, "layout instance removed");
        Ok(DispatchReport::default())
    }

    /// Brings a removed persisted dataset back as an instance of `layout_id`.
    ///
    /// The dataset keeps `rationale` so that its submission is a restoration.
    /// Like a new instance, its criteria run once its cells report as mounted.
    pub fn restore_instance(
        &mut self,
        layout_id: &LayoutId,
        dataset_id: &DatasetId,
        rationale: String,
    ) -> Result<DispatchReport> {
        if self.closed {
            debug!(dataset = %dataset_id, "restore on closed view dropped");
            return Ok(DispatchReport::dropped());
        }
        let Some(layout) = self
            .store
            .layout(layout_id)
            .filter(|layout| layout.layout_type == LayoutType::Multiple)
        else {
            return Err(VisibilityError::NotMultiple {
                layout: layout_id.clone(),
            });
        };
        let expected_model = layout.dataset_model_id.clone();
        let Some(dataset) = self
            .datasets
            .iter_mut()
            .find(|dataset| &dataset.id == dataset_id && dataset.removed)
        else {
            debug!(dataset = %dataset_id, "restore of unknown or live dataset dropped");
            return Ok(DispatchReport::dropped());
        };
        if expected_model.as_ref() != Some(&dataset.model_id) {
            return Err(VisibilityError::InstanceModelMismatch {
                layout: layout_id.clone(),
                dataset_model: dataset.model_id.clone(),
            });
        }
        if rationale.trim().is_empty() {
            return Err(VisibilityError::RationaleRequired(dataset_id.clone()));
        }
        let uid = LayoutUid::instance(layout_id, dataset_id);
        if self.instances.contains_key(&uid) {
            return Err(VisibilityError::DuplicateInstance(uid));
        }
        dataset.removed = false;
        dataset.rationale = Some(rationale);

        self.mount_instance(layout_id, uid.clone(), Some(dataset_id.clone()))?;
        info!(layout_uid = %uid, "layout instance restored");

        let mut report = DispatchReport::default();
        self.dispatch(&mut report)?;
        Ok(report)
    }

    /// Tears the view down. Subscriptions and latches are released; later
    /// inbound operations are dropped without effect. The final state stays
    /// readable.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.bus.close();
        self.latch.clear();
        self.routes.clear();
        self.closed = true;
        info!(form = %self.form.id, "form view closed");
    }

    /// Evaluates the criteria of a shown source cell against its field's value.
    fn evaluate_source(&self, adapter: &CellAdapter, report: &mut DispatchReport) -> Vec<VisibilityEvent> {
        let key = &adapter.key;
        if self.state.cell_shown(&key.layout_uid, &key.cell_id) != Some(true) {
            debug!(cell = %key.cell_id, layout_uid = %key.layout_uid, "hidden source skipped");
            return Vec::new();
        }
        let Some(slot) = &adapter.field else {
            return Vec::new();
        };
        let Some(entry) = self.store.cell(&adapter.layout_id, &key.cell_id) else {
            return Vec::new();
        };
        let Some(field_model) = &entry.field_model else {
            return Vec::new();
        };
        let value = slot.value(&self.datasets);

        let mut events = Vec::new();
        for resolved in &entry.criteria {
            report.evaluations += 1;
            let verdict = evaluate(&resolved.criterion, field_model, value);
            debug!(
                cell = %key.cell_id,
                layout_uid = %key.layout_uid,
                operator = resolved.criterion.operator.as_str(),
                value = self.config.loggable(value),
                show = verdict.show,
                "criterion evaluated"
            );
            events.extend(
                verdicts(&resolved.targets, verdict)
                    .map(|(target, verdict)| target_event(target, &key.layout_uid, verdict.show)),
            );
        }
        events
    }

    /// Forced hide of every target of a cell's criteria.
    fn cascade_hide(&self, layout_id: &LayoutId, key: &CellKey) -> Vec<VisibilityEvent> {
        self.store
            .criteria_for(layout_id, &key.cell_id)
            .iter()
            .flat_map(|resolved| resolved.targets.iter())
            .map(|target| target_event(target, &key.layout_uid, false))
            .collect()
    }

    /// Drains the bus, applying every delivery to its adapters.
    fn dispatch(&mut self, report: &mut DispatchReport) -> Result<()> {
        while let Some(delivery) = self.bus.next_delivery() {
            report.delivered += 1;
            if report.delivered > self.config.max_cascade_events {
                let dropped = self.bus.clear_pending();
                warn!(
                    limit = self.config.max_cascade_events,
                    dropped,
                    "visibility propagation aborted"
                );
                return Err(VisibilityError::CascadeLimitExceeded {
                    limit: self.config.max_cascade_events,
                });
            }
            if delivery.recipients.is_empty() {
                debug!(event = %delivery.event, "event without subscriber dropped");
                report.stale += 1;
                continue;
            }
            let shown = delivery.event.shown();
            for recipient in delivery.recipients {
                match self.routes.get(&recipient).cloned() {
                    Some(Route::Cell(key)) => self.on_cell_event(&key, shown, report),
                    Some(Route::Layout(layout_id)) => self.on_layout_event(&layout_id, shown, report),
                    None => report.stale += 1,
                }
            }
        }
        Ok(())
    }

    fn on_cell_event(&mut self, key: &CellKey, shown: bool, report: &mut DispatchReport) {
        let Some(adapter) = self.cells.get(key) else {
            report.stale += 1;
            return;
        };
        let Some(transition) = adapter.apply(&mut self.state, shown) else {
            debug!(cell = %key.cell_id, layout_uid = %key.layout_uid, "event for unmounted cell dropped");
            report.stale += 1;
            return;
        };
        adapter.mirror(&mut self.datasets, shown);

        let events = match transition {
            Transition::Unchanged => return,
            Transition::Shown => self.evaluate_source(adapter, report),
            Transition::Hidden => self.cascade_hide(&adapter.layout_id, key),
        };
        debug!(cell = %key.cell_id, layout_uid = %key.layout_uid, shown, "cell visibility changed");
        report.changes.push(VisibilityChange::Cell {
            cell_id: key.cell_id.clone(),
            layout_uid: key.layout_uid.clone(),
            shown,
        });
        for event in events {
            self.bus.publish(event);
        }
    }

    fn on_layout_event(&mut self, layout_id: &LayoutId, shown: bool, report: &mut DispatchReport) {
        let Some(adapter) = self.layouts.get(layout_id) else {
            report.stale += 1;
            return;
        };
        let Some(transition) = adapter.apply(&mut self.state, shown) else {
            report.stale += 1;
            return;
        };
        if transition == Transition::Unchanged {
            return;
        }
        debug!(layout = %layout_id, shown, "layout visibility changed");
        report.changes.push(VisibilityChange::Layout {
            layout_id: layout_id.clone(),
            shown,
        });

        match adapter.layout_type {
            LayoutType::Single => {
                let layout_uid = LayoutUid::single(layout_id);
                for cell_id in self
                    .store
                    .layout(layout_id)
                    .into_iter()
                    .flat_map(|layout| layout.cell_ids())
                {
                    self.bus.publish(VisibilityEvent::Cell {
                        cell_id: cell_id.clone(),
                        layout_uid: layout_uid.clone(),
                        shown,
                    });
                }
            }
            LayoutType::Multiple => {
                let rows: Vec<DatasetId> = self
                    .instances
                    .values()
                    .filter(|instance| &instance.layout_id == layout_id)
                    .filter_map(|instance| instance.dataset_id.clone())
                    .collect();
                for dataset in self
                    .datasets
                    .iter_mut()
                    .filter(|dataset| rows.contains(&dataset.id))
                {
                    dataset.shown = shown;
                }
            }
        }
    }

    pub fn form(&self) -> &FormModel {
        &self.form
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &CriterionStore {
        &self.store
    }

    pub fn state(&self) -> &VisibilityState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_cell_shown(&self, cell_id: &CellId, layout_uid: &LayoutUid) -> Option<bool> {
        self.state.cell_shown(layout_uid, cell_id)
    }

    pub fn is_layout_shown(&self, layout_id: &LayoutId) -> Option<bool> {
        self.state.layout_shown(layout_id)
    }

    /// The field displayed by a cell instance.
    pub fn field(&self, cell_id: &CellId, layout_uid: &LayoutUid) -> Option<&Field> {
        let adapter = self
            .cells
            .get(&CellKey::new(layout_uid.clone(), cell_id.clone()))?;
        let slot = adapter.field.as_ref()?;
        slot.dataset(&self.datasets)?.field(&slot.field_model_id)
    }

    pub fn is_disabled(&self, cell_id: &CellId, layout_uid: &LayoutUid) -> Option<bool> {
        self.cells
            .get(&CellKey::new(layout_uid.clone(), cell_id.clone()))
            .map(|adapter| adapter.disabled(self.config.disabled, &self.datasets))
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn instances(&self) -> impl Iterator<Item = (&LayoutUid, &LayoutInstance)> {
        self.instances.iter()
    }

    pub fn instance(&self, layout_uid: &LayoutUid) -> Option<&LayoutInstance> {
        self.instances.get(layout_uid)
    }

    /// Every mounted cell instance, ordered by layout instance then cell id.
    pub fn cell_snapshots(&self) -> Vec<CellSnapshot> {
        self.cells
            .values()
            .filter_map(|adapter| {
                let key = &adapter.key;
                let shown = self.state.cell_shown(&key.layout_uid, &key.cell_id)?;
                let slot = adapter.field.as_ref();
                Some(CellSnapshot {
                    layout_uid: key.layout_uid.clone(),
                    cell_id: key.cell_id.clone(),
                    shown,
                    field_model_id: slot.map(|slot| slot.field_model_id.clone()),
                    value: slot.and_then(|slot| slot.value(&self.datasets)).map(str::to_string),
                    disabled: adapter.disabled(self.config.disabled, &self.datasets),
                })
            })
            .collect()
    }

    /// The submission the data-access layer would send for the current datasets.
    pub fn submission_plan(&self) -> SubmissionPlan {
        SubmissionPlan::build(&self.datasets)
    }
}

fn target_event(target: &Target, layout_uid: &LayoutUid, shown: bool) -> VisibilityEvent {
    match target {
        Target::Cell(cell_id) => VisibilityEvent::Cell {
            cell_id: cell_id.clone(),
            layout_uid: layout_uid.clone(),
            shown,
        },
        Target::Layout(layout_id) => VisibilityEvent::Layout {
            layout_id: layout_id.clone(),
            shown,
        },
    }
}
