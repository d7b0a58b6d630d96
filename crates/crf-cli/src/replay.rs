//! Replays a script of renderer events against a form view.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crf_model::{CellId, Dataset, FormModel, LayoutId, LayoutUid, SubmissionPlan};
use crf_visibility::{CellSnapshot, DispatchReport, EngineConfig, FormView, Result, VisibilityChange};

use crate::script::ScriptStep;

/// Changes caused by one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub label: String,
    pub changes: Vec<VisibilityChange>,
    pub evaluations: usize,
    pub stale: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutSnapshot {
    pub layout_id: LayoutId,
    pub shown: bool,
}

/// Final state of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub form: String,
    pub steps: Vec<StepOutcome>,
    pub layouts: Vec<LayoutSnapshot>,
    pub cells: Vec<CellSnapshot>,
    pub submission: SubmissionPlan,
    pub closed: bool,
}

impl ReplayOutcome {
    pub fn hidden_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.shown).count()
    }
}

/// Opens a view, mounts every cell of every instance, then applies `steps` in order.
///
/// # Errors
///
/// Propagates the view's errors: missing rights at open, instance misuse and
/// runaway propagation.
pub fn replay(
    form: Arc<FormModel>,
    datasets: Vec<Dataset>,
    steps: &[ScriptStep],
    config: EngineConfig,
) -> Result<ReplayOutcome> {
    let span = info_span!("replay", form = %form.id);
    let _guard = span.enter();

    let mut view = FormView::open(form, datasets, config)?;
    let mut outcomes = Vec::with_capacity(steps.len() + 1);

    let uids: Vec<LayoutUid> = view.instances().map(|(uid, _)| uid.clone()).collect();
    let mut mounted = DispatchReport::default();
    for uid in &uids {
        mounted.merge(mount_instance(&mut view, uid)?);
    }
    outcomes.push(step_outcome("mount".to_string(), mounted));

    for step in steps {
        debug!(step = %step, "replaying step");
        let report = apply(&mut view, step)?;
        outcomes.push(step_outcome(step.to_string(), report));
    }

    let outcome = ReplayOutcome {
        form: view.form().id.clone(),
        steps: outcomes,
        layouts: view
            .state()
            .layouts()
            .map(|(layout_id, shown)| LayoutSnapshot {
                layout_id: layout_id.clone(),
                shown,
            })
            .collect(),
        cells: view.cell_snapshots(),
        submission: view.submission_plan(),
        closed: view.is_closed(),
    };
    info!(
        steps = steps.len(),
        hidden_cells = outcome.hidden_cell_count(),
        "replay finished"
    );
    Ok(outcome)
}

fn apply(view: &mut FormView, step: &ScriptStep) -> Result<DispatchReport> {
    match step {
        ScriptStep::SetValue {
            cell,
            layout_uid,
            value,
        } => view.field_value_changed(cell, layout_uid, value.clone()),
        ScriptStep::ShowInstance { layout_uid } => view.set_instance_visibility(layout_uid, true),
        ScriptStep::HideInstance { layout_uid } => view.set_instance_visibility(layout_uid, false),
        ScriptStep::AddInstance { layout, dataset } => {
            let uid = LayoutUid::instance(layout, &dataset.id);
            let mut report = view.add_instance(layout, dataset.clone())?;
            report.merge(mount_instance(view, &uid)?);
            Ok(report)
        }
        ScriptStep::RemoveInstance {
            layout_uid,
            rationale,
        } => view.remove_instance(layout_uid, rationale.clone()),
        ScriptStep::RestoreInstance {
            layout,
            dataset,
            rationale,
        } => {
            let uid = LayoutUid::instance(layout, dataset);
            let mut report = view.restore_instance(layout, dataset, rationale.clone())?;
            report.merge(mount_instance(view, &uid)?);
            Ok(report)
        }
        ScriptStep::Close => {
            view.close();
            Ok(DispatchReport::default())
        }
    }
}

/// Reports every cell of an instance as mounted, in layout order.
fn mount_instance(view: &mut FormView, uid: &LayoutUid) -> Result<DispatchReport> {
    let cells: Vec<CellId> = view
        .instance(uid)
        .and_then(|instance| view.store().layout(&instance.layout_id))
        .map(|layout| layout.cell_ids().cloned().collect())
        .unwrap_or_default();
    let mut report = DispatchReport::default();
    for cell in &cells {
        report.merge(view.cell_mounted(cell, uid)?);
    }
    // instances without cells never complete through cell mounts
    report.merge(view.all_cells_mounted(uid)?);
    Ok(report)
}

fn step_outcome(label: String, report: DispatchReport) -> StepOutcome {
    StepOutcome {
        label,
        changes: report.changes,
        evaluations: report.evaluations,
        stale: report.stale,
    }
}
