//! Criterion store: the criteria of every source cell, resolved once per form.

use std::collections::BTreeMap;

use tracing::warn;

use crf_model::{
    CellId, DatasetModelId, FieldModel, FieldRef, FormModel, Layout, LayoutId, LayoutType, Target,
    VisibilityCriterion,
};

/// A criterion whose targets all exist in the form model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCriterion {
    pub criterion: VisibilityCriterion,
    /// Targets kept after dropping unknown ids and self references.
    pub targets: Vec<Target>,
}

/// A cell as the engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEntry {
    pub id: CellId,
    pub field: Option<FieldRef>,
    /// Field model of `field`; `None` when the cell has no field or the model is unknown.
    pub field_model: Option<FieldModel>,
    pub criteria: Vec<ResolvedCriterion>,
}

impl CellEntry {
    /// Only a cell bound to a known field model can evaluate criteria.
    pub fn is_source(&self) -> bool {
        self.field_model.is_some() && !self.criteria.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub id: LayoutId,
    pub layout_type: LayoutType,
    pub dataset_model_id: Option<DatasetModelId>,
    /// Cells in layout order.
    pub cells: Vec<CellEntry>,
}

impl LayoutEntry {
    pub fn cell(&self, id: &CellId) -> Option<&CellEntry> {
        self.cells.iter().find(|cell| &cell.id == id)
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = &CellId> {
        self.cells.iter().map(|cell| &cell.id)
    }

    /// Criteria of this layout's cells, paired with their source cell.
    pub fn criteria(&self) -> impl Iterator<Item = (&CellId, &ResolvedCriterion)> {
        self.cells
            .iter()
            .flat_map(|cell| cell.criteria.iter().map(move |criterion| (&cell.id, criterion)))
    }
}

/// Read-only index of layouts, cells and criteria built when a form is opened.
#[derive(Debug, Clone, Default)]
pub struct CriterionStore {
    layouts: BTreeMap<LayoutId, LayoutEntry>,
    order: Vec<LayoutId>,
}

impl CriterionStore {
    /// Indexes `form`. Targets that do not exist are logged and dropped.
    pub fn build(form: &FormModel) -> Self {
        let mut store = Self::default();
        for layout in &form.layouts {
            if store.layouts.contains_key(&layout.id) {
                warn!(layout = %layout.id, "duplicate layout id ignored");
                continue;
            }
            let cells = layout
                .cells
                .iter()
                .map(|cell| {
                    let field_model = cell.field.as_ref().and_then(|field| {
                        let model = form.field_model(field);
                        if model.is_none() {
                            warn!(
                                layout = %layout.id,
                                cell = %cell.id,
                                dataset_model = %field.dataset_model_id,
                                field_model = %field.field_model_id,
                                "cell references an unknown field model"
                            );
                        }
                        model.cloned()
                    });
                    let criteria = cell
                        .visibility_criteria
                        .iter()
                        .map(|criterion| ResolvedCriterion {
                            criterion: criterion.clone(),
                            targets: criterion
                                .targets
                                .iter()
                                .filter(|target| resolve_target(form, layout, &cell.id, target))
                                .cloned()
                                .collect(),
                        })
                        .collect();
                    CellEntry {
                        id: cell.id.clone(),
                        field: cell.field.clone(),
                        field_model,
                        criteria,
                    }
                })
                .collect();
            let entry = LayoutEntry {
                id: layout.id.clone(),
                layout_type: layout.layout_type,
                dataset_model_id: layout.dataset_model_id.clone(),
                cells,
            };
            store.order.push(layout.id.clone());
            store.layouts.insert(layout.id.clone(), entry);
        }
        store
    }

    pub fn layout(&self, id: &LayoutId) -> Option<&LayoutEntry> {
        self.layouts.get(id)
    }

    /// Layouts in form order.
    pub fn layouts(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.order.iter().filter_map(|id| self.layouts.get(id))
    }

    pub fn cell(&self, layout: &LayoutId, cell: &CellId) -> Option<&CellEntry> {
        self.layouts.get(layout)?.cell(cell)
    }

    /// Criteria for which the cell is the source; empty for unknown cells.
    pub fn criteria_for(&self, layout: &LayoutId, cell: &CellId) -> &[ResolvedCriterion] {
        self.cell(layout, cell)
            .map(|entry| entry.criteria.as_slice())
            .unwrap_or(&[])
    }

    pub fn criterion_count(&self) -> usize {
        self.layouts
            .values()
            .map(|layout| layout.criteria().count())
            .sum()
    }
}

fn resolve_target(form: &FormModel, layout: &Layout, source: &CellId, target: &Target) -> bool {
    match target {
        Target::Cell(id) if id == source => {
            warn!(layout = %layout.id, cell = %source, "criterion targeting its own cell ignored");
            false
        }
        Target::Cell(id) if !layout.contains_cell(id) => {
            warn!(
                layout = %layout.id,
                cell = %source,
                target = %id,
                "criterion target cell not found in layout; target ignored"
            );
            false
        }
        Target::Layout(id) if form.layout(id).is_none() => {
            warn!(
                layout = %layout.id,
                cell = %source,
                target = %id,
                "criterion target layout not found in form; target ignored"
            );
            false
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crf_model::{Cell, DatasetModel, FieldModelId, FieldModelType};

    fn form() -> FormModel {
        let dm = DatasetModelId::new("DM").unwrap();
        let smoker = FieldModelId::new("SMOKER").unwrap();
        FormModel {
            id: "FORM".to_string(),
            dataset_models: vec![DatasetModel {
                id: dm.clone(),
                field_models: vec![FieldModel::new(smoker.clone(), FieldModelType::Radio)],
            }],
            layouts: vec![
                Layout::single(LayoutId::new("L1").unwrap())
                    .with_cell(
                        Cell::new(CellId::new("SMOKER").unwrap())
                            .with_field(dm, smoker)
                            .with_criterion(
                                VisibilityCriterion::equals(["YES"])
                                    .targeting(Target::Cell(CellId::new("PACKS").unwrap()))
                                    .targeting(Target::Cell(CellId::new("SMOKER").unwrap()))
                                    .targeting(Target::Cell(CellId::new("GHOST").unwrap()))
                                    .targeting(Target::Layout(LayoutId::new("L2").unwrap()))
                                    .targeting(Target::Layout(LayoutId::new("L9").unwrap())),
                            ),
                    )
                    .with_cell(Cell::new(CellId::new("PACKS").unwrap())),
                Layout::single(LayoutId::new("L2").unwrap()),
            ],
        }
    }

    #[test]
    fn unknown_and_self_targets_are_dropped() {
        let store = CriterionStore::build(&form());
        let criteria = store.criteria_for(
            &LayoutId::new("L1").unwrap(),
            &CellId::new("SMOKER").unwrap(),
        );
        assert_eq!(criteria.len(), 1);
        assert_eq!(
            criteria[0].targets,
            vec![
                Target::Cell(CellId::new("PACKS").unwrap()),
                Target::Layout(LayoutId::new("L2").unwrap()),
            ]
        );
        assert_eq!(criteria[0].criterion.targets.len(), 5);
    }

    #[test]
    fn layouts_keep_form_order() {
        let store = CriterionStore::build(&form());
        let ids: Vec<_> = store.layouts().map(|layout| layout.id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "L2"]);
        assert_eq!(store.criterion_count(), 1);
        assert!(
            store
                .cell(&LayoutId::new("L1").unwrap(), &CellId::new("SMOKER").unwrap())
                .unwrap()
                .is_source()
        );
    }
}
