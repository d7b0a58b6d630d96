//! Static checks of the visibility criteria declared in a form model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::criterion::{Target, VisibilityCriterion};
use crate::form::FormModel;
use crate::ids::LAYOUT_UID_SEPARATOR;
use crate::layout::{Cell, Layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A configuration issue found in a form model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationIssue {
    /// Issue code (e.g., "CRF005").
    pub code: String,
    /// Human-readable message describing the issue.
    pub message: String,
    pub severity: IssueSeverity,
    pub layout: Option<String>,
    pub cell: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationReport {
    #[serde(rename = "form")]
    pub form_id: String,
    pub issues: Vec<ConfigurationIssue>,
}

impl ConfigurationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn push(
        &mut self,
        code: &str,
        severity: IssueSeverity,
        layout: &Layout,
        cell: Option<&Cell>,
        message: String,
    ) {
        self.issues.push(ConfigurationIssue {
            code: code.to_string(),
            message,
            severity,
            layout: Some(layout.id.to_string()),
            cell: cell.map(|cell| cell.id.to_string()),
        });
    }
}

/// Checks layouts, field references and visibility criteria of a form model.
pub fn check_form_model(form: &FormModel) -> ConfigurationReport {
    let mut report = ConfigurationReport {
        form_id: form.id.clone(),
        issues: Vec::new(),
    };

    let mut layout_ids = BTreeSet::new();
    for layout in &form.layouts {
        if !layout_ids.insert(&layout.id) {
            report.push(
                "CRF008",
                IssueSeverity::Error,
                layout,
                None,
                format!("Layout id {} is used more than once", layout.id),
            );
        }
        check_layout(form, layout, &mut report);
    }
    report
}

fn check_layout(form: &FormModel, layout: &Layout, report: &mut ConfigurationReport) {
    if layout.id.as_str().contains(LAYOUT_UID_SEPARATOR) {
        report.push(
            "CRF011",
            IssueSeverity::Error,
            layout,
            None,
            format!(
                "Layout id {} contains the instance separator '{LAYOUT_UID_SEPARATOR}'",
                layout.id
            ),
        );
    }
    if layout.is_multiple() && layout.dataset_model_id.is_none() {
        report.push(
            "CRF010",
            IssueSeverity::Error,
            layout,
            None,
            format!("Multiple layout {} does not reference a dataset model", layout.id),
        );
    }

    let mut cell_ids = BTreeSet::new();
    for cell in &layout.cells {
        if !cell_ids.insert(&cell.id) {
            report.push(
                "CRF008",
                IssueSeverity::Error,
                layout,
                Some(cell),
                format!("Cell id {} is used more than once in layout {}", cell.id, layout.id),
            );
        }
        check_cell_field(form, layout, cell, report);
        for criterion in &cell.visibility_criteria {
            check_criterion(form, layout, cell, criterion, report);
        }
    }
}

fn check_cell_field(form: &FormModel, layout: &Layout, cell: &Cell, report: &mut ConfigurationReport) {
    let Some(field) = &cell.field else {
        return;
    };
    if form.field_model(field).is_none() {
        report.push(
            "CRF009",
            IssueSeverity::Error,
            layout,
            Some(cell),
            format!(
                "Cell {} references unknown field model {}.{}",
                cell.id, field.dataset_model_id, field.field_model_id
            ),
        );
    }
    if let Some(dataset_model_id) = layout.dataset_model_id.as_ref().filter(|_| layout.is_multiple())
        && dataset_model_id != &field.dataset_model_id
    {
        report.push(
            "CRF010",
            IssueSeverity::Error,
            layout,
            Some(cell),
            format!(
                "Cell {} of multiple layout {} displays dataset model {} instead of {}",
                cell.id, layout.id, field.dataset_model_id, dataset_model_id
            ),
        );
    }
}

fn check_criterion(
    form: &FormModel,
    layout: &Layout,
    cell: &Cell,
    criterion: &VisibilityCriterion,
    report: &mut ConfigurationReport,
) {
    let field_model = cell.field.as_ref().and_then(|field| form.field_model(field));
    if cell.field.is_none() {
        report.push(
            "CRF001",
            IssueSeverity::Error,
            layout,
            Some(cell),
            format!(
                "Visibility criterion on cell {} cannot be evaluated because the cell has no field",
                cell.id
            ),
        );
    }

    if criterion.values.is_empty() && !criterion.operator.is_presence() {
        report.push(
            "CRF002",
            IssueSeverity::Error,
            layout,
            Some(cell),
            format!("Visibility criterion on cell {} does not have any value", cell.id),
        );
    }

    if criterion.targets.is_empty() {
        report.push(
            "CRF003",
            IssueSeverity::Warning,
            layout,
            Some(cell),
            format!(
                "Visibility criterion on cell {} does not have any cell or layout target",
                cell.id
            ),
        );
    }

    if let Some(allowed) = field_model.and_then(|model| model.allowed_values()) {
        for value in &criterion.values {
            if !allowed.contains(&value.as_str()) {
                report.push(
                    "CRF004",
                    IssueSeverity::Error,
                    layout,
                    Some(cell),
                    format!(
                        "Visibility criterion on cell {} contains value {} which is not a possible value of field model {}",
                        cell.id,
                        value,
                        field_model.map(|model| model.id.as_str()).unwrap_or_default()
                    ),
                );
            }
        }
    }

    for target in &criterion.targets {
        match target {
            Target::Layout(id) if form.layout(id).is_none() => report.push(
                "CRF005",
                IssueSeverity::Error,
                layout,
                Some(cell),
                format!(
                    "Visibility criterion on cell {} contains layout target {} which does not match any layout of form {}",
                    cell.id, id, form.id
                ),
            ),
            Target::Cell(id) if id == &cell.id => report.push(
                "CRF007",
                IssueSeverity::Error,
                layout,
                Some(cell),
                format!("Visibility criterion on cell {} targets its own cell", cell.id),
            ),
            Target::Cell(id) if !layout.contains_cell(id) => report.push(
                "CRF006",
                IssueSeverity::Error,
                layout,
                Some(cell),
                format!(
                    "Visibility criterion on cell {} contains cell target {} which does not match any cell of layout {}",
                    cell.id, id, layout.id
                ),
            ),
            _ => {}
        }
    }
}
