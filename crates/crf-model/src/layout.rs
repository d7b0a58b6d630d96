use serde::{Deserialize, Serialize};

use crate::criterion::VisibilityCriterion;
use crate::ids::{CellId, DatasetModelId, FieldModelId, LayoutId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutType {
    /// Rendered exactly once.
    #[default]
    Single,
    /// Rendered once per dataset of the layout's dataset model.
    Multiple,
}

/// Reference from a cell to the field it displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub dataset_model_id: DatasetModelId,
    pub field_model_id: FieldModelId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: CellId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visibility_criteria: Vec<VisibilityCriterion>,
}

impl Cell {
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            field: None,
            visibility_criteria: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, dataset_model_id: DatasetModelId, field_model_id: FieldModelId) -> Self {
        self.field = Some(FieldRef {
            dataset_model_id,
            field_model_id,
        });
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: VisibilityCriterion) -> Self {
        self.visibility_criteria.push(criterion);
        self
    }

    pub fn has_field(&self) -> bool {
        self.field.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: LayoutId,
    #[serde(rename = "type", default)]
    pub layout_type: LayoutType,
    /// Dataset model whose datasets form the instances of a MULTIPLE layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_model_id: Option<DatasetModelId>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Layout {
    pub fn single(id: LayoutId) -> Self {
        Self {
            id,
            layout_type: LayoutType::Single,
            dataset_model_id: None,
            cells: Vec::new(),
        }
    }

    pub fn multiple(id: LayoutId, dataset_model_id: DatasetModelId) -> Self {
        Self {
            id,
            layout_type: LayoutType::Multiple,
            dataset_model_id: Some(dataset_model_id),
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|cell| &cell.id == id)
    }

    pub fn contains_cell(&self, id: &CellId) -> bool {
        self.cell(id).is_some()
    }

    pub fn is_multiple(&self) -> bool {
        self.layout_type == LayoutType::Multiple
    }
}
