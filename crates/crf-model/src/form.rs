//! Form model loading and lookups.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::field::FieldModel;
use crate::ids::{CellId, DatasetModelId, FieldModelId, LayoutId};
use crate::layout::{Cell, FieldRef, Layout};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetModel {
    pub id: DatasetModelId,
    #[serde(default)]
    pub field_models: Vec<FieldModel>,
}

impl DatasetModel {
    pub fn field_model(&self, id: &FieldModelId) -> Option<&FieldModel> {
        self.field_models.iter().find(|model| &model.id == id)
    }
}

/// A case report form: the dataset models it edits and its ordered layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModel {
    pub id: String,
    #[serde(default)]
    pub dataset_models: Vec<DatasetModel>,
    #[serde(default)]
    pub layouts: Vec<Layout>,
}

impl FormModel {
    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn from_toml_str(input: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Loads a form model, choosing the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let contents = fs::read_to_string(path).map_err(|source| ModelError::io(path, source))?;
        match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents).map_err(|source| ModelError::Json {
                path: path.to_path_buf(),
                source,
            }),
            Some("toml") => Self::from_toml_str(&contents).map_err(|source| ModelError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ModelError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn layout(&self, id: &LayoutId) -> Option<&Layout> {
        self.layouts.iter().find(|layout| &layout.id == id)
    }

    pub fn dataset_model(&self, id: &DatasetModelId) -> Option<&DatasetModel> {
        self.dataset_models.iter().find(|model| &model.id == id)
    }

    pub fn field_model(&self, field: &FieldRef) -> Option<&FieldModel> {
        self.dataset_model(&field.dataset_model_id)?
            .field_model(&field.field_model_id)
    }

    pub fn cell(&self, layout: &LayoutId, cell: &CellId) -> Option<&Cell> {
        self.layout(layout)?.cell(cell)
    }

    /// Iterates every cell together with the layout containing it.
    pub fn cells(&self) -> impl Iterator<Item = (&Layout, &Cell)> {
        self.layouts
            .iter()
            .flat_map(|layout| layout.cells.iter().map(move |cell| (layout, cell)))
    }
}
