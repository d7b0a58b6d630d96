//! Replay scripts: renderer events read from a JSON file.
//!
//! A script is a JSON array of steps, each tagged by `step`:
//!
//! ```json
//! [
//!   { "step": "set_value", "cell": "C1", "layoutUid": "L1", "value": "YES" },
//!   { "step": "hide_instance", "layoutUid": "AE#R1" },
//!   { "step": "close" }
//! ]
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crf_model::{CellId, Dataset, DatasetId, LayoutId, LayoutUid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ScriptStep {
    /// The user entered a value; `null` clears the field.
    SetValue {
        cell: CellId,
        layout_uid: LayoutUid,
        #[serde(default)]
        value: Option<String>,
    },
    ShowInstance {
        layout_uid: LayoutUid,
    },
    HideInstance {
        layout_uid: LayoutUid,
    },
    /// A repeated row was added; its cells are mounted right away.
    AddInstance {
        layout: LayoutId,
        dataset: Dataset,
    },
    RemoveInstance {
        layout_uid: LayoutUid,
        #[serde(default)]
        rationale: Option<String>,
    },
    /// A removed row is brought back; its cells are mounted right away.
    RestoreInstance {
        layout: LayoutId,
        dataset: DatasetId,
        rationale: String,
    },
    Close,
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::SetValue { cell, layout_uid, .. } => write!(f, "set {cell} in {layout_uid}"),
            ScriptStep::ShowInstance { layout_uid } => write!(f, "show {layout_uid}"),
            ScriptStep::HideInstance { layout_uid } => write!(f, "hide {layout_uid}"),
            ScriptStep::AddInstance { layout, dataset } => write!(f, "add {dataset} to {layout}", dataset = dataset.id),
            ScriptStep::RemoveInstance { layout_uid, .. } => write!(f, "remove {layout_uid}"),
            ScriptStep::RestoreInstance { layout, dataset, .. } => write!(f, "restore {dataset} to {layout}"),
            ScriptStep::Close => f.write_str("close"),
        }
    }
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse script {}", path.display()))
}

pub fn load_datasets(path: &Path) -> Result<Vec<Dataset>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read datasets {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse datasets {}", path.display()))
}
