//! Submission payload derived from the visibility outcome of a form.
//!
//! Hidden fields are reset and hidden repeated datasets are removed so that
//! values entered before a criterion hid them are not kept silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::ids::{DatasetId, DatasetModelId, FieldModelId};

/// Rationale attached to fields and datasets reset because they were hidden.
pub const VISIBILITY_RESET_RATIONALE: &str = "Reset by a visibility criterion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub model_id: FieldModelId,
    pub value: Option<String>,
    #[serde(default)]
    pub reset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetUpdate {
    pub pk: i64,
    pub fields: Vec<FieldUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetCreation {
    pub id: DatasetId,
    pub model_id: DatasetModelId,
    pub fields: Vec<FieldUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRestoration {
    pub rationale: String,
    pub dataset: DatasetUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPlan {
    pub updated: Vec<DatasetUpdate>,
    pub created: Vec<DatasetCreation>,
    /// Removed datasets keyed by persisted key, with the removal rationale.
    pub removed: BTreeMap<i64, String>,
    pub restored: Vec<DatasetRestoration>,
}

impl SubmissionPlan {
    /// Builds the plan from the final state of every dataset of a form.
    ///
    /// Read-only datasets are skipped. The visibility of a dataset is only
    /// considered here because it may toggle many times before submission.
    pub fn build<'a>(datasets: impl IntoIterator<Item = &'a Dataset>) -> Self {
        let mut plan = Self::default();
        for dataset in datasets.into_iter().filter(|dataset| dataset.can_write) {
            let hidden_existing = !dataset.shown && dataset.pk.is_some();
            if dataset.removed || hidden_existing {
                // never persisted: nothing to remove
                if let Some(pk) = dataset.pk {
                    let rationale = if hidden_existing && !dataset.removed {
                        VISIBILITY_RESET_RATIONALE.to_string()
                    } else {
                        dataset.rationale.clone().unwrap_or_default()
                    };
                    plan.removed.insert(pk, rationale);
                }
                continue;
            }

            let fields = field_updates(dataset);
            match (dataset.pk, &dataset.rationale) {
                (None, _) => plan.created.push(DatasetCreation {
                    id: dataset.id.clone(),
                    model_id: dataset.model_id.clone(),
                    fields,
                }),
                (Some(pk), Some(rationale)) => plan.restored.push(DatasetRestoration {
                    rationale: rationale.clone(),
                    dataset: DatasetUpdate { pk, fields },
                }),
                (Some(pk), None) => plan.updated.push(DatasetUpdate { pk, fields }),
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
            && self.created.is_empty()
            && self.removed.is_empty()
            && self.restored.is_empty()
    }

    /// Number of fields flagged for reset across created, updated and restored datasets.
    pub fn reset_count(&self) -> usize {
        let updated = self.updated.iter().flat_map(|update| &update.fields);
        let created = self.created.iter().flat_map(|creation| &creation.fields);
        let restored = self
            .restored
            .iter()
            .flat_map(|restoration| &restoration.dataset.fields);
        updated
            .chain(created)
            .chain(restored)
            .filter(|field| field.reset)
            .count()
    }
}

fn field_updates(dataset: &Dataset) -> Vec<FieldUpdate> {
    dataset
        .fields
        .iter()
        .map(|field| FieldUpdate {
            model_id: field.model_id.clone(),
            value: field.value.clone(),
            reset: !field.shown,
            rationale: (!field.shown).then(|| VISIBILITY_RESET_RATIONALE.to_string()),
        })
        .collect()
}
