//! Runtime datasets holding field values.

use serde::{Deserialize, Serialize};

use crate::ids::{DatasetId, DatasetModelId, FieldModelId};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub model_id: FieldModelId,
    /// Raw value as entered; checkbox groups store a comma-separated list.
    #[serde(default)]
    pub value: Option<String>,
    /// Mirrors the visibility of the cell displaying the field.
    #[serde(default = "default_true")]
    pub shown: bool,
}

impl Field {
    pub fn new(model_id: FieldModelId) -> Self {
        Self {
            model_id,
            value: None,
            shown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    /// Persisted key; `None` until the dataset has been submitted once.
    #[serde(default)]
    pub pk: Option<i64>,
    pub model_id: DatasetModelId,
    #[serde(default = "default_true")]
    pub can_write: bool,
    #[serde(default = "default_true")]
    pub shown: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Dataset {
    pub fn new(id: DatasetId, model_id: DatasetModelId) -> Self {
        Self {
            id,
            pk: None,
            model_id,
            can_write: true,
            shown: true,
            removed: false,
            rationale: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pk(mut self, pk: i64) -> Self {
        self.pk = Some(pk);
        self
    }

    #[must_use]
    pub fn with_can_write(mut self, can_write: bool) -> Self {
        self.can_write = can_write;
        self
    }

    #[must_use]
    pub fn with_value(mut self, model_id: FieldModelId, value: impl Into<String>) -> Self {
        self.field_or_insert(&model_id).value = Some(value.into());
        self
    }

    pub fn field(&self, model_id: &FieldModelId) -> Option<&Field> {
        self.fields.iter().find(|field| &field.model_id == model_id)
    }

    pub fn field_mut(&mut self, model_id: &FieldModelId) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| &field.model_id == model_id)
    }

    /// Returns the field for `model_id`, appending an empty one when missing.
    pub fn field_or_insert(&mut self, model_id: &FieldModelId) -> &mut Field {
        let index = match self.fields.iter().position(|field| &field.model_id == model_id) {
            Some(index) => index,
            None => {
                self.fields.push(Field::new(model_id.clone()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id<T: TryFrom<&'static str>>(value: &'static str) -> T
    where
        T::Error: std::fmt::Debug,
    {
        T::try_from(value).unwrap()
    }

    #[test]
    fn field_or_insert_appends_missing_fields() {
        let mut dataset = Dataset::new(id("D"), id("DM"));
        dataset.field_or_insert(&id("SEX")).value = Some("F".to_string());
        dataset.field_or_insert(&id("SEX"));
        assert_eq!(dataset.fields.len(), 1);
        assert_eq!(dataset.field(&id("SEX")).unwrap().value.as_deref(), Some("F"));
    }

    #[test]
    fn missing_flags_default_to_writable_and_shown() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"id": "D1", "modelId": "DM", "fields": [{"modelId": "SEX", "value": "M"}]}"#,
        )
        .unwrap();
        assert!(dataset.can_write);
        assert!(dataset.shown);
        assert!(dataset.fields[0].shown);
        assert_eq!(dataset.pk, None);
    }
}
