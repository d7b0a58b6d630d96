#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// Declares a trimmed, non-empty string identifier.
///
/// Identifiers deserialize through [`TryFrom<String>`] so a blank id in a
/// form model is rejected at load time instead of surfacing as a missing
/// target during propagation.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ModelError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a cell, unique within its layout.
    CellId,
    "cell"
);
string_id!(
    /// Identifier of a layout, unique within its form model.
    LayoutId,
    "layout"
);
string_id!(DatasetModelId, "dataset model");
string_id!(FieldModelId, "field model");
string_id!(
    /// Runtime identifier of a dataset instance.
    DatasetId,
    "dataset"
);

/// Joins a MULTIPLE layout id and a dataset id in an instance uid.
pub const LAYOUT_UID_SEPARATOR: char = '#';

/// Identifier of one rendered instance of a layout.
///
/// A SINGLE layout has exactly one instance whose uid is the layout id. Each
/// instance of a MULTIPLE layout is keyed by the dataset backing it, rendered
/// as `<layout>#<dataset>`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct LayoutUid(String);

impl LayoutUid {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidId {
                kind: "layout instance",
                value,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn single(layout: &LayoutId) -> Self {
        Self(layout.as_str().to_string())
    }

    pub fn instance(layout: &LayoutId, dataset: &DatasetId) -> Self {
        Self(format!("{layout}{LAYOUT_UID_SEPARATOR}{dataset}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LayoutUid {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LayoutUid {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LayoutUid> for String {
    fn from(value: LayoutUid) -> Self {
        value.0
    }
}

impl fmt::Display for LayoutUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed() {
        let id = CellId::new("  C1 ").unwrap();
        assert_eq!(id.as_str(), "C1");
    }

    #[test]
    fn blank_ids_are_rejected() {
        let err = LayoutId::new("   ").unwrap_err();
        assert!(matches!(err, ModelError::InvalidId { kind: "layout", .. }));
    }

    #[test]
    fn instance_uid_joins_layout_and_dataset() {
        let layout = LayoutId::new("ADVERSE_EVENTS").unwrap();
        let dataset = DatasetId::new("AE-3").unwrap();
        assert_eq!(
            LayoutUid::instance(&layout, &dataset).as_str(),
            "ADVERSE_EVENTS#AE-3"
        );
        assert_eq!(LayoutUid::single(&layout).as_str(), "ADVERSE_EVENTS");
    }

    #[test]
    fn ids_reject_blank_values_when_deserializing() {
        let result: Result<CellId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let id: CellId = serde_json::from_str("\"SEX\"").unwrap();
        assert_eq!(id.to_string(), "SEX");
    }
}
