//! Error types for the visibility engine.
//!
//! Only conditions that prevent a form view from working are errors. Targets
//! missing from the form model and events addressed to unmounted cells are
//! resolved locally (logged and ignored, or dropped) and never surface here.

use std::path::PathBuf;

use thiserror::Error;

use crf_model::{DatasetId, DatasetModelId, LayoutId, LayoutUid, ModelError};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VisibilityError {
    /// The user has no dataset for a dataset model displayed by the form.
    #[error("Missing rights to access dataset {dataset_model} (due to a misconfiguration)")]
    MissingRights {
        /// Dataset model the form needs.
        dataset_model: DatasetModelId,
    },

    /// A dispatch produced more events than the configured limit.
    #[error("Visibility propagation exceeded {limit} events")]
    CascadeLimitExceeded {
        /// Configured `max_cascade_events`.
        limit: usize,
    },

    /// An instance operation addressed a layout that is not MULTIPLE.
    #[error("Layout {layout} is not a multiple layout")]
    NotMultiple {
        /// Addressed layout.
        layout: LayoutId,
    },

    /// A dataset given as a new instance does not belong to the layout's dataset model.
    #[error("Dataset model {dataset_model} does not match layout {layout}")]
    InstanceModelMismatch {
        /// Addressed layout.
        layout: LayoutId,
        /// Model of the rejected dataset.
        dataset_model: DatasetModelId,
    },

    /// An instance with the same layout uid is already mounted.
    #[error("Layout instance {0} is already mounted")]
    DuplicateInstance(LayoutUid),

    /// Removing or restoring a persisted dataset needs a rationale.
    #[error("A rationale is required to remove or restore dataset {0}")]
    RationaleRequired(DatasetId),

    #[error("failed to read engine configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Result type alias for visibility operations.
pub type Result<T> = std::result::Result<T, VisibilityError>;
