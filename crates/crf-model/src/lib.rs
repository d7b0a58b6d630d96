//! Case report form model for the visibility engine.
//!
//! Forms are made of layouts; layouts are ordered cells; a cell may display a
//! field and may carry visibility criteria that show or hide other cells and
//! layouts depending on that field's value.

pub mod check;
pub mod criterion;
pub mod dataset;
pub mod error;
pub mod field;
pub mod form;
pub mod ids;
pub mod layout;
pub mod submission;

pub use check::{ConfigurationIssue, ConfigurationReport, IssueSeverity, check_form_model};
pub use criterion::{Operator, Target, VisibilityAction, VisibilityCriterion};
pub use dataset::{Dataset, Field};
pub use error::{ModelError, Result};
pub use field::{DataType, FieldModel, FieldModelType, TypedValue};
pub use form::{DatasetModel, FormModel};
pub use ids::{
    CellId, DatasetId, DatasetModelId, FieldModelId, LAYOUT_UID_SEPARATOR, LayoutId, LayoutUid,
};
pub use layout::{Cell, FieldRef, Layout, LayoutType};
pub use submission::{
    DatasetCreation, DatasetRestoration, DatasetUpdate, FieldUpdate, SubmissionPlan,
    VISIBILITY_RESET_RATIONALE,
};
