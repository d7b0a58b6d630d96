//! Visibility criteria propagation for case report forms.
//!
//! A [`FormView`] is opened over a [`crf_model::FormModel`] and the user's
//! datasets. Field value changes, cell mounts and repeating-container actions
//! go in; ordered cell and layout visibility changes come out.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crf_model::{CellId, FormModel, LayoutUid};
//! use crf_visibility::{EngineConfig, FormView};
//!
//! # fn run(form: FormModel, datasets: Vec<crf_model::Dataset>) -> crf_visibility::Result<()> {
//! let mut view = FormView::open(Arc::new(form), datasets, EngineConfig::default())?;
//! let uid = LayoutUid::new("L1")?;
//! view.all_cells_mounted(&uid)?;
//! let report = view.field_value_changed(&CellId::new("C1")?, &uid, Some("YES".into()))?;
//! for change in &report.changes {
//!     println!("{change:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod bus;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod latch;
pub mod state;
pub mod store;
pub mod view;

pub use adapter::{CellAdapter, CellKey, FieldSlot, LayoutAdapter};
pub use bus::{Delivery, EventBus, EventFilter, Subscription, SubscriptionId, VisibilityEvent};
pub use config::{EngineConfig, REDACTED_VALUE};
pub use error::{Result, VisibilityError};
pub use evaluator::{Verdict, evaluate};
pub use latch::{CellLoadingLatch, LatchStatus};
pub use state::{Transition, VisibilityState};
pub use store::{CellEntry, CriterionStore, LayoutEntry, ResolvedCriterion};
pub use view::{CellSnapshot, DispatchReport, FormView, LayoutInstance, VisibilityChange};
