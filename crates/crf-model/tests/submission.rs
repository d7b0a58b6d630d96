//! Tests for building the submission plan from dataset visibility.

use crf_model::{
    Dataset, DatasetId, DatasetModelId, FieldModelId, SubmissionPlan, VISIBILITY_RESET_RATIONALE,
};

fn dataset(id: &str) -> Dataset {
    Dataset::new(DatasetId::new(id).unwrap(), DatasetModelId::new("AE").unwrap())
        .with_value(FieldModelId::new("TERM").unwrap(), "Headache")
        .with_value(FieldModelId::new("SEVERITY").unwrap(), "MILD")
}

#[test]
fn hidden_fields_are_reset_with_rationale() {
    let mut existing = dataset("AE-1").with_pk(10);
    existing.fields[1].shown = false;

    let plan = SubmissionPlan::build([&existing]);

    assert_eq!(plan.updated.len(), 1);
    let fields = &plan.updated[0].fields;
    assert!(!fields[0].reset);
    assert!(fields[1].reset);
    assert_eq!(fields[1].rationale.as_deref(), Some(VISIBILITY_RESET_RATIONALE));
    assert_eq!(fields[1].value.as_deref(), Some("MILD"));
    assert_eq!(plan.reset_count(), 1);
}

#[test]
fn hidden_persisted_datasets_are_removed() {
    let mut hidden = dataset("AE-1").with_pk(10);
    hidden.shown = false;
    let mut hidden_new = dataset("AE-2");
    hidden_new.shown = false;

    let plan = SubmissionPlan::build([&hidden, &hidden_new]);

    assert_eq!(
        plan.removed.get(&10).map(String::as_str),
        Some(VISIBILITY_RESET_RATIONALE)
    );
    // a hidden dataset that was never saved is still created, its fields keep their state
    assert_eq!(plan.created.len(), 1);
    assert!(plan.updated.is_empty());
}

#[test]
fn manual_removal_and_restoration_keep_rationale() {
    let mut removed = dataset("AE-1").with_pk(10);
    removed.removed = true;
    removed.rationale = Some("Entered twice".to_string());
    let mut restored = dataset("AE-2").with_pk(11);
    restored.rationale = Some("Removed by mistake".to_string());
    let mut discarded = dataset("AE-3");
    discarded.removed = true;

    let plan = SubmissionPlan::build([&removed, &restored, &discarded]);

    assert_eq!(plan.removed.get(&10).map(String::as_str), Some("Entered twice"));
    assert_eq!(plan.restored.len(), 1);
    assert_eq!(plan.restored[0].rationale, "Removed by mistake");
    assert_eq!(plan.restored[0].dataset.pk, 11);
    assert!(plan.created.is_empty());
}

#[test]
fn read_only_datasets_are_skipped() {
    let read_only = dataset("AE-1").with_pk(10).with_can_write(false);
    let plan = SubmissionPlan::build([&read_only]);
    assert!(plan.is_empty());
}
