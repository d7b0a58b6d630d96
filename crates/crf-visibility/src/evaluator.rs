//! Criteria evaluation.
//!
//! Evaluation is a pure function of a criterion, the source field model and
//! the source field's current value. It never reads visibility state.

use std::cmp::Ordering;

use crf_model::{FieldModel, Operator, Target, TypedValue, VisibilityAction, VisibilityCriterion};

/// Outcome of evaluating one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub show: bool,
}

impl Verdict {
    pub const SHOW: Verdict = Verdict { show: true };
    pub const HIDE: Verdict = Verdict { show: false };
}

/// Evaluates `criterion` against the current value of its source field.
///
/// The predicate result is XORed with `reverse`; a HIDE action inverts the
/// outcome once more.
pub fn evaluate(criterion: &VisibilityCriterion, field_model: &FieldModel, value: Option<&str>) -> Verdict {
    let satisfied = matches(criterion, field_model, value) != criterion.reverse;
    let show = match criterion.action {
        VisibilityAction::Show => satisfied,
        VisibilityAction::Hide => !satisfied,
    };
    Verdict { show }
}

/// Whether the criterion predicate matches the value.
///
/// An empty or untypeable value matches nothing except [`Operator::Blank`].
/// For multi-valued fields the predicate matches when any selected value
/// matches any criterion value.
pub fn matches(criterion: &VisibilityCriterion, field_model: &FieldModel, value: Option<&str>) -> bool {
    let actual = field_model.parse_value(value);
    match criterion.operator {
        Operator::Blank => actual.is_empty(),
        Operator::NotBlank => !actual.is_empty(),
        operator => {
            let expected: Vec<TypedValue> = criterion
                .values
                .iter()
                .filter_map(|value| field_model.type_value(value))
                .collect();
            expected
                .iter()
                .any(|expected| actual.iter().any(|actual| test(operator, actual, expected)))
        }
    }
}

/// Applies a value operator to one field value and one criterion value.
pub fn test(operator: Operator, actual: &TypedValue, expected: &TypedValue) -> bool {
    let ordering = actual.compare(expected);
    match operator {
        Operator::Equals => ordering == Some(Ordering::Equal),
        Operator::NotEquals => ordering != Some(Ordering::Equal),
        Operator::Contains => contains(actual, expected),
        Operator::NotContains => !contains(actual, expected),
        Operator::Greater => ordering == Some(Ordering::Greater),
        Operator::GreaterEquals => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lower => ordering == Some(Ordering::Less),
        Operator::LowerEquals => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        // presence is decided before values are compared
        Operator::Blank | Operator::NotBlank => false,
    }
}

fn contains(actual: &TypedValue, expected: &TypedValue) -> bool {
    match (actual, expected) {
        (TypedValue::Text(actual), TypedValue::Text(expected)) => actual.contains(expected.as_str()),
        _ => actual.compare(expected) == Some(Ordering::Equal),
    }
}

/// Pairs every target with the verdict to deliver to it.
pub fn verdicts(targets: &[Target], verdict: Verdict) -> impl Iterator<Item = (&Target, Verdict)> {
    targets.iter().map(move |target| (target, verdict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crf_model::{DataType, FieldModelId, FieldModelType};

    fn field(field_type: FieldModelType) -> FieldModel {
        FieldModel::new(FieldModelId::new("F1").unwrap(), field_type)
    }

    #[test]
    fn equals_shows_on_match_and_hides_otherwise() {
        let criterion = VisibilityCriterion::equals(["YES"]);
        let model = field(FieldModelType::Radio);
        assert_eq!(evaluate(&criterion, &model, Some("YES")), Verdict::SHOW);
        assert_eq!(evaluate(&criterion, &model, Some("NO")), Verdict::HIDE);
        assert_eq!(evaluate(&criterion, &model, None), Verdict::HIDE);
    }

    #[test]
    fn reverse_inverts_the_outcome() {
        let criterion = VisibilityCriterion::equals(["YES"]).reversed(true);
        let model = field(FieldModelType::Radio);
        assert_eq!(evaluate(&criterion, &model, Some("YES")), Verdict::HIDE);
        assert_eq!(evaluate(&criterion, &model, Some("NO")), Verdict::SHOW);
    }

    #[test]
    fn hide_action_inverts_the_outcome() {
        let criterion = VisibilityCriterion::equals(["YES"]).with_action(VisibilityAction::Hide);
        let model = field(FieldModelType::Radio);
        assert_eq!(evaluate(&criterion, &model, Some("YES")), Verdict::HIDE);
        assert_eq!(evaluate(&criterion, &model, Some("NO")), Verdict::SHOW);
    }

    #[test]
    fn numbers_compare_numerically() {
        let criterion = VisibilityCriterion::equals(["18"]).with_operator(Operator::GreaterEquals);
        let model = field(FieldModelType::Number);
        assert!(matches(&criterion, &model, Some("18")));
        assert!(matches(&criterion, &model, Some("100")));
        assert!(!matches(&criterion, &model, Some("9")));
        assert!(!matches(&criterion, &model, Some("abc")));
    }

    #[test]
    fn text_compares_lexically_when_untyped() {
        let criterion = VisibilityCriterion::equals(["9"]).with_operator(Operator::Lower);
        let model = field(FieldModelType::String);
        assert!(matches(&criterion, &model, Some("10")));
        assert!(matches(&criterion, &model.with_data_type(DataType::String), Some("10")));
    }

    #[test]
    fn not_equals_treats_empty_as_non_matching() {
        let criterion = VisibilityCriterion::equals(["NO"]).with_operator(Operator::NotEquals);
        let model = field(FieldModelType::Radio);
        assert!(matches(&criterion, &model, Some("YES")));
        assert!(!matches(&criterion, &model, Some("NO")));
        assert!(!matches(&criterion, &model, Some("")));
        assert!(!matches(&criterion, &model, None));
    }

    #[test]
    fn presence_operators_distinguish_empty_values() {
        let blank = VisibilityCriterion::default().with_operator(Operator::Blank);
        let not_blank = VisibilityCriterion::default().with_operator(Operator::NotBlank);
        let model = field(FieldModelType::Textarea);
        assert!(matches(&blank, &model, None));
        assert!(matches(&blank, &model, Some("   ")));
        assert!(!matches(&blank, &model, Some("note")));
        assert!(matches(&not_blank, &model, Some("note")));
        assert!(!matches(&not_blank, &model, None));
    }

    #[test]
    fn checkbox_group_matches_any_selected_value() {
        let criterion = VisibilityCriterion::equals(["NAUSEA", "FEVER"]);
        let model = field(FieldModelType::CheckboxGroup);
        assert!(matches(&criterion, &model, Some("HEADACHE,FEVER")));
        assert!(!matches(&criterion, &model, Some("HEADACHE,RASH")));
    }

    #[test]
    fn checkbox_compares_booleans() {
        let criterion = VisibilityCriterion::equals(["true"]);
        let model = field(FieldModelType::Checkbox);
        assert!(matches(&criterion, &model, Some("true")));
        assert!(!matches(&criterion, &model, Some("false")));
    }

    #[test]
    fn contains_searches_text() {
        let criterion = VisibilityCriterion::equals(["pain"]).with_operator(Operator::Contains);
        let model = field(FieldModelType::Textarea);
        assert!(matches(&criterion, &model, Some("chest pain at rest")));
        let negated = criterion.clone().with_operator(Operator::NotContains);
        assert!(matches(&negated, &model, Some("dizziness")));
    }

    #[test]
    fn dates_compare_chronologically() {
        let criterion =
            VisibilityCriterion::equals(["2024-01-01"]).with_operator(Operator::Lower);
        let model = field(FieldModelType::Date);
        assert!(matches(&criterion, &model, Some("2023-12-31")));
        assert!(!matches(&criterion, &model, Some("2024-01-02")));
    }

    #[test]
    fn dotted_dates_match_their_own_value() {
        let model = field(FieldModelType::Date);
        let criterion = VisibilityCriterion::equals(["31.01.2024"]);
        assert_eq!(evaluate(&criterion, &model, Some("31.01.2024")), Verdict::SHOW);
        assert_eq!(evaluate(&criterion, &model, Some("01.02.2024")), Verdict::HIDE);
    }

    #[test]
    fn dates_with_time_compare_to_the_minute() {
        let model = field(FieldModelType::Date);
        let equals = VisibilityCriterion::equals(["31.01.2024 10:30"]);
        assert_eq!(evaluate(&equals, &model, Some("31.01.2024 10:30")), Verdict::SHOW);
        assert_eq!(evaluate(&equals, &model, Some("31.01.2024 10:31")), Verdict::HIDE);

        let after_noon = VisibilityCriterion::equals(["31.01.2024 12:00"]).with_operator(Operator::Greater);
        assert!(matches(&after_noon, &model, Some("31.01.2024 14:05")));
    }
}
