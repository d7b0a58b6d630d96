//! Visibility criteria attached to source cells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::ids::{CellId, LayoutId};

/// Comparison applied between a field value and the criterion values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    /// Implied when a criterion does not name an operator.
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Greater,
    GreaterEquals,
    Lower,
    LowerEquals,
    /// Matches when the field has no value.
    Blank,
    /// Matches when the field has a value.
    NotBlank,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::Greater,
        Operator::GreaterEquals,
        Operator::Lower,
        Operator::LowerEquals,
        Operator::Blank,
        Operator::NotBlank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::Greater => "GREATER",
            Operator::GreaterEquals => "GREATER_EQUALS",
            Operator::Lower => "LOWER",
            Operator::LowerEquals => "LOWER_EQUALS",
            Operator::Blank => "BLANK",
            Operator::NotBlank => "NOT_BLANK",
        }
    }

    /// Presence operators test whether a value exists and ignore criterion values.
    pub fn is_presence(&self) -> bool {
        matches!(self, Operator::Blank | Operator::NotBlank)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    /// Operator names are matched case-insensitively; `NULL`/`NOT_NULL` are
    /// accepted as aliases of the presence operators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "NULL" => return Ok(Operator::Blank),
            "NOT_NULL" => return Ok(Operator::NotBlank),
            _ => {}
        }
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownOperator(s.to_string()))
    }
}

impl TryFrom<String> for Operator {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

/// What a satisfied criterion does to its targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityAction {
    #[default]
    Show,
    Hide,
}

/// Target of a visibility criterion.
///
/// Cell targets are resolved inside the layout instance of the source cell;
/// layout targets are resolved across the whole form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Cell(CellId),
    Layout(LayoutId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Cell(id) => write!(f, "cell {id}"),
            Target::Layout(id) => write!(f, "layout {id}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityCriterion {
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub action: VisibilityAction,
    /// Inverts the show/hide meaning of the criterion.
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl VisibilityCriterion {
    /// Criterion showing its targets when the field equals one of `values`.
    pub fn equals<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: VisibilityAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    #[must_use]
    pub fn targeting(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn target_cells(&self) -> impl Iterator<Item = &CellId> {
        self.targets.iter().filter_map(|target| match target {
            Target::Cell(id) => Some(id),
            Target::Layout(_) => None,
        })
    }

    pub fn target_layouts(&self) -> impl Iterator<Item = &LayoutId> {
        self.targets.iter().filter_map(|target| match target {
            Target::Layout(id) => Some(id),
            Target::Cell(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_parse_case_insensitively() {
        assert_eq!("equals".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!(
            " Greater_Equals ".parse::<Operator>().unwrap(),
            Operator::GreaterEquals
        );
        assert_eq!("not_null".parse::<Operator>().unwrap(), Operator::NotBlank);
        assert!(matches!(
            "BETWEEN".parse::<Operator>(),
            Err(ModelError::UnknownOperator(_))
        ));
    }

    #[test]
    fn criterion_defaults_to_equals_and_show() {
        let criterion: VisibilityCriterion = serde_json::from_str(
            r#"{"values": ["YES"], "targets": [{"cell": "C2"}, {"layout": "L2"}]}"#,
        )
        .unwrap();
        assert_eq!(criterion.operator, Operator::Equals);
        assert_eq!(criterion.action, VisibilityAction::Show);
        assert!(!criterion.reverse);
        assert_eq!(
            criterion.target_cells().map(CellId::as_str).collect::<Vec<_>>(),
            vec!["C2"]
        );
        assert_eq!(
            criterion
                .target_layouts()
                .map(LayoutId::as_str)
                .collect::<Vec<_>>(),
            vec!["L2"]
        );
    }

    #[test]
    fn operator_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&Operator::LowerEquals).unwrap();
        assert_eq!(json, "\"LOWER_EQUALS\"");
    }
}
