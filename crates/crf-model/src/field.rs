//! Field models and typed field values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ids::FieldModelId;

/// Separator between the selected values of a checkbox group.
pub const CHECKBOX_GROUP_SEPARATOR: char = ',';

/// Calendar formats accepted for DATE-typed values, ISO first.
pub const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Format of the optional time part following the date.
pub const TIME_FORMAT: &str = "%H:%M";

/// Widget family of a field model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldModelType {
    #[default]
    String,
    AutoCompletion,
    Date,
    DateSelect,
    Number,
    Select,
    Radio,
    Checkbox,
    CheckboxGroup,
    Textarea,
    File,
}

impl FieldModelType {
    /// Field types whose values must be one of the declared possible values.
    pub fn is_multiple_choice(&self) -> bool {
        matches!(
            self,
            FieldModelType::Select | FieldModelType::Radio | FieldModelType::CheckboxGroup
        )
    }

    fn default_data_type(&self) -> DataType {
        match self {
            FieldModelType::Number => DataType::Number,
            FieldModelType::Checkbox => DataType::Boolean,
            FieldModelType::Date | FieldModelType::DateSelect => DataType::Date,
            _ => DataType::String,
        }
    }
}

/// Type used to compare field values against criterion values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    String,
    Number,
    Boolean,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldModel {
    pub id: FieldModelId,
    #[serde(rename = "type", default)]
    pub field_type: FieldModelType,
    /// Explicit comparison type; inferred from the field type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub possible_values: Vec<String>,
}

impl FieldModel {
    pub fn new(id: FieldModelId, field_type: FieldModelType) -> Self {
        Self {
            id,
            field_type,
            data_type: None,
            read_only: false,
            possible_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    #[must_use]
    pub fn with_possible_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possible_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn effective_data_type(&self) -> DataType {
        self.data_type
            .unwrap_or_else(|| self.field_type.default_data_type())
    }

    /// Values a criterion on this field may reference, when the field restricts them.
    pub fn allowed_values(&self) -> Option<Vec<&str>> {
        if self.field_type == FieldModelType::Checkbox {
            return Some(vec!["true", "false"]);
        }
        if self.field_type.is_multiple_choice() {
            return Some(self.possible_values.iter().map(String::as_str).collect());
        }
        None
    }

    /// Types a single raw value. Blank or unparseable values yield `None`,
    /// except dates in an unknown format, which compare as text.
    pub fn type_value(&self, raw: &str) -> Option<TypedValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self.effective_data_type() {
            DataType::String => Some(TypedValue::Text(raw.to_string())),
            DataType::Number => trimmed.parse::<f64>().ok().map(TypedValue::Number),
            DataType::Boolean => Some(TypedValue::Boolean(trimmed == "true")),
            DataType::Date => Some(
                parse_date(trimmed)
                    .map(TypedValue::Date)
                    .unwrap_or_else(|| TypedValue::Text(trimmed.to_string())),
            ),
        }
    }

    /// Types the stored value of a field; checkbox groups expand to one value per selection.
    pub fn parse_value(&self, value: Option<&str>) -> Vec<TypedValue> {
        let Some(value) = value else {
            return Vec::new();
        };
        match self.field_type {
            FieldModelType::CheckboxGroup => value
                .split(CHECKBOX_GROUP_SEPARATOR)
                .filter_map(|part| self.type_value(part.trim()))
                .collect(),
            _ => self.type_value(value).into_iter().collect(),
        }
    }
}

/// Parses `<date>` or `<date> HH:MM`; a date alone stands for midnight.
fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let mut parts = value.split_whitespace();
    let date_part = parts.next()?;
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())?;
    let time = match parts.next() {
        Some(time_part) => NaiveTime::parse_from_str(time_part, TIME_FORMAT).ok()?,
        None => NaiveTime::MIN,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(date.and_time(time))
}

/// A field value converted to its comparison type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl TypedValue {
    /// Orders two values of the same type; values of different types are unordered.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Text(a), TypedValue::Text(b)) => Some(a.cmp(b)),
            (TypedValue::Number(a), TypedValue::Number(b)) => a.partial_cmp(b),
            (TypedValue::Boolean(a), TypedValue::Boolean(b)) => Some(a.cmp(b)),
            (TypedValue::Date(a), TypedValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Text(value) => f.write_str(value),
            TypedValue::Number(value) => write!(f, "{value}"),
            TypedValue::Boolean(value) => write!(f, "{value}"),
            TypedValue::Date(value) if value.time() == NaiveTime::MIN => {
                write!(f, "{}", value.format(DATE_FORMATS[0]))
            }
            TypedValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(field_type: FieldModelType) -> FieldModel {
        FieldModel::new(FieldModelId::new("F").unwrap(), field_type)
    }

    #[test]
    fn data_type_is_inferred_from_field_type() {
        assert_eq!(
            model(FieldModelType::Number).effective_data_type(),
            DataType::Number
        );
        assert_eq!(
            model(FieldModelType::DateSelect).effective_data_type(),
            DataType::Date
        );
        assert_eq!(
            model(FieldModelType::Radio).effective_data_type(),
            DataType::String
        );
        assert_eq!(
            model(FieldModelType::Radio)
                .with_data_type(DataType::Number)
                .effective_data_type(),
            DataType::Number
        );
    }

    #[test]
    fn checkbox_group_values_are_split() {
        let values = model(FieldModelType::CheckboxGroup).parse_value(Some("A, B,,C"));
        assert_eq!(
            values,
            vec![
                TypedValue::Text("A".to_string()),
                TypedValue::Text("B".to_string()),
                TypedValue::Text("C".to_string()),
            ]
        );
    }

    #[test]
    fn blank_and_invalid_values_are_untyped() {
        let number = model(FieldModelType::Number);
        assert!(number.parse_value(None).is_empty());
        assert!(number.parse_value(Some("  ")).is_empty());
        assert!(number.parse_value(Some("twelve")).is_empty());
        assert_eq!(
            number.parse_value(Some("12.5")),
            vec![TypedValue::Number(12.5)]
        );
    }

    #[test]
    fn dates_compare_chronologically() {
        let date = model(FieldModelType::Date);
        let early = date.type_value("2024-01-31").unwrap();
        let late = date.type_value("2024-02-01").unwrap();
        assert_eq!(early.compare(&late), Some(Ordering::Less));
    }

    #[test]
    fn dotted_dates_compare_with_iso_dates() {
        let date = model(FieldModelType::Date);
        let dotted = date.type_value("31.01.2024").unwrap();
        let iso = date.type_value("2024-01-31").unwrap();
        assert_eq!(dotted.compare(&iso), Some(Ordering::Equal));
        assert_eq!(dotted.to_string(), "2024-01-31");
    }

    #[test]
    fn time_part_orders_values_within_a_day() {
        let date = model(FieldModelType::DateSelect);
        let morning = date.type_value("31.01.2024 08:15").unwrap();
        let evening = date.type_value("31.01.2024 19:40").unwrap();
        let midnight = date.type_value("31.01.2024").unwrap();
        assert_eq!(morning.compare(&evening), Some(Ordering::Less));
        assert_eq!(midnight.compare(&morning), Some(Ordering::Less));
        assert_eq!(evening.to_string(), "2024-01-31 19:40");
    }

    #[test]
    fn unknown_date_formats_compare_as_text() {
        let date = model(FieldModelType::Date);
        assert_eq!(
            date.type_value("01/31/2024"),
            Some(TypedValue::Text("01/31/2024".to_string()))
        );
    }

    #[test]
    fn mixed_types_are_unordered() {
        let text = TypedValue::Text("1".to_string());
        assert_eq!(text.compare(&TypedValue::Number(1.0)), None);
    }
}
