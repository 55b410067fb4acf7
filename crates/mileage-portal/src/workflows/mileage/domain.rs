use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::serde_util::null_as_default;
use crate::workflows::students::StudentInfo;

pub const COURSE_COMPLETION_AREA_NAME: &str = "갈";
pub const COURSE_COMPLETION_POINTS: f64 = 30.0;
/// Points awarded for a completed PBL course instead of the area default.
pub const PBL_COURSE_POINTS: f64 = 35.0;

pub const COURSE_CODE_FIELD: &str = "과목코드";
pub const COURSE_NAME_FIELD: &str = "과목명";
pub const CREDIT_FIELD: &str = "이수학점";
pub const PBL_FIELD: &str = "PBL여부";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 4] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Date,
        FieldType::Boolean,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field_type| field_type.label() == raw.trim())
    }

    pub const fn label(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }
}

/// Scoring area and the schema its activities must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageArea {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_points: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<Field>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_course_completion: bool,
}

impl MileageArea {
    /// Preset area for completed courses, enabled per term by administrators.
    pub fn course_completion(name: &str) -> Self {
        let text = FieldType::String;
        let number = FieldType::Number;

        Self {
            name: name.to_string(),
            default_points: COURSE_COMPLETION_POINTS,
            fields: vec![
                Field::new(COURSE_CODE_FIELD, text),
                Field::new(COURSE_NAME_FIELD, text),
                Field::new("년도", number),
                Field::new("학기", number),
                Field::new("담당교수", text),
                Field::new(CREDIT_FIELD, number),
                Field::new("성적", text),
                Field::new(PBL_FIELD, FieldType::Boolean),
                Field::new("비고", text),
            ],
            is_course_completion: true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Typed activity value; serialized as `{ "type": ..., "value": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    String(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::Boolean(_) => FieldType::Boolean,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(value) => f.write_str(value),
            FieldValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            FieldValue::Boolean(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub area: String,
    #[serde(default)]
    pub data: BTreeMap<String, FieldValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: f64,
}

/// Activity as entered by a student, before it is checked against its area.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub area: String,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
    /// Catalog course whose code, name, credit and PBL flag fill the course-completion fields.
    #[serde(default)]
    pub course_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credit: f64,
    #[serde(rename = "isPBL", default, deserialize_with = "null_as_default")]
    pub is_pbl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub student_info: StudentInfo,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// `mileage/{u}/{y}/{s}` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaList {
    #[serde(default)]
    pub areas: Vec<MileageArea>,
}

/// `courses/{u}/{y}/{s}` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseList {
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// `activities/{user}/{y}/{s}` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityList {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_values_are_tagged() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).expect("date");
        assert_eq!(
            serde_json::to_value(FieldValue::Date(date)).expect("serialize"),
            json!({ "type": "date", "value": "2025-03-04" })
        );
        let parsed: FieldValue =
            serde_json::from_value(json!({ "type": "boolean", "value": true })).expect("parse");
        assert_eq!(parsed, FieldValue::Boolean(true));
        assert_eq!(FieldValue::Number(3.0).to_string(), "3");
    }

    #[test]
    fn course_completion_preset_matches_catalog_fields() {
        let area = MileageArea::course_completion(COURSE_COMPLETION_AREA_NAME);
        assert_eq!(area.default_points, 30.0);
        assert_eq!(area.fields.len(), 9);
        assert_eq!(
            area.field(PBL_FIELD).map(|field| field.field_type),
            Some(FieldType::Boolean)
        );
        assert!(area.is_course_completion);
    }

    #[test]
    fn course_flag_uses_legacy_key() {
        let course: Course = serde_json::from_value(json!({
            "code": "ECE20010", "name": "자료구조", "credit": 3, "isPBL": true
        }))
        .expect("course");
        assert!(course.is_pbl);
        assert_eq!(FieldType::parse(" date "), Some(FieldType::Date));
        assert_eq!(FieldType::parse("text"), None);
    }
}
