//! Boundary validation of student-entered activity data against the area's field schema.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use super::domain::{
    Activity, Course, FieldType, FieldValue, MileageArea, COURSE_CODE_FIELD, COURSE_NAME_FIELD,
    CREDIT_FIELD, PBL_COURSE_POINTS, PBL_FIELD,
};
use crate::error::ApiError;

/// Builds a scored activity; unknown keys and values that do not fit their field are rejected.
pub fn build_activity(
    area: &MileageArea,
    raw: BTreeMap<String, Value>,
    course: Option<&Course>,
) -> Result<Activity, ApiError> {
    let mut data = BTreeMap::new();
    for (key, value) in raw {
        let field = area.field(&key).ok_or_else(|| {
            ApiError::validation(format!(
                "\"{}\" 영역에 없는 항목입니다: {key}",
                area.name
            ))
        })?;
        let coerced = coerce(field.field_type, &value).map_err(|_| {
            ApiError::validation(format!(
                "{key} 항목은 {} 형식이어야 합니다",
                field.field_type.label()
            ))
        })?;
        if let Some(coerced) = coerced {
            data.insert(key, coerced);
        }
    }

    if let (Some(course), true) = (course, area.is_course_completion) {
        fill_course_fields(area, &mut data, course);
    }

    let points = match data.get(PBL_FIELD) {
        Some(FieldValue::Boolean(true)) => PBL_COURSE_POINTS,
        _ => area.default_points,
    };

    Ok(Activity {
        id: Uuid::new_v4().to_string(),
        area: area.name.clone(),
        data,
        points,
    })
}

fn fill_course_fields(area: &MileageArea, data: &mut BTreeMap<String, FieldValue>, course: &Course) {
    let filled = [
        (COURSE_CODE_FIELD, FieldValue::String(course.code.clone())),
        (COURSE_NAME_FIELD, FieldValue::String(course.name.clone())),
        (CREDIT_FIELD, FieldValue::Number(course.credit)),
        (PBL_FIELD, FieldValue::Boolean(course.is_pbl)),
    ];
    for (name, value) in filled {
        if area.field(name).is_some() {
            data.insert(name.to_string(), value);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Mismatch;

/// `Ok(None)` for blank input, which is simply left out of the activity.
pub(crate) fn coerce(field_type: FieldType, value: &Value) -> Result<Option<FieldValue>, Mismatch> {
    if let Value::Object(tagged) = value {
        return match tagged.get("value") {
            Some(inner) => coerce(field_type, inner),
            None => Err(Mismatch),
        };
    }
    if value.is_null() {
        return Ok(None);
    }
    if let Value::String(text) = value {
        if text.trim().is_empty() {
            return Ok(None);
        }
    }

    let coerced = match (field_type, value) {
        (FieldType::String, Value::String(text)) => FieldValue::String(text.trim().to_string()),
        (FieldType::String, Value::Number(number)) => FieldValue::String(number.to_string()),
        (FieldType::String, Value::Bool(flag)) => FieldValue::String(flag.to_string()),
        (FieldType::Number, Value::Number(number)) => {
            FieldValue::Number(number.as_f64().ok_or(Mismatch)?)
        }
        (FieldType::Number, Value::String(text)) => {
            let number = text.trim().parse::<f64>().map_err(|_| Mismatch)?;
            if !number.is_finite() {
                return Err(Mismatch);
            }
            FieldValue::Number(number)
        }
        (FieldType::Date, Value::String(text)) => FieldValue::Date(parse_date(text.trim())?),
        (FieldType::Boolean, Value::Bool(flag)) => FieldValue::Boolean(*flag),
        (FieldType::Boolean, Value::String(text)) => match text.trim() {
            "true" => FieldValue::Boolean(true),
            "false" => FieldValue::Boolean(false),
            _ => return Err(Mismatch),
        },
        _ => return Err(Mismatch),
    };
    Ok(Some(coerced))
}

/// `YYYY-MM-DD`, or the date part of an ISO timestamp.
fn parse_date(text: &str) -> Result<NaiveDate, Mismatch> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| {
            let date_part = text.split_once('T').map_or(text, |(date, _)| date);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        })
        .map_err(|_| Mismatch)
}
