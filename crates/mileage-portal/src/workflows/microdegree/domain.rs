use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::serde_util::null_as_default;
use crate::workflows::students::StudentInfo;

pub const STANDARD_COURSE_LABEL: &str = "표준교과목";
pub const LINKED_COURSE_LABEL: &str = "연계융합교과목";

/// Microdegree program definition with its completion thresholds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdProcess {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_standard_courses: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_linked_courses: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_compulsory_credits: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_optional_credits: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_required_credits: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires_compulsory_courses: bool,
}

/// Category type tag; anything other than the two known labels is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CourseType {
    Standard,
    Linked,
    Other(String),
}

impl CourseType {
    pub fn label(&self) -> &str {
        match self {
            CourseType::Standard => STANDARD_COURSE_LABEL,
            CourseType::Linked => LINKED_COURSE_LABEL,
            CourseType::Other(label) => label,
        }
    }
}

impl Default for CourseType {
    fn default() -> Self {
        CourseType::Other(String::new())
    }
}

impl From<String> for CourseType {
    fn from(value: String) -> Self {
        match value.trim() {
            STANDARD_COURSE_LABEL => CourseType::Standard,
            LINKED_COURSE_LABEL => CourseType::Linked,
            _ => CourseType::Other(value),
        }
    }
}

impl From<CourseType> for String {
    fn from(value: CourseType) -> Self {
        match value {
            CourseType::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCategory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub number: u32,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub course_type: CourseType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub process_id: String,
}

/// A catalog subject, or one a student recorded as completed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub process_id: String,
    pub category_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credit: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub course_type: Option<CourseType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdApplication {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub process_names: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub student_info: StudentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// `md-process/{u}/{y}/{s}` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessList {
    #[serde(default)]
    pub processes: Vec<MdProcess>,
}

/// `md-category/{u}/{y}/{s}` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryList {
    #[serde(default)]
    pub categories: Vec<SubjectCategory>,
}

/// `md-subject/...` and `md-completed-subjects/...` documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectList {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}
