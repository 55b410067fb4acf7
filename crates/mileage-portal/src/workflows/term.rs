use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::storage::DocumentPath;

/// First academic year offered by the year selector.
pub const FIRST_ACADEMIC_YEAR: i32 = 2024;

/// Scope shared by every per-term document: university, academic year and semester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub university_code: String,
    pub year: String,
    pub semester: String,
}

impl Term {
    pub fn new(
        university_code: impl Into<String>,
        year: impl Into<String>,
        semester: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let term = Self {
            university_code: university_code.into().trim().to_string(),
            year: year.into().trim().to_string(),
            semester: semester.into().trim().to_string(),
        };

        if term.university_code.is_empty() || term.year.is_empty() || term.semester.is_empty() {
            return Err(ApiError::validation(crate::error::MISSING_FIELDS));
        }
        if term.year.len() != 4 || term.year.parse::<u16>().is_err() {
            return Err(ApiError::validation("연도 형식이 올바르지 않습니다"));
        }
        if !matches!(term.semester.as_str(), "1" | "2") {
            return Err(ApiError::validation("학기는 1 또는 2여야 합니다"));
        }

        Ok(term)
    }

    /// `{collection}/{university}/{year}/{semester}`
    pub fn document(&self, collection: &str) -> DocumentPath {
        DocumentPath::new([
            collection,
            self.university_code.as_str(),
            self.year.as_str(),
            self.semester.as_str(),
        ])
    }

    /// `{collection}/{user}/{year}/{semester}`; student owned lists are not scoped per university.
    pub fn user_document(&self, collection: &str, user_id: &str) -> DocumentPath {
        DocumentPath::new([collection, user_id, self.year.as_str(), self.semester.as_str()])
    }

    /// `{collection}_{university}/{year}/{semester}`, the parent of per-student submissions.
    pub fn submissions(&self, collection: &str) -> DocumentPath {
        DocumentPath::new([
            format!("{collection}_{}", self.university_code),
            self.year.clone(),
            self.semester.clone(),
        ])
    }
}

/// `/:university/:year/:semester` path segments.
#[derive(Debug, Clone, Deserialize)]
pub struct TermPath {
    pub university: String,
    pub year: String,
    pub semester: String,
}

impl TermPath {
    pub fn term(self) -> Result<Term, ApiError> {
        Term::new(self.university, self.year, self.semester)
    }
}

/// Term path followed by `/:user_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentTermPath {
    pub university: String,
    pub year: String,
    pub semester: String,
    pub user_id: String,
}

impl StudentTermPath {
    pub fn split(self) -> Result<(Term, String), ApiError> {
        let term = Term::new(self.university, self.year, self.semester)?;
        Ok((term, self.user_id))
    }
}

/// Term path followed by an item id, optionally owned by a student.
#[derive(Debug, Clone, Deserialize)]
pub struct TermItemPath {
    pub university: String,
    pub year: String,
    pub semester: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub id: String,
}

impl TermItemPath {
    pub fn term(&self) -> Result<Term, ApiError> {
        Term::new(
            self.university.as_str(),
            self.year.as_str(),
            self.semester.as_str(),
        )
    }

    pub fn user_id(&self) -> Result<&str, ApiError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ApiError::validation(crate::error::MISSING_FIELDS))
    }
}

/// Academic year/semester pair a given date falls into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTerm {
    pub year: String,
    pub semester: String,
    pub year_options: Vec<String>,
}

impl CurrentTerm {
    /// January and February still belong to the previous academic year's second semester.
    pub fn on(today: NaiveDate) -> Self {
        let month = today.month();
        let year = if month <= 2 {
            today.year() - 1
        } else {
            today.year()
        };
        let semester = if (3..=8).contains(&month) { "1" } else { "2" };
        let year_options = (FIRST_ACADEMIC_YEAR..=today.year().max(FIRST_ACADEMIC_YEAR))
            .map(|year| year.to_string())
            .collect();

        Self {
            year: year.to_string(),
            semester: semester.to_string(),
            year_options,
        }
    }
}
