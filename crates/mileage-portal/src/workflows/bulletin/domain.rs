use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, MISSING_FIELDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeDraft {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl NoticeDraft {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        require_text(&[&self.title, &self.content, &self.author])
    }
}

/// Downloadable form. `downloadURL` keeps the key the front end already reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(default)]
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

/// Create or edit request for a form. `file` is base64 and only optional on edits.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

impl FormDraft {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        require_text(&[&self.title, &self.author])
    }

    /// The upload and its file name, when both are present.
    pub(crate) fn upload(&self) -> Result<Option<(&str, &str)>, ApiError> {
        match (self.file.as_deref(), self.file_name.as_deref()) {
            (Some(file), Some(name)) if !file.trim().is_empty() && !name.trim().is_empty() => {
                if name.contains('/') {
                    return Err(ApiError::validation(format!(
                        "파일 이름에 사용할 수 없는 문자가 있습니다: {name}"
                    )));
                }
                Ok(Some((file, name.trim())))
            }
            (None, _) => Ok(None),
            (Some(file), _) if file.trim().is_empty() => Ok(None),
            _ => Err(ApiError::validation(MISSING_FIELDS)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupNotice {
    pub title: String,
    pub image_url: String,
    pub expiry_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl PopupNotice {
    /// Shown through the whole expiry day.
    pub fn is_visible_on(&self, today: NaiveDate) -> bool {
        self.expiry_date >= today
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupNoticeDraft {
    pub title: String,
    /// Base64 image.
    pub image: String,
    /// `YYYY-MM-DD` or an ISO timestamp.
    pub expiry_date: String,
}

impl PopupNoticeDraft {
    pub(crate) fn expiry(&self) -> Result<NaiveDate, ApiError> {
        require_text(&[&self.title, &self.image, &self.expiry_date])?;
        let raw = self.expiry_date.trim();
        let date_part = raw.split_once('T').map_or(raw, |(date, _)| date);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| ApiError::validation(format!("만료일 형식이 올바르지 않습니다: {raw}")))
    }
}

fn require_text(values: &[&String]) -> Result<(), ApiError> {
    if values.iter().any(|value| value.trim().is_empty()) {
        return Err(ApiError::validation(MISSING_FIELDS));
    }
    Ok(())
}
