//! Per-request session and the capability table every handler checks against.
//!
//! Identity is established upstream; the gateway forwards the signed-in user through the
//! `x-user-id`, `x-user-role` and `x-university-code` headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const UNIVERSITY_HEADER: &str = "x-university-code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::ManageCatalog,
                Capability::ManageBulletin,
                Capability::ReviewApplications,
                Capability::ViewStudents,
                Capability::SubmitOwn,
            ],
            Role::Staff => &[
                Capability::ReviewApplications,
                Capability::ViewStudents,
                Capability::SubmitOwn,
            ],
            Role::User => &[Capability::SubmitOwn],
        }
    }
}

/// Actions gated per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Areas, courses, MD processes, categories, subjects and their imports.
    ManageCatalog,
    /// Notices, downloadable forms and the popup notice.
    ManageBulletin,
    /// Reading and exporting any student's applications.
    ReviewApplications,
    ViewStudents,
    /// Editing one's own activities, completed subjects and applications.
    SubmitOwn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub university_code: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role, university_code: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            university_code: university_code.into(),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or(ApiError::Unauthenticated)
        };

        let user_id = header(USER_ID_HEADER)?;
        let role = Role::parse(header(ROLE_HEADER)?).ok_or(ApiError::Unauthenticated)?;
        let university_code = header(UNIVERSITY_HEADER)?;

        Ok(Self::new(user_id, role, university_code))
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.capabilities().contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Capability check scoped to the university named in the request path.
    pub fn require_in(&self, university_code: &str, capability: Capability) -> Result<(), ApiError> {
        if self.university_code != university_code {
            return Err(ApiError::Forbidden);
        }
        self.require(capability)
    }

    /// Grants access to a student's own records, or to reviewers of the same university.
    pub fn require_owner(&self, university_code: &str, user_id: &str) -> Result<(), ApiError> {
        if self.university_code != university_code {
            return Err(ApiError::Forbidden);
        }
        if self.user_id == user_id && self.can(Capability::SubmitOwn) {
            return Ok(());
        }
        self.require(Capability::ReviewApplications)
    }

    /// Submissions are only ever made by the student themselves.
    pub fn require_self(&self, university_code: &str, user_id: &str) -> Result<(), ApiError> {
        if self.university_code != university_code || self.user_id != user_id {
            return Err(ApiError::Forbidden);
        }
        self.require(Capability::SubmitOwn)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Session::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user: &str, role: &str, university: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(user).expect("header"));
        headers.insert(ROLE_HEADER, HeaderValue::from_str(role).expect("header"));
        headers.insert(
            UNIVERSITY_HEADER,
            HeaderValue::from_str(university).expect("header"),
        );
        headers
    }

    #[test]
    fn parses_session_headers() {
        let session = Session::from_headers(&headers("u-1", "Admin", "HGU")).expect("session");
        assert_eq!(session, Session::new("u-1", Role::Admin, "HGU"));
    }

    #[test]
    fn missing_or_unknown_role_is_unauthenticated() {
        let mut partial = headers("u-1", "user", "HGU");
        partial.remove(ROLE_HEADER);
        assert!(matches!(
            Session::from_headers(&partial),
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            Session::from_headers(&headers("u-1", "superuser", "HGU")),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn staff_reviews_but_cannot_manage_catalog() {
        let staff = Session::new("s-1", Role::Staff, "HGU");
        assert!(staff.require_in("HGU", Capability::ReviewApplications).is_ok());
        assert!(matches!(
            staff.require_in("HGU", Capability::ManageCatalog),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn students_only_reach_their_own_records() {
        let student = Session::new("u-1", Role::User, "HGU");
        assert!(student.require_owner("HGU", "u-1").is_ok());
        assert!(matches!(
            student.require_owner("HGU", "u-2"),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            student.require_owner("POSTECH", "u-1"),
            Err(ApiError::Forbidden)
        ));

        let reviewer = Session::new("s-1", Role::Staff, "HGU");
        assert!(reviewer.require_owner("HGU", "u-2").is_ok());
        assert!(matches!(
            reviewer.require_self("HGU", "u-2"),
            Err(ApiError::Forbidden)
        ));
    }
}
