//! Student directory backed by the `users/{id}` documents written at registration.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{Capability, Role, Session};
use crate::error::{ApiError, StoreContext, MISSING_FIELDS};
use crate::storage::{DocumentPath, DocumentStore, DocumentStoreExt};

const USERS: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub university: String,
    pub role: Role,
    #[serde(default)]
    pub student_number: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub semester: String,
}

/// Identity snapshot frozen into submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInfo {
    pub name: String,
    pub email: String,
    pub student_number: String,
    pub department: String,
    pub major: String,
    pub grade: String,
    pub semester: String,
}

impl From<&StudentProfile> for StudentInfo {
    fn from(profile: &StudentProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            student_number: profile.student_number.clone(),
            department: profile.department.clone(),
            major: profile.major.clone(),
            grade: profile.grade.clone(),
            semester: profile.semester.clone(),
        }
    }
}

/// Editable part of a profile; identity and university come from the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub student_number: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub semester: String,
}

pub struct StudentDirectory<D> {
    store: Arc<D>,
}

impl<D> StudentDirectory<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    fn path(user_id: &str) -> DocumentPath {
        DocumentPath::new([USERS, user_id])
    }

    /// Students (role `user`) registered with a university, ordered by student number.
    pub fn list(&self, university_code: &str) -> Result<Vec<StudentProfile>, ApiError> {
        let mut students: Vec<StudentProfile> = self
            .store
            .fetch_all::<StudentProfile>(&DocumentPath::new([USERS]))
            .context("학생 목록을 가져오는 중 오류가 발생했습니다")?
            .into_iter()
            .map(|(id, mut profile)| {
                if profile.id.is_empty() {
                    profile.id = id;
                }
                profile
            })
            .filter(|profile| profile.university == university_code && profile.role == Role::User)
            .collect();
        students.sort_by(|a, b| a.student_number.cmp(&b.student_number));
        Ok(students)
    }

    pub fn profile(&self, user_id: &str) -> Result<Option<StudentProfile>, ApiError> {
        self.store
            .fetch(&Self::path(user_id))
            .context("학생 정보를 가져오는 중 오류가 발생했습니다")
    }

    /// Snapshot used when a student submits an application.
    pub fn student_info(&self, user_id: &str) -> Result<StudentInfo, ApiError> {
        self.profile(user_id)?
            .map(|profile| StudentInfo::from(&profile))
            .ok_or_else(|| ApiError::not_found("학생 정보를 찾을 수 없습니다"))
    }

    /// Creates or replaces a profile, keeping the stored role when one exists.
    /// A profile registered with another university is never moved.
    pub fn upsert(
        &self,
        university_code: &str,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<StudentProfile, ApiError> {
        if update.name.trim().is_empty() {
            return Err(ApiError::validation(MISSING_FIELDS));
        }

        let role = match self.profile(user_id)? {
            Some(existing) if existing.university != university_code => {
                warn!(
                    user_id,
                    university = university_code,
                    registered = %existing.university,
                    "refused to move student profile across universities"
                );
                return Err(ApiError::Forbidden);
            }
            Some(existing) => existing.role,
            None => Role::User,
        };

        let profile = StudentProfile {
            id: user_id.to_string(),
            name: update.name.trim().to_string(),
            email: update.email,
            university: university_code.to_string(),
            role,
            student_number: update.student_number,
            department: update.department,
            major: update.major,
            grade: update.grade,
            semester: update.semester,
        };
        self.store
            .put(&Self::path(user_id), &profile)
            .context("학생 정보 저장 중 오류가 발생했습니다")?;
        info!(user_id, university = university_code, "student profile saved");
        Ok(profile)
    }
}

pub fn student_router<D>(directory: Arc<StudentDirectory<D>>) -> Router
where
    D: DocumentStore + 'static,
{
    Router::new()
        .route("/api/v1/students/:university", get(list_handler::<D>))
        .route("/api/v1/students/:university/:user_id", put(upsert_handler::<D>))
        .with_state(directory)
}

pub(crate) async fn list_handler<D>(
    State(directory): State<Arc<StudentDirectory<D>>>,
    session: Session,
    Path(university): Path<String>,
) -> Result<Json<Vec<StudentProfile>>, ApiError>
where
    D: DocumentStore + 'static,
{
    session.require_in(&university, Capability::ViewStudents)?;
    directory.list(&university).map(Json)
}

pub(crate) async fn upsert_handler<D>(
    State(directory): State<Arc<StudentDirectory<D>>>,
    session: Session,
    Path((university, user_id)): Path<(String, String)>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<StudentProfile>, ApiError>
where
    D: DocumentStore + 'static,
{
    session.require_owner(&university, &user_id)?;
    let Json(update) = payload?;
    directory.upsert(&university, &user_id, update).map(Json)
}
