use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Activity, ActivityDraft, Application, Course, MileageArea};
use super::service::MileageService;
use crate::auth::{Capability, Session};
use crate::error::ApiError;
use crate::storage::DocumentStore;
use crate::workflows::term::{StudentTermPath, TermItemPath, TermPath};

const BASE: &str = "/api/v1/mileage/:university/:year/:semester";

#[derive(Debug, Deserialize)]
pub struct AreasPayload {
    pub areas: Vec<MileageArea>,
}

#[derive(Debug, Deserialize)]
pub struct CourseCompletionPayload {
    pub enabled: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoursesPayload {
    pub courses: Vec<Course>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityPayload {
    pub activity: ActivityDraft,
}

#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    pub file: String,
}

pub fn mileage_router<D>(service: Arc<MileageService<D>>) -> Router
where
    D: DocumentStore + 'static,
{
    Router::new()
        .route(
            &format!("{BASE}/areas"),
            get(areas_handler::<D>).put(put_areas_handler::<D>),
        )
        .route(
            &format!("{BASE}/areas/course-completion"),
            put(course_completion_handler::<D>),
        )
        .route(&format!("{BASE}/areas/import"), post(import_areas_handler::<D>))
        .route(&format!("{BASE}/areas/export"), get(export_areas_handler::<D>))
        .route(
            &format!("{BASE}/courses"),
            get(courses_handler::<D>).put(put_courses_handler::<D>),
        )
        .route(
            &format!("{BASE}/courses/import"),
            post(import_courses_handler::<D>),
        )
        .route(
            &format!("{BASE}/courses/export"),
            get(export_courses_handler::<D>),
        )
        .route(
            &format!("{BASE}/activities/:user_id"),
            get(activities_handler::<D>).post(add_activity_handler::<D>),
        )
        .route(
            &format!("{BASE}/activities/:user_id/:id"),
            delete(remove_activity_handler::<D>),
        )
        .route(&format!("{BASE}/applications"), get(applications_handler::<D>))
        .route(
            &format!("{BASE}/applications/:user_id"),
            get(application_handler::<D>).post(submit_handler::<D>),
        )
        .route(
            &format!("{BASE}/applications/:user_id/export"),
            get(export_application_handler::<D>),
        )
        .with_state(service)
}

pub(crate) async fn areas_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::SubmitOwn)?;
    let areas = service.areas(&term)?;
    Ok(Json(json!({ "areas": areas })))
}

pub(crate) async fn put_areas_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<AreasPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(AreasPayload { areas }) = payload?;
    let areas = service.put_areas(&term, areas)?;
    Ok(Json(json!({ "areas": areas })))
}

pub(crate) async fn course_completion_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<CourseCompletionPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(CourseCompletionPayload { enabled, name }) = payload?;
    let areas = service.set_course_completion(&term, enabled, name)?;
    Ok(Json(json!({ "areas": areas })))
}

pub(crate) async fn import_areas_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<UploadPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(UploadPayload { file }) = payload?;
    let areas = service.import_areas(&term, &file)?;
    Ok(Json(json!({ "areas": areas })))
}

pub(crate) async fn export_areas_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    Ok(service.export_areas(&term)?.into_response())
}

pub(crate) async fn courses_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::SubmitOwn)?;
    let courses = service.courses(&term)?;
    Ok(Json(json!({ "courses": courses })))
}

pub(crate) async fn put_courses_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<CoursesPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(CoursesPayload { courses }) = payload?;
    let courses = service.put_courses(&term, courses)?;
    Ok(Json(json!({ "courses": courses })))
}

pub(crate) async fn import_courses_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<UploadPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(UploadPayload { file }) = payload?;
    let courses = service.import_courses(&term, &file)?;
    Ok(Json(json!({ "courses": courses })))
}

pub(crate) async fn export_courses_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    Ok(service.export_courses(&term)?.into_response())
}

pub(crate) async fn activities_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_owner(&term.university_code, &user_id)?;
    let activities = service.activities(&term, &user_id)?;
    Ok(Json(json!({ "activities": activities })))
}

pub(crate) async fn add_activity_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
    payload: Result<Json<ActivityPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_self(&term.university_code, &user_id)?;
    let Json(ActivityPayload { activity }) = payload?;
    let activity: Activity = service.add_activity(&term, &user_id, activity)?;
    Ok((StatusCode::CREATED, Json(activity)).into_response())
}

pub(crate) async fn remove_activity_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermItemPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    let user_id = path.user_id()?;
    session.require_self(&term.university_code, user_id)?;
    let activities = service.remove_activity(&term, user_id, &path.id)?;
    Ok(Json(json!({ "activities": activities })))
}

pub(crate) async fn applications_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<Vec<Application>>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ReviewApplications)?;
    service.applications(&term).map(Json)
}

pub(crate) async fn application_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Json<Application>, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_owner(&term.university_code, &user_id)?;
    service.application(&term, &user_id).map(Json)
}

pub(crate) async fn submit_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_self(&term.university_code, &user_id)?;
    let application = service.submit_application(&term, &user_id)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn export_application_handler<D>(
    State(service): State<Arc<MileageService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_in(&term.university_code, Capability::ReviewApplications)?;
    Ok(service.export_application(&term, &user_id)?.into_response())
}
