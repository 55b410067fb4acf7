use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::catalog::Catalog;
use super::domain::{MdProcess, Subject, SubjectCategory};
use super::service::MicrodegreeService;
use crate::auth::{Capability, Session};
use crate::error::ApiError;
use crate::storage::DocumentStore;
use crate::workflows::term::{StudentTermPath, TermItemPath, TermPath};

const BASE: &str = "/api/v1/md/:university/:year/:semester";

#[derive(Debug, Deserialize)]
pub struct ProcessPayload {
    pub process: MdProcess,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesPayload {
    pub categories: Vec<SubjectCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectsPayload {
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectPayload {
    pub subject: Subject,
}

/// Base64 encoded workbook upload.
#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    pub file: String,
}

pub fn microdegree_router<D>(service: Arc<MicrodegreeService<D>>) -> Router
where
    D: DocumentStore + 'static,
{
    Router::new()
        .route(
            &format!("{BASE}/processes"),
            get(processes_handler::<D>).post(add_process_handler::<D>),
        )
        .route(
            &format!("{BASE}/processes/:id"),
            put(update_process_handler::<D>).delete(delete_process_handler::<D>),
        )
        .route(
            &format!("{BASE}/categories"),
            get(categories_handler::<D>).put(put_categories_handler::<D>),
        )
        .route(
            &format!("{BASE}/subjects"),
            get(subjects_handler::<D>).put(put_subjects_handler::<D>),
        )
        .route(&format!("{BASE}/catalog/import"), post(import_handler::<D>))
        .route(&format!("{BASE}/catalog/export"), get(export_handler::<D>))
        .route(
            &format!("{BASE}/completed-subjects/:user_id"),
            get(completed_handler::<D>).post(add_completed_handler::<D>),
        )
        .route(
            &format!("{BASE}/status/:user_id"),
            get(status_handler::<D>),
        )
        .route(
            &format!("{BASE}/completed-subjects/:user_id/:id"),
            delete(remove_completed_handler::<D>),
        )
        .route(&format!("{BASE}/applications"), get(applications_handler::<D>))
        .route(
            &format!("{BASE}/applications/:user_id"),
            get(application_handler::<D>).post(submit_handler::<D>),
        )
        .with_state(service)
}

pub(crate) async fn processes_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::SubmitOwn)?;
    let processes = service.processes(&term)?;
    Ok(Json(json!({ "processes": processes })))
}

pub(crate) async fn add_process_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<ProcessPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(ProcessPayload { process }) = payload?;
    let process = service.add_process(&term, process)?;
    Ok((StatusCode::CREATED, Json(process)).into_response())
}

pub(crate) async fn update_process_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermItemPath>,
    payload: Result<Json<ProcessPayload>, JsonRejection>,
) -> Result<Json<MdProcess>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(ProcessPayload { process }) = payload?;
    service.update_process(&term, &path.id, process).map(Json)
}

pub(crate) async fn delete_process_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermItemPath>,
) -> Result<StatusCode, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    service.delete_process(&term, &path.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn categories_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::SubmitOwn)?;
    let categories = service.categories(&term)?;
    Ok(Json(json!({ "categories": categories })))
}

pub(crate) async fn put_categories_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<CategoriesPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(CategoriesPayload { categories }) = payload?;
    let categories = service.put_categories(&term, categories)?;
    Ok(Json(json!({ "categories": categories })))
}

pub(crate) async fn subjects_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::SubmitOwn)?;
    let subjects = service.subjects(&term)?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub(crate) async fn put_subjects_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
    payload: Result<Json<SubjectsPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    let Json(SubjectsPayload { subjects }) = payload?;
    let subjects = service.put_subjects(&term, subjects)?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub(crate) async fn import_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
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
    let Catalog {
        categories,
        subjects,
    } = service.import_catalog(&term, &file)?;
    Ok(Json(json!({ "categories": categories, "subjects": subjects })))
}

pub(crate) async fn export_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ManageCatalog)?;
    Ok(service.export_catalog(&term)?.into_response())
}

pub(crate) async fn completed_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_owner(&term.university_code, &user_id)?;
    let subjects = service.completed_subjects(&term, &user_id)?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub(crate) async fn add_completed_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
    payload: Result<Json<SubjectPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_self(&term.university_code, &user_id)?;
    let Json(SubjectPayload { subject }) = payload?;
    let subjects = service.add_completed_subject(&term, &user_id, subject)?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub(crate) async fn remove_completed_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermItemPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    let user_id = path.user_id()?;
    session.require_self(&term.university_code, user_id)?;
    let subjects = service.remove_completed_subject(&term, user_id, &path.id)?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub(crate) async fn status_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_owner(&term.university_code, &user_id)?;
    let processes = service.status(&term, &user_id)?;
    Ok(Json(json!({ "processes": processes })))
}

pub(crate) async fn applications_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<TermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let term = path.term()?;
    session.require_in(&term.university_code, Capability::ReviewApplications)?;
    Ok(Json(service.applications(&term)?).into_response())
}

pub(crate) async fn application_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
    session: Session,
    Path(path): Path<StudentTermPath>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
{
    let (term, user_id) = path.split()?;
    session.require_owner(&term.university_code, &user_id)?;
    Ok(Json(service.application(&term, &user_id)?).into_response())
}

pub(crate) async fn submit_handler<D>(
    State(service): State<Arc<MicrodegreeService<D>>>,
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
