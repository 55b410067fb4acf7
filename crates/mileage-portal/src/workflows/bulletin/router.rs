use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;

use super::domain::{Form, FormDraft, Notice, NoticeDraft, PopupNotice, PopupNoticeDraft};
use super::service::BulletinService;
use crate::auth::{Capability, Session};
use crate::error::ApiError;
use crate::storage::{BlobStore, DocumentStore};

#[derive(Debug, Deserialize)]
pub struct BoardItemPath {
    pub university: String,
    pub id: String,
}

pub fn bulletin_router<D, B>(service: Arc<BulletinService<D, B>>) -> Router
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/notices/:university",
            get(notices_handler::<D, B>).post(add_notice_handler::<D, B>),
        )
        .route(
            "/api/v1/notices/:university/:id",
            put(update_notice_handler::<D, B>).delete(delete_notice_handler::<D, B>),
        )
        .route(
            "/api/v1/forms/:university",
            get(forms_handler::<D, B>).post(add_form_handler::<D, B>),
        )
        .route(
            "/api/v1/forms/:university/:id",
            put(update_form_handler::<D, B>).delete(delete_form_handler::<D, B>),
        )
        .route(
            "/api/v1/popup-notice/:university",
            get(popup_notice_handler::<D, B>).put(put_popup_notice_handler::<D, B>),
        )
        .with_state(service)
}

pub(crate) async fn notices_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
) -> Result<Json<Vec<Notice>>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::SubmitOwn)?;
    service.notices(&university).map(Json)
}

pub(crate) async fn add_notice_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
    payload: Result<Json<NoticeDraft>, JsonRejection>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::ManageBulletin)?;
    let Json(draft) = payload?;
    let notice = service.add_notice(&university, draft)?;
    Ok((StatusCode::CREATED, Json(notice)).into_response())
}

pub(crate) async fn update_notice_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(path): Path<BoardItemPath>,
    payload: Result<Json<NoticeDraft>, JsonRejection>,
) -> Result<Json<Notice>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&path.university, Capability::ManageBulletin)?;
    let Json(draft) = payload?;
    service.update_notice(&path.university, &path.id, draft).map(Json)
}

pub(crate) async fn delete_notice_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(path): Path<BoardItemPath>,
) -> Result<StatusCode, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&path.university, Capability::ManageBulletin)?;
    service.delete_notice(&path.university, &path.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn forms_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
) -> Result<Json<Vec<Form>>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::SubmitOwn)?;
    service.forms(&university).map(Json)
}

pub(crate) async fn add_form_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
    payload: Result<Json<FormDraft>, JsonRejection>,
) -> Result<Response, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::ManageBulletin)?;
    let Json(draft) = payload?;
    let form = service.add_form(&university, draft)?;
    Ok((StatusCode::CREATED, Json(form)).into_response())
}

pub(crate) async fn update_form_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(path): Path<BoardItemPath>,
    payload: Result<Json<FormDraft>, JsonRejection>,
) -> Result<Json<Form>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&path.university, Capability::ManageBulletin)?;
    let Json(draft) = payload?;
    service.update_form(&path.university, &path.id, draft).map(Json)
}

pub(crate) async fn delete_form_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(path): Path<BoardItemPath>,
) -> Result<StatusCode, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&path.university, Capability::ManageBulletin)?;
    service.delete_form(&path.university, &path.id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Answers `null` when no popup is set or it has expired.
pub(crate) async fn popup_notice_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
) -> Result<Json<Option<PopupNotice>>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::SubmitOwn)?;
    let today = Local::now().date_naive();
    service.popup_notice(&university, today).map(Json)
}

pub(crate) async fn put_popup_notice_handler<D, B>(
    State(service): State<Arc<BulletinService<D, B>>>,
    session: Session,
    Path(university): Path<String>,
    payload: Result<Json<PopupNoticeDraft>, JsonRejection>,
) -> Result<Json<PopupNotice>, ApiError>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    session.require_in(&university, Capability::ManageBulletin)?;
    let Json(draft) = payload?;
    service.put_popup_notice(&university, draft).map(Json)
}
