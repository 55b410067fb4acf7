//! Mileage scholarship and microdegree completion administration.
//!
//! [`portal_router`] assembles every HTTP surface over a pair of storage backends; the API
//! binary wires it to the in-memory stores together with health and metrics endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod workflows;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;

use storage::{BlobStore, DocumentStore};
use workflows::bulletin::{bulletin_router, BulletinService};
use workflows::microdegree::{microdegree_router, MicrodegreeService};
use workflows::mileage::{mileage_router, MileageService};
use workflows::students::{student_router, StudentDirectory};
use workflows::CurrentTerm;

/// Every portal route, sharing one document store and one blob store.
pub fn portal_router<D, B>(store: Arc<D>, blobs: Arc<B>) -> Router
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    Router::new()
        .route("/api/v1/terms/current", get(current_term_handler))
        .merge(mileage_router(Arc::new(MileageService::new(store.clone()))))
        .merge(microdegree_router(Arc::new(MicrodegreeService::new(
            store.clone(),
        ))))
        .merge(bulletin_router(Arc::new(BulletinService::new(
            store.clone(),
            blobs,
        ))))
        .merge(student_router(Arc::new(StudentDirectory::new(store))))
}

async fn current_term_handler() -> Json<CurrentTerm> {
    Json(CurrentTerm::on(Local::now().date_naive()))
}
