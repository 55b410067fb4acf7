use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::auth::{ROLE_HEADER, UNIVERSITY_HEADER, USER_ID_HEADER};
use crate::storage::{MemoryBlobStore, MemoryDocumentStore};
use crate::workflows::bulletin::domain::{FormDraft, NoticeDraft};
use crate::workflows::bulletin::BulletinService;

pub(super) const BLOB_BASE: &str = "https://files.test";

pub(super) type Service = BulletinService<MemoryDocumentStore, MemoryBlobStore>;

pub(super) fn build_service() -> (Service, Arc<MemoryDocumentStore>, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryDocumentStore::default());
    let blobs = Arc::new(MemoryBlobStore::new(BLOB_BASE));
    (
        BulletinService::new(store.clone(), blobs.clone()),
        store,
        blobs,
    )
}

pub(super) fn notice(title: &str) -> NoticeDraft {
    NoticeDraft {
        title: title.to_string(),
        content: "2학기 마일리지 장학금 신청을 받습니다.".to_string(),
        author: "학생지원팀".to_string(),
    }
}

pub(super) fn form(file_name: &str, file: &str) -> FormDraft {
    FormDraft {
        title: "장학금 신청서".to_string(),
        content: "작성 후 제출해 주세요.".to_string(),
        author: "학생지원팀".to_string(),
        file_name: Some(file_name.to_string()),
        file: Some(file.to_string()),
    }
}

pub(super) fn request(method: &str, uri: &str, role: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, "someone")
        .header(ROLE_HEADER, role)
        .header(UNIVERSITY_HEADER, "HGU")
}

pub(super) fn json_request(method: &str, uri: &str, role: &str, body: Value) -> Request<Body> {
    request(method, uri, role)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
