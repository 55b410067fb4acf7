use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::auth::{ROLE_HEADER, UNIVERSITY_HEADER, USER_ID_HEADER};
use crate::storage::{DocumentPath, DocumentStore, MemoryDocumentStore, StoreError};
use crate::workflows::microdegree::domain::{CourseType, MdProcess, Subject, SubjectCategory};
use crate::workflows::microdegree::MicrodegreeService;
use crate::workflows::term::Term;

pub(super) fn term() -> Term {
    Term::new("HGU", "2025", "1").expect("valid term")
}

pub(super) fn process(id: &str) -> MdProcess {
    MdProcess {
        id: id.to_string(),
        name: format!("{id} 마이크로디그리"),
        ..MdProcess::default()
    }
}

pub(super) fn subject(process_id: &str, code: &str, credit: f64) -> Subject {
    Subject {
        id: format!("{process_id}-{code}"),
        process_id: process_id.to_string(),
        category_number: 1,
        name: format!("{code} 과목"),
        credit,
        code: code.to_string(),
        department: "전산전자공학부".to_string(),
        required: false,
        course_type: None,
    }
}

pub(super) fn typed(mut subject: Subject, course_type: CourseType) -> Subject {
    subject.course_type = Some(course_type);
    subject
}

pub(super) fn required(mut subject: Subject) -> Subject {
    subject.required = true;
    subject
}

pub(super) fn category(process_id: &str, number: u32, course_type: CourseType) -> SubjectCategory {
    SubjectCategory {
        id: format!("{process_id}-cat-{number}"),
        number,
        course_type,
        code: format!("C{number}"),
        name: format!("분류 {number}"),
        process_id: process_id.to_string(),
    }
}

pub(super) fn build_service() -> (
    MicrodegreeService<MemoryDocumentStore>,
    Arc<MemoryDocumentStore>,
) {
    let store = Arc::new(MemoryDocumentStore::default());
    store
        .set(
            &DocumentPath::new(["users", "u-1"]),
            json!({
                "id": "u-1",
                "name": "김한동",
                "email": "u-1@handong.ac.kr",
                "university": "HGU",
                "role": "user",
                "studentNumber": "22000001",
                "department": "전산전자공학부",
                "major": "컴퓨터공학",
                "grade": "3",
                "semester": "6"
            }),
        )
        .expect("seed student");
    (MicrodegreeService::new(store.clone()), store)
}

pub(super) fn request(method: &str, uri: &str, role: &str, user: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user)
        .header(ROLE_HEADER, role)
        .header(UNIVERSITY_HEADER, "HGU")
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    role: &str,
    user: &str,
    body: Value,
) -> Request<Body> {
    request(method, uri, role, user)
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

/// Memory store whose writes under one collection always fail.
pub(super) struct FailingCollection {
    pub(super) inner: Arc<MemoryDocumentStore>,
    pub(super) collection: &'static str,
}

impl FailingCollection {
    fn rejects(&self, path: &DocumentPath) -> bool {
        path.to_string()
            .starts_with(&format!("{}/", self.collection))
    }
}

impl DocumentStore for FailingCollection {
    fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        self.inner.get(path)
    }

    fn set(&self, path: &DocumentPath, document: Value) -> Result<(), StoreError> {
        if self.rejects(path) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.inner.set(path, document)
    }

    fn merge(&self, path: &DocumentPath, patch: Value) -> Result<(), StoreError> {
        if self.rejects(path) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.inner.merge(path, patch)
    }

    fn delete(&self, path: &DocumentPath) -> Result<bool, StoreError> {
        self.inner.delete(path)
    }

    fn list(&self, collection: &DocumentPath) -> Result<Vec<(String, Value)>, StoreError> {
        self.inner.list(collection)
    }
}
