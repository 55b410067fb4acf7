use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use crate::auth::{ROLE_HEADER, UNIVERSITY_HEADER, USER_ID_HEADER};
use crate::storage::{DocumentPath, DocumentStore, MemoryDocumentStore};
use crate::workflows::mileage::domain::{Course, Field, FieldType, MileageArea};
use crate::workflows::mileage::MileageService;
use crate::workflows::term::Term;

pub(super) fn term() -> Term {
    Term::new("HGU", "2025", "2").expect("valid term")
}

pub(super) fn contest_area() -> MileageArea {
    MileageArea {
        name: "매".to_string(),
        default_points: 10.0,
        fields: vec![
            Field::new("행사명", FieldType::String),
            Field::new("시작일", FieldType::Date),
            Field::new("년도", FieldType::Number),
        ],
        is_course_completion: false,
    }
}

pub(super) fn certificate_area() -> MileageArea {
    MileageArea {
        name: "털(자격증 취득)".to_string(),
        default_points: 30.0,
        fields: vec![
            Field::new("자격증명", FieldType::String),
            Field::new("자격증 발급일", FieldType::Date),
        ],
        is_course_completion: false,
    }
}

pub(super) fn courses() -> Vec<Course> {
    vec![
        Course {
            code: "ECE20010".to_string(),
            name: "자료구조".to_string(),
            credit: 3.0,
            is_pbl: false,
        },
        Course {
            code: "ECE40001".to_string(),
            name: "캡스톤디자인".to_string(),
            credit: 3.0,
            is_pbl: true,
        },
    ]
}

pub(super) fn build_service() -> (MileageService<MemoryDocumentStore>, Arc<MemoryDocumentStore>) {
    let store = Arc::new(MemoryDocumentStore::default());
    store
        .set(
            &DocumentPath::new(["users", "u-1"]),
            json!({
                "name": "이한동",
                "email": "u-1@handong.ac.kr",
                "university": "HGU",
                "role": "user",
                "studentNumber": "21900001",
                "department": "전산전자공학부",
                "major": "컴퓨터공학",
                "grade": "4",
                "semester": "8"
            }),
        )
        .expect("seed student");
    (MileageService::new(store.clone()), store)
}

pub(super) fn encode(bytes: Vec<u8>) -> String {
    STANDARD.encode(bytes)
}

pub(super) fn request(
    method: &str,
    uri: &str,
    role: &str,
    user: &str,
) -> axum::http::request::Builder {
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
