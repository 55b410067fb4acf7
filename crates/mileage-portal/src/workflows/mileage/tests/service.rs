use std::collections::BTreeMap;

use serde_json::json;

use super::common::*;
use crate::error::ApiError;
use crate::storage::DocumentStore;
use crate::workflows::mileage::domain::{
    ActivityDraft, FieldValue, MileageArea, COURSE_COMPLETION_AREA_NAME, PBL_COURSE_POINTS,
};
use crate::workflows::mileage::workbook::{write_areas, write_courses};

fn draft(area: &str, data: serde_json::Value) -> ActivityDraft {
    ActivityDraft {
        area: area.to_string(),
        data: serde_json::from_value::<BTreeMap<String, serde_json::Value>>(data)
            .expect("object"),
        course_code: None,
    }
}

#[test]
fn areas_are_not_found_until_saved() {
    let (service, _) = build_service();
    assert!(matches!(service.areas(&term()), Err(ApiError::NotFound(_))));

    service
        .put_areas(&term(), vec![contest_area(), certificate_area()])
        .expect("save");
    assert_eq!(service.areas(&term()).expect("areas").len(), 2);
}

#[test]
fn duplicate_area_names_are_rejected() {
    let (service, store) = build_service();
    let error = service
        .put_areas(&term(), vec![contest_area(), contest_area()])
        .expect_err("duplicate");
    assert!(matches!(error, ApiError::Validation(_)));
    assert!(store.get(&term().document("mileage")).expect("get").is_none());
}

#[test]
fn area_names_must_be_valid_sheet_names() {
    let (service, store) = build_service();
    let named = |name: &str| MileageArea {
        name: name.to_string(),
        ..contest_area()
    };

    for name in [
        "봉사/교육",
        "대회[수상]",
        "'인용'",
        "학생 정보",
        "가나다라마바사아자차카타파하가나다라마바사아자차카타파하가나다라",
    ] {
        let error = service
            .put_areas(&term(), vec![named(name)])
            .expect_err(name);
        assert!(matches!(error, ApiError::Validation(_)), "{name}");
    }
    assert!(store.get(&term().document("mileage")).expect("get").is_none());

    let longest = "가".repeat(31);
    let saved = service
        .put_areas(&term(), vec![named(&longest)])
        .expect("31 characters fit");
    let bytes = write_areas(&saved).expect("exportable");
    assert!(!bytes.is_empty());
}

#[test]
fn course_completion_name_follows_sheet_rules() {
    let (service, _) = build_service();
    let error = service
        .set_course_completion(&term(), true, Some("교과목/이수".to_string()))
        .expect_err("slash");
    assert!(matches!(error, ApiError::Validation(_)));
}

#[test]
fn course_completion_toggle_prepends_and_removes_preset() {
    let (service, _) = build_service();
    service.put_areas(&term(), vec![contest_area()]).expect("save");

    let enabled = service
        .set_course_completion(&term(), true, None)
        .expect("enable");
    assert_eq!(enabled[0].name, COURSE_COMPLETION_AREA_NAME);
    assert!(enabled[0].is_course_completion);
    assert_eq!(enabled[1], contest_area());

    let renamed = service
        .set_course_completion(&term(), true, Some("교과목 이수".to_string()))
        .expect("rename");
    assert_eq!(renamed.len(), 2);
    assert_eq!(renamed[0].name, "교과목 이수");

    let disabled = service
        .set_course_completion(&term(), false, None)
        .expect("disable");
    assert_eq!(disabled, vec![contest_area()]);
}

#[test]
fn failed_area_import_keeps_existing_areas() {
    let (service, _) = build_service();
    service.put_areas(&term(), vec![contest_area()]).expect("save");

    let error = service
        .import_areas(&term(), "%%% not base64 %%%")
        .expect_err("bad upload");
    assert!(matches!(error, ApiError::Spreadsheet(_)));
    assert_eq!(service.areas(&term()).expect("areas"), vec![contest_area()]);

    let bytes = write_areas(&[certificate_area()]).expect("workbook");
    let imported = service
        .import_areas(&term(), &encode(bytes))
        .expect("import");
    assert_eq!(imported, vec![certificate_area()]);
}

#[test]
fn courses_import_and_export() {
    let (service, _) = build_service();
    assert!(matches!(service.courses(&term()), Err(ApiError::NotFound(_))));

    let bytes = write_courses(&courses()).expect("workbook");
    service
        .import_courses(&term(), &encode(bytes))
        .expect("import");
    assert_eq!(service.courses(&term()).expect("courses"), courses());

    let export = service.export_courses(&term()).expect("export");
    assert_eq!(export.file_name, "courses_2025_2.xlsx");
}

#[test]
fn activities_are_validated_scored_and_removed() {
    let (service, _) = build_service();
    service.put_areas(&term(), vec![contest_area()]).expect("save");

    let activity = service
        .add_activity(
            &term(),
            "u-1",
            draft("매", json!({ "행사명": "해커톤", "시작일": "2025-09-20" })),
        )
        .expect("add");
    assert_eq!(activity.points, 10.0);

    let unknown_area = service
        .add_activity(&term(), "u-1", draft("없는 영역", json!({})))
        .expect_err("unknown area");
    assert!(matches!(unknown_area, ApiError::Validation(_)));

    let extra_key = service
        .add_activity(&term(), "u-1", draft("매", json!({ "상금": 1 })))
        .expect_err("extra key");
    assert!(matches!(extra_key, ApiError::Validation(_)));

    assert_eq!(service.activities(&term(), "u-1").expect("list").len(), 1);
    let remaining = service
        .remove_activity(&term(), "u-1", &activity.id)
        .expect("remove");
    assert!(remaining.is_empty());
    assert!(matches!(
        service.remove_activity(&term(), "u-1", &activity.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn catalog_course_fills_course_completion_activity() {
    let (service, _) = build_service();
    service
        .put_areas(
            &term(),
            vec![MileageArea::course_completion(COURSE_COMPLETION_AREA_NAME)],
        )
        .expect("areas");
    service.put_courses(&term(), courses()).expect("courses");

    let mut pbl = draft(COURSE_COMPLETION_AREA_NAME, json!({ "성적": "A0" }));
    pbl.course_code = Some("ECE40001".to_string());
    let activity = service.add_activity(&term(), "u-1", pbl).expect("add");

    assert_eq!(activity.points, PBL_COURSE_POINTS);
    assert_eq!(
        activity.data["과목명"],
        FieldValue::String("캡스톤디자인".to_string())
    );

    let mut unknown = draft(COURSE_COMPLETION_AREA_NAME, json!({}));
    unknown.course_code = Some("NOPE".to_string());
    assert!(matches!(
        service.add_activity(&term(), "u-1", unknown),
        Err(ApiError::Validation(_))
    ));
}

#[test]
fn submission_snapshots_activities_and_replaces_previous() {
    let (service, store) = build_service();
    service
        .put_areas(&term(), vec![contest_area(), certificate_area()])
        .expect("areas");

    assert!(matches!(
        service.submit_application(&term(), "u-1"),
        Err(ApiError::Validation(_))
    ));

    service
        .add_activity(&term(), "u-1", draft("매", json!({ "행사명": "해커톤" })))
        .expect("add");
    let first = service.submit_application(&term(), "u-1").expect("submit");
    assert_eq!(first.total_points, 10.0);

    service
        .add_activity(
            &term(),
            "u-1",
            draft("털(자격증 취득)", json!({ "자격증명": "정보처리기사" })),
        )
        .expect("add");
    let second = service.submit_application(&term(), "u-1").expect("resubmit");
    assert_eq!(second.total_points, 40.0);
    assert_eq!(second.student_info.student_number, "21900001");

    let listed = service.applications(&term()).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].activities.len(), 2);
    assert!(store
        .get(&term().submissions("applications").child("u-1"))
        .expect("get")
        .is_some());

    let export = service
        .export_application(&term(), "u-1")
        .expect("export");
    assert_eq!(export.file_name, "mileage_scholarship_21900001.xlsx");
}
