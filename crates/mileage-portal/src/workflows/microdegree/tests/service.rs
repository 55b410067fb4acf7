use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::common::*;
use std::sync::Arc;

use crate::error::ApiError;
use crate::storage::{DocumentStore, MemoryDocumentStore};
use crate::workflows::microdegree::catalog::{write_catalog, Catalog, SUBJECT_SHEET};
use crate::workflows::microdegree::domain::{CourseType, MdProcess};
use crate::workflows::microdegree::{MicrodegreeService, NO_COMPLETED_PROCESS};
use crate::workflows::spreadsheet::{Cell, SheetWriter};

#[test]
fn processes_are_not_found_until_first_save() {
    let (service, _) = build_service();
    assert!(matches!(
        service.processes(&term()),
        Err(ApiError::NotFound(_))
    ));

    let mut draft = process("");
    draft.name = "AI 융합".to_string();
    let saved = service.add_process(&term(), draft).expect("add");
    assert!(!saved.id.is_empty());
    assert_eq!(service.processes(&term()).expect("list"), vec![saved]);
}

#[test]
fn update_and_delete_target_process_by_id() {
    let (service, _) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");
    service.add_process(&term(), process("p-2")).expect("add");

    let renamed = MdProcess {
        name: "데이터 사이언스".to_string(),
        min_required_credits: 9.0,
        ..process("ignored")
    };
    let updated = service
        .update_process(&term(), "p-2", renamed)
        .expect("update");
    assert_eq!(updated.id, "p-2");

    service.delete_process(&term(), "p-1").expect("delete");
    let remaining = service.processes(&term()).expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "데이터 사이언스");

    assert!(matches!(
        service.delete_process(&term(), "p-1"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn subjects_must_reference_existing_process() {
    let (service, _) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");

    let error = service
        .put_subjects(&term(), vec![subject("p-9", "X", 3.0)])
        .expect_err("orphan subject");
    assert!(matches!(error, ApiError::Validation(_)));

    let saved = service
        .put_subjects(&term(), vec![subject("p-1", "A", 3.0)])
        .expect("valid subjects");
    assert_eq!(service.subjects(&term()).expect("list"), saved);
}

#[test]
fn failed_import_commits_nothing() {
    let (service, store) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");
    let documents_before = store.len();

    let mut writer = SheetWriter::new();
    writer
        .sheet(
            "Categories",
            &[vec!["number".into(), "name".into()], vec![1.0.into(), "표준".into()]],
        )
        .expect("categories");
    writer
        .sheet(
            SUBJECT_SHEET,
            &[
                vec!["code".into(), "categoryNumber".into(), "processId".into()],
                vec!["A".into(), 1.0.into(), "p-1".into()],
                vec!["B".into(), Cell::Blank, "p-1".into()],
            ],
        )
        .expect("subjects");
    let encoded = STANDARD.encode(writer.finish().expect("bytes"));

    let error = service
        .import_catalog(&term(), &encoded)
        .expect_err("row 3 lacks categoryNumber");
    assert!(matches!(error, ApiError::Spreadsheet(_)));
    assert!(error.to_string().contains(SUBJECT_SHEET));
    assert_eq!(store.len(), documents_before);
    assert!(service.categories(&term()).expect("categories").is_empty());
}

#[test]
fn failed_subject_write_restores_previous_categories() {
    let memory = Arc::new(MemoryDocumentStore::default());
    let seeding = MicrodegreeService::new(memory.clone());
    seeding.add_process(&term(), process("p-1")).expect("add");
    let previous = seeding
        .put_categories(&term(), vec![category("p-1", 1, CourseType::Linked)])
        .expect("categories");

    let service = MicrodegreeService::new(Arc::new(FailingCollection {
        inner: memory.clone(),
        collection: "md-subject",
    }));
    let catalog = Catalog {
        categories: vec![
            category("p-1", 1, CourseType::Standard),
            category("p-1", 2, CourseType::Standard),
        ],
        subjects: vec![subject("p-1", "A", 3.0)],
    };
    let encoded = STANDARD.encode(write_catalog(&catalog).expect("bytes"));

    let error = service
        .import_catalog(&term(), &encoded)
        .expect_err("subjects cannot be written");
    assert!(matches!(error, ApiError::Store { .. }));
    assert_eq!(seeding.categories(&term()).expect("categories"), previous);
}

#[test]
fn failed_first_import_leaves_no_categories() {
    let memory = Arc::new(MemoryDocumentStore::default());
    let service = MicrodegreeService::new(Arc::new(FailingCollection {
        inner: memory.clone(),
        collection: "md-subject",
    }));
    service.add_process(&term(), process("p-1")).expect("add");
    let catalog = Catalog {
        categories: vec![category("p-1", 1, CourseType::Standard)],
        subjects: vec![subject("p-1", "A", 3.0)],
    };
    let encoded = STANDARD.encode(write_catalog(&catalog).expect("bytes"));

    service
        .import_catalog(&term(), &encoded)
        .expect_err("subjects cannot be written");
    assert!(memory
        .get(&term().document("md-category"))
        .expect("get")
        .is_none());
}

#[test]
fn completed_subject_must_belong_to_a_known_process() {
    let (service, store) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");

    let error = service
        .add_completed_subject(&term(), "u-1", subject("p-9", "X", 3.0))
        .expect_err("unknown process");
    assert!(matches!(error, ApiError::Validation(_)));
    assert!(service
        .completed_subjects(&term(), "u-1")
        .expect("list")
        .is_empty());
    assert!(store
        .get(&term().user_document("md-completed-subjects", "u-1"))
        .expect("get")
        .is_none());
}

#[test]
fn import_replaces_catalog_and_export_round_trips() {
    let (service, _) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");
    let catalog = Catalog {
        categories: vec![category("p-1", 1, CourseType::Linked)],
        subjects: vec![subject("p-1", "A", 3.0)],
    };
    let encoded = format!(
        "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,{}",
        STANDARD.encode(write_catalog(&catalog).expect("bytes"))
    );

    let imported = service.import_catalog(&term(), &encoded).expect("import");
    assert_eq!(imported, catalog);

    let export = service.export_catalog(&term()).expect("export");
    assert_eq!(export.file_name, "md-course.xlsx");
    assert_eq!(
        crate::workflows::microdegree::read_catalog(export.bytes).expect("re-read"),
        catalog
    );
}

#[test]
fn completed_subject_inherits_category_type() {
    let (service, _) = build_service();
    service.add_process(&term(), process("p-1")).expect("add");
    service
        .put_categories(&term(), vec![category("p-1", 1, CourseType::Standard)])
        .expect("categories");

    let subjects = service
        .add_completed_subject(&term(), "u-1", subject("p-1", "A", 3.0))
        .expect("add");
    assert_eq!(subjects[0].course_type, Some(CourseType::Standard));

    let again = service
        .add_completed_subject(&term(), "u-1", subject("p-1", "A", 3.0))
        .expect("idempotent");
    assert_eq!(again.len(), 1);

    let remaining = service
        .remove_completed_subject(&term(), "u-1", "p-1-A")
        .expect("remove");
    assert!(remaining.is_empty());
    assert!(matches!(
        service.remove_completed_subject(&term(), "u-2", "p-1-A"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn submission_requires_a_completed_process() {
    let (service, _) = build_service();
    let strict = MdProcess {
        min_required_credits: 6.0,
        ..process("p-1")
    };
    service.add_process(&term(), strict).expect("add");
    service
        .add_completed_subject(&term(), "u-1", subject("p-1", "A", 3.0))
        .expect("add");

    match service.submit_application(&term(), "u-1") {
        Err(ApiError::Validation(message)) => assert_eq!(message, NO_COMPLETED_PROCESS),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn submission_snapshots_subjects_and_student() {
    let (service, store) = build_service();
    service
        .add_process(
            &term(),
            MdProcess {
                min_required_credits: 3.0,
                ..process("p-1")
            },
        )
        .expect("add");
    service.add_process(&term(), process("p-2")).expect("add");
    service
        .add_completed_subject(&term(), "u-1", subject("p-1", "A", 3.0))
        .expect("add");

    let application = service.submit_application(&term(), "u-1").expect("submit");
    assert_eq!(
        application.process_names,
        vec!["p-1 마이크로디그리", "p-2 마이크로디그리"]
    );
    assert_eq!(application.student_info.student_number, "22000001");
    assert!(application.submitted_at.is_some());

    let stored = store
        .get(&term().submissions("md-applications").child("u-1"))
        .expect("get");
    assert!(stored.is_some());

    let listed = service.applications(&term()).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "u-1");
    assert_eq!(service.application(&term(), "u-1").expect("read"), application);
}
