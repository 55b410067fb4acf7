use super::common::*;
use crate::workflows::mileage::domain::{
    Activity, Application, FieldValue, MileageArea, COURSE_COMPLETION_AREA_NAME,
};
use crate::workflows::mileage::workbook::{
    application_file_name, areas_template, courses_file_name, read_areas, read_courses,
    write_application, write_areas, write_courses, STUDENT_SHEET,
};
use crate::workflows::spreadsheet::{Cell, SheetReader, SheetWriter, SpreadsheetError};
use crate::workflows::students::StudentInfo;

#[test]
fn areas_round_trip_including_course_completion_flag() {
    let areas = vec![
        MileageArea::course_completion(COURSE_COMPLETION_AREA_NAME),
        contest_area(),
        certificate_area(),
    ];
    let imported = read_areas(write_areas(&areas).expect("export")).expect("import");
    assert_eq!(imported, areas);
}

#[test]
fn area_sheet_without_course_completion_columns_is_accepted() {
    let mut writer = SheetWriter::new();
    writer
        .sheet(
            "기",
            &[
                vec![
                    "필드 이름".into(),
                    "필드 타입".into(),
                    Cell::Blank,
                    "항목 당 기본 점수".into(),
                    10.0.into(),
                ],
                vec!["행사명".into(), "string".into()],
                vec!["시작일".into(), "date".into()],
            ],
        )
        .expect("sheet");

    let areas = read_areas(writer.finish().expect("bytes")).expect("import");
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].name, "기");
    assert_eq!(areas[0].default_points, 10.0);
    assert_eq!(areas[0].fields.len(), 2);
    assert!(!areas[0].is_course_completion);
}

#[test]
fn unknown_field_type_aborts_import() {
    let mut writer = SheetWriter::new();
    writer
        .sheet(
            "매",
            &[
                vec![
                    "필드 이름".into(),
                    "필드 타입".into(),
                    Cell::Blank,
                    "항목 당 기본 점수".into(),
                    10.0.into(),
                ],
                vec!["행사명".into(), "text".into()],
            ],
        )
        .expect("sheet");

    match read_areas(writer.finish().expect("bytes")) {
        Err(SpreadsheetError::InvalidFieldType { sheet, row, value }) => {
            assert_eq!(sheet, "매");
            assert_eq!(row, 2);
            assert_eq!(value, "text");
        }
        other => panic!("expected invalid field type, got {other:?}"),
    }
}

#[test]
fn non_numeric_points_abort_import() {
    let mut writer = SheetWriter::new();
    writer
        .sheet(
            "매",
            &[vec![
                "필드 이름".into(),
                "필드 타입".into(),
                Cell::Blank,
                "항목 당 기본 점수".into(),
                "열".into(),
            ]],
        )
        .expect("sheet");

    assert!(matches!(
        read_areas(writer.finish().expect("bytes")),
        Err(SpreadsheetError::InvalidPoints { sheet }) if sheet == "매"
    ));
}

#[test]
fn template_parses_into_one_area() {
    let areas = read_areas(areas_template().expect("template")).expect("import");
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].fields.len(), 8);
}

#[test]
fn courses_round_trip() {
    let imported = read_courses(write_courses(&courses()).expect("export")).expect("import");
    assert_eq!(imported, courses());
    assert_eq!(courses_file_name("2025", "2"), "courses_2025_2.xlsx");
}

#[test]
fn application_export_lists_activities_per_area() {
    let mut data = std::collections::BTreeMap::new();
    data.insert("행사명".to_string(), FieldValue::String("해커톤".to_string()));
    data.insert("년도".to_string(), FieldValue::Number(2025.0));
    let application = Application {
        id: "u-1".to_string(),
        activities: vec![Activity {
            id: "a-1".to_string(),
            area: "매".to_string(),
            data,
            points: 10.0,
        }],
        student_info: StudentInfo {
            name: "이한동".to_string(),
            student_number: "21900001".to_string(),
            ..StudentInfo::default()
        },
        total_points: 10.0,
        submitted_at: None,
    };

    let bytes =
        write_application(&application, &[contest_area(), certificate_area()]).expect("export");
    let mut reader = SheetReader::open(bytes).expect("open");
    assert_eq!(
        reader.sheet_names(),
        vec![STUDENT_SHEET, "매", "털(자격증 취득)"]
    );

    let area_rows = reader.table("매").expect("area sheet");
    let rows: Vec<_> = area_rows.rows().collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("순번").as_deref(), Some("1"));
    assert_eq!(rows[0].text("행사명").as_deref(), Some("해커톤"));
    assert_eq!(rows[0].text("년도").as_deref(), Some("2025"));
    assert_eq!(rows[0].text("시작일"), None);
    assert_eq!(rows[0].text("점수").as_deref(), Some("10"));

    assert_eq!(
        application_file_name(&application.student_info.student_number),
        "mileage_scholarship_21900001.xlsx"
    );
}
