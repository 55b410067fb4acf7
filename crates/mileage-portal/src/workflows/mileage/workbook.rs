//! Mileage spreadsheets: per-area field schemas, the course catalog and application exports.

use super::domain::{Application, Course, Field, FieldType, MileageArea};
use crate::workflows::spreadsheet::{
    cell_bool, cell_number, cell_text, Cell, SheetReader, SheetWriter, SpreadsheetError,
};

pub const AREAS_FILE_NAME: &str = "mileage-areas.xlsx";
pub const AREAS_TEMPLATE_FILE_NAME: &str = "mileage-template.xlsx";
pub const COURSES_TEMPLATE_FILE_NAME: &str = "course-template.xlsx";
pub const COURSE_SHEET: &str = "Courses";
pub const STUDENT_SHEET: &str = "학생 정보";

const FIELD_NAME_HEADER: &str = "필드 이름";
const FIELD_TYPE_HEADER: &str = "필드 타입";
const POINTS_MARKER: &str = "항목 당 기본 점수";
const COURSE_COMPLETION_MARKER: &str = "교과목 이수 영역";

pub fn courses_file_name(year: &str, semester: &str) -> String {
    format!("courses_{year}_{semester}.xlsx")
}

pub fn application_file_name(student_number: &str) -> String {
    format!("mileage_scholarship_{student_number}.xlsx")
}

/// One area per sheet. The row carrying the points marker in column D holds the default
/// points in E (and optionally the course-completion flag in F/G); other rows list
/// `field name | field type`.
pub fn read_areas(bytes: Vec<u8>) -> Result<Vec<MileageArea>, SpreadsheetError> {
    let mut reader = SheetReader::open(bytes)?;
    let mut areas = Vec::new();

    for sheet in reader.sheet_names() {
        let rows = reader.rows(&sheet)?;
        let mut default_points = None;
        let mut is_course_completion = false;
        let mut fields = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let text = |column: usize| row.get(column).and_then(cell_text);

            if text(3).as_deref() == Some(POINTS_MARKER) {
                let points = row.get(4).and_then(cell_number).ok_or_else(|| {
                    SpreadsheetError::InvalidPoints {
                        sheet: sheet.clone(),
                    }
                })?;
                default_points = Some(points);

                if text(5).as_deref() == Some(COURSE_COMPLETION_MARKER) {
                    is_course_completion = match row.get(6) {
                        Some(cell) if cell_text(cell).is_some() => {
                            cell_bool(cell).ok_or_else(|| SpreadsheetError::InvalidValue {
                                sheet: sheet.clone(),
                                row: index + 1,
                                field: COURSE_COMPLETION_MARKER,
                                value: cell_text(cell).unwrap_or_default(),
                            })?
                        }
                        _ => false,
                    };
                }
                continue;
            }

            let (Some(name), Some(raw_type)) = (text(0), text(1)) else {
                continue;
            };
            if index == 0 && (name == FIELD_NAME_HEADER || name == FIELD_TYPE_HEADER) {
                continue;
            }
            let field_type =
                FieldType::parse(&raw_type).ok_or_else(|| SpreadsheetError::InvalidFieldType {
                    sheet: sheet.clone(),
                    row: index + 1,
                    value: raw_type.clone(),
                })?;
            fields.push(Field { name, field_type });
        }

        let default_points =
            default_points.ok_or_else(|| SpreadsheetError::InvalidPoints {
                sheet: sheet.clone(),
            })?;
        areas.push(MileageArea {
            name: sheet,
            default_points,
            fields,
            is_course_completion,
        });
    }

    Ok(areas)
}

pub fn write_areas(areas: &[MileageArea]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut writer = SheetWriter::new();
    for area in areas {
        let mut rows = vec![vec![
            FIELD_NAME_HEADER.into(),
            FIELD_TYPE_HEADER.into(),
            Cell::Blank,
            POINTS_MARKER.into(),
            area.default_points.into(),
            COURSE_COMPLETION_MARKER.into(),
            area.is_course_completion.into(),
        ]];
        rows.extend(area.fields.iter().map(|field| {
            vec![
                Cell::from(field.name.as_str()),
                Cell::from(field.field_type.label()),
            ]
        }));
        writer.sheet(&area.name, &rows)?;
    }
    writer.finish()
}

pub fn areas_template() -> Result<Vec<u8>, SpreadsheetError> {
    write_areas(&[MileageArea {
        name: "매".to_string(),
        default_points: 10.0,
        fields: vec![
            Field::new("행사명", FieldType::String),
            Field::new("주관대학", FieldType::String),
            Field::new("시작일", FieldType::Date),
            Field::new("종료일", FieldType::Date),
            Field::new("년도", FieldType::Number),
            Field::new("학기", FieldType::Number),
            Field::new("수상내역", FieldType::String),
            Field::new("비고", FieldType::String),
        ],
        is_course_completion: false,
    }])
}

/// First sheet, header `code | name | credit | isPBL`.
pub fn read_courses(bytes: Vec<u8>) -> Result<Vec<Course>, SpreadsheetError> {
    let mut reader = SheetReader::open(bytes)?;
    let first = reader
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| SpreadsheetError::MissingSheet {
            sheet: COURSE_SHEET.to_string(),
        })?;
    let table = reader.table(&first)?;
    table.require_column("code")?;
    table.require_column("name")?;

    table
        .rows()
        .map(|row| -> Result<Course, SpreadsheetError> {
            Ok(Course {
                code: row.required_text("code")?,
                name: row.required_text("name")?,
                credit: row.number_value("credit")?.unwrap_or_default(),
                is_pbl: row.bool_value("isPBL")?.unwrap_or_default(),
            })
        })
        .collect()
}

pub fn write_courses(courses: &[Course]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut rows = vec![vec![
        "code".into(),
        "name".into(),
        "credit".into(),
        "isPBL".into(),
    ]];
    rows.extend(courses.iter().map(|course| {
        vec![
            Cell::from(course.code.as_str()),
            Cell::from(course.name.as_str()),
            course.credit.into(),
            course.is_pbl.into(),
        ]
    }));

    let mut writer = SheetWriter::new();
    writer.sheet(COURSE_SHEET, &rows)?;
    writer.finish()
}

pub fn courses_template() -> Result<Vec<u8>, SpreadsheetError> {
    write_courses(&[Course {
        code: "ECE20010".to_string(),
        name: "자료구조".to_string(),
        credit: 3.0,
        is_pbl: false,
    }])
}

/// Student sheet followed by one sheet per area listing that area's activities.
pub fn write_application(
    application: &Application,
    areas: &[MileageArea],
) -> Result<Vec<u8>, SpreadsheetError> {
    let info = &application.student_info;
    let total: f64 = application.activities.iter().map(|a| a.points).sum();
    let student_rows: Vec<Vec<Cell>> = vec![
        vec!["학번".into(), info.student_number.as_str().into()],
        vec!["이름".into(), info.name.as_str().into()],
        vec!["학부(학과)".into(), info.department.as_str().into()],
        vec!["전공".into(), info.major.as_str().into()],
        vec!["학년".into(), info.grade.as_str().into()],
        vec!["학기".into(), info.semester.as_str().into()],
        vec!["이메일".into(), info.email.as_str().into()],
        vec!["총 점수".into(), total.into()],
    ];

    let mut writer = SheetWriter::new();
    writer.sheet(STUDENT_SHEET, &student_rows)?;

    for area in areas {
        let mut header = vec![Cell::from("순번")];
        header.extend(area.fields.iter().map(|field| Cell::from(field.name.as_str())));
        header.push("점수".into());

        let mut rows = vec![header];
        let activities = application
            .activities
            .iter()
            .filter(|activity| activity.area == area.name);
        for (index, activity) in activities.enumerate() {
            let mut row = vec![Cell::Number((index + 1) as f64)];
            row.extend(area.fields.iter().map(|field| {
                activity
                    .data
                    .get(&field.name)
                    .map_or(Cell::Blank, |value| Cell::Text(value.to_string()))
            }));
            row.push(activity.points.into());
            rows.push(row);
        }
        writer.sheet(&area.name, &rows)?;
    }

    writer.finish()
}
