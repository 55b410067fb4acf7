//! `Categories` / `Subjects` workbook used to bulk edit a term's microdegree catalog.

use uuid::Uuid;

use super::domain::{CourseType, Subject, SubjectCategory};
use crate::workflows::spreadsheet::{Cell, SheetReader, SheetWriter, SpreadsheetError, TableRow};

pub const CATEGORY_SHEET: &str = "Categories";
pub const SUBJECT_SHEET: &str = "Subjects";
pub const CATALOG_FILE_NAME: &str = "md-course.xlsx";
pub const CATALOG_TEMPLATE_FILE_NAME: &str = "md-course-template.xlsx";

const CATEGORY_COLUMNS: [&str; 6] = ["number", "type", "code", "name", "processId", "id"];
const SUBJECT_COLUMNS: [&str; 9] = [
    "name",
    "code",
    "credit",
    "department",
    "required",
    "categoryNumber",
    "processId",
    "type",
    "id",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub categories: Vec<SubjectCategory>,
    pub subjects: Vec<Subject>,
}

/// Parses both sheets; the first bad row aborts the whole import.
pub fn read_catalog(bytes: Vec<u8>) -> Result<Catalog, SpreadsheetError> {
    let mut reader = SheetReader::open(bytes)?;

    let categories_table = reader.table(CATEGORY_SHEET)?;
    categories_table.require_column("number")?;
    categories_table.require_column("name")?;
    let categories = categories_table
        .rows()
        .map(|row| category_from_row(&row))
        .collect::<Result<Vec<_>, _>>()?;

    let subjects_table = reader.table(SUBJECT_SHEET)?;
    subjects_table.require_column("code")?;
    subjects_table.require_column("categoryNumber")?;
    let subjects = subjects_table
        .rows()
        .map(|row| subject_from_row(&row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Catalog {
        categories,
        subjects,
    })
}

fn category_from_row(row: &TableRow<'_>) -> Result<SubjectCategory, SpreadsheetError> {
    Ok(SubjectCategory {
        number: row.required_count("number")?,
        name: row.required_text("name")?,
        course_type: row.text("type").map(CourseType::from).unwrap_or_default(),
        code: row.text("code").unwrap_or_default(),
        process_id: row.text("processId").unwrap_or_default(),
        id: row.text("id").unwrap_or_else(new_id),
    })
}

fn subject_from_row(row: &TableRow<'_>) -> Result<Subject, SpreadsheetError> {
    Ok(Subject {
        category_number: row.required_count("categoryNumber")?,
        code: row.required_text("code")?,
        name: row.text("name").unwrap_or_default(),
        credit: row.number_value("credit")?.unwrap_or_default(),
        department: row.text("department").unwrap_or_default(),
        required: row.bool_value("required")?.unwrap_or_default(),
        process_id: row.text("processId").unwrap_or_default(),
        id: row.text("id").unwrap_or_else(new_id),
        course_type: row.text("type").map(CourseType::from),
    })
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn text_or_blank(value: &str) -> Cell {
    if value.is_empty() {
        Cell::Blank
    } else {
        Cell::Text(value.to_string())
    }
}

fn header(columns: &[&str]) -> Vec<Cell> {
    columns.iter().map(|column| Cell::from(*column)).collect()
}

pub fn write_catalog(catalog: &Catalog) -> Result<Vec<u8>, SpreadsheetError> {
    let mut category_rows = vec![header(&CATEGORY_COLUMNS)];
    category_rows.extend(catalog.categories.iter().map(|category| {
        vec![
            Cell::Number(f64::from(category.number)),
            text_or_blank(category.course_type.label()),
            text_or_blank(&category.code),
            text_or_blank(&category.name),
            text_or_blank(&category.process_id),
            text_or_blank(&category.id),
        ]
    }));

    let mut subject_rows = vec![header(&SUBJECT_COLUMNS)];
    subject_rows.extend(catalog.subjects.iter().map(|subject| {
        vec![
            text_or_blank(&subject.name),
            text_or_blank(&subject.code),
            Cell::Number(subject.credit),
            text_or_blank(&subject.department),
            Cell::Bool(subject.required),
            Cell::Number(f64::from(subject.category_number)),
            text_or_blank(&subject.process_id),
            subject
                .course_type
                .as_ref()
                .map_or(Cell::Blank, |course_type| text_or_blank(course_type.label())),
            text_or_blank(&subject.id),
        ]
    }));

    let mut writer = SheetWriter::new();
    writer.sheet(CATEGORY_SHEET, &category_rows)?;
    writer.sheet(SUBJECT_SHEET, &subject_rows)?;
    writer.finish()
}

/// Empty workbook with the expected headers and one sample row per sheet.
pub fn catalog_template() -> Result<Vec<u8>, SpreadsheetError> {
    let sample = Catalog {
        categories: vec![SubjectCategory {
            id: String::new(),
            number: 1,
            course_type: CourseType::Standard,
            code: "AI-STD".to_string(),
            name: "표준 교과목".to_string(),
            process_id: "process-id".to_string(),
        }],
        subjects: vec![Subject {
            id: String::new(),
            process_id: "process-id".to_string(),
            category_number: 1,
            name: "인공지능개론".to_string(),
            credit: 3.0,
            code: "AIE20001".to_string(),
            department: "전산전자공학부".to_string(),
            required: true,
            course_type: None,
        }],
    };
    write_catalog(&sample)
}
