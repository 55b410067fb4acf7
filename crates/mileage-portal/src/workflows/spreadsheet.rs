//! Workbook plumbing shared by the catalog, area and application spreadsheets.
//!
//! Reading goes through `calamine`, writing through `rust_xlsxwriter`. Row numbers in errors
//! are the 1-based numbers an administrator sees in Excel.

use std::collections::HashMap;
use std::io::Cursor;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("엑셀 파일을 읽을 수 없습니다: {0}")]
    Unreadable(String),
    #[error("업로드된 파일이 올바른 base64 형식이 아닙니다")]
    Encoding,
    #[error("시트 \"{sheet}\"를 찾을 수 없습니다")]
    MissingSheet { sheet: String },
    #[error("시트 \"{sheet}\"에 \"{column}\" 열이 없습니다")]
    MissingColumn { sheet: String, column: &'static str },
    #[error("시트 \"{sheet}\" {row}행: 필수 필드({field})가 누락되었습니다")]
    MissingField {
        sheet: String,
        row: usize,
        field: &'static str,
    },
    #[error("시트 \"{sheet}\" {row}행: {field} 값 \"{value}\"이(가) 올바르지 않습니다")]
    InvalidValue {
        sheet: String,
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error(
        "시트 \"{sheet}\" {row}행에서 발견된 유효하지 않은 필드 유형 \"{value}\"입니다. 허용된 유형은 다음과 같습니다: string, number, date, boolean."
    )]
    InvalidFieldType {
        sheet: String,
        row: usize,
        value: String,
    },
    #[error("시트 \"{sheet}\"에서 항목 당 기본 점수가 올바르지 않습니다.")]
    InvalidPoints { sheet: String },
    #[error("시트 \"{sheet}\"의 \"{value}\" 값이 중복되었습니다")]
    Duplicate { sheet: String, value: String },
    #[error("엑셀 파일을 만들 수 없습니다: {0}")]
    Write(#[from] XlsxError),
}

/// Read side of an uploaded workbook.
pub struct SheetReader {
    workbook: Xlsx<Cursor<Vec<u8>>>,
}

impl SheetReader {
    pub fn open(bytes: Vec<u8>) -> Result<Self, SpreadsheetError> {
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|err: calamine::XlsxError| SpreadsheetError::Unreadable(err.to_string()))?;
        Ok(Self { workbook })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Cells of a sheet laid out from A1, so column indexes match what Excel shows.
    pub fn rows(&mut self, sheet: &str) -> Result<Vec<Vec<Data>>, SpreadsheetError> {
        if !self.sheet_names().iter().any(|name| name == sheet) {
            return Err(SpreadsheetError::MissingSheet {
                sheet: sheet.to_string(),
            });
        }

        let range = self
            .workbook
            .worksheet_range(sheet)
            .map_err(|err| SpreadsheetError::Unreadable(err.to_string()))?;
        Ok(anchored_rows(&range))
    }

    pub fn table(&mut self, sheet: &str) -> Result<SheetTable, SpreadsheetError> {
        let rows = self.rows(sheet)?;
        Ok(SheetTable::from_rows(sheet, rows))
    }
}

fn anchored_rows(range: &Range<Data>) -> Vec<Vec<Data>> {
    let Some((top, left)) = range.start() else {
        return Vec::new();
    };

    let mut rows = vec![Vec::new(); top as usize];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; left as usize];
        cells.extend(row.iter().cloned());
        rows.push(cells);
    }
    rows
}

/// A sheet whose first non-empty row names the columns.
pub struct SheetTable {
    sheet: String,
    header: HashMap<String, usize>,
    rows: Vec<(usize, Vec<Data>)>,
}

impl SheetTable {
    pub fn from_rows(sheet: &str, rows: Vec<Vec<Data>>) -> Self {
        let mut numbered = rows
            .into_iter()
            .enumerate()
            .map(|(index, cells)| (index + 1, cells))
            .filter(|(_, cells)| cells.iter().any(|cell| cell_text(cell).is_some()));

        let header = numbered
            .next()
            .map(|(_, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter_map(|(index, cell)| cell_text(cell).map(|name| (name, index)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sheet: sheet.to_string(),
            header,
            rows: numbered.collect(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn require_column(&self, column: &'static str) -> Result<usize, SpreadsheetError> {
        self.header
            .get(column)
            .copied()
            .ok_or_else(|| SpreadsheetError::MissingColumn {
                sheet: self.sheet.clone(),
                column,
            })
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(move |(number, cells)| TableRow {
            table: self,
            number: *number,
            cells,
        })
    }
}

pub struct TableRow<'a> {
    table: &'a SheetTable,
    number: usize,
    cells: &'a [Data],
}

impl<'a> TableRow<'a> {
    pub fn number(&self) -> usize {
        self.number
    }

    fn cell(&self, column: &str) -> Option<&'a Data> {
        let index = *self.table.header.get(column)?;
        self.cells
            .get(index)
            .filter(|cell| !matches!(cell, Data::Empty))
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.cell(column).and_then(cell_text)
    }

    pub fn required_text(&self, column: &'static str) -> Result<String, SpreadsheetError> {
        self.text(column)
            .ok_or_else(|| SpreadsheetError::MissingField {
                sheet: self.table.sheet.clone(),
                row: self.number,
                field: column,
            })
    }

    pub fn number_value(&self, column: &'static str) -> Result<Option<f64>, SpreadsheetError> {
        match self.cell(column) {
            None => Ok(None),
            Some(cell) => cell_number(cell).map(Some).ok_or_else(|| self.invalid(column, cell)),
        }
    }

    pub fn required_number(&self, column: &'static str) -> Result<f64, SpreadsheetError> {
        self.number_value(column)?
            .ok_or_else(|| SpreadsheetError::MissingField {
                sheet: self.table.sheet.clone(),
                row: self.number,
                field: column,
            })
    }

    /// Whole, positive numbers such as category numbers; `3` and `"3"` are both accepted.
    pub fn required_count(&self, column: &'static str) -> Result<u32, SpreadsheetError> {
        let text = self.required_text(column)?;
        match text.parse::<u32>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(SpreadsheetError::InvalidValue {
                sheet: self.table.sheet.clone(),
                row: self.number,
                field: column,
                value: text,
            }),
        }
    }

    pub fn bool_value(&self, column: &'static str) -> Result<Option<bool>, SpreadsheetError> {
        match self.cell(column) {
            None => Ok(None),
            Some(cell) => cell_bool(cell).map(Some).ok_or_else(|| self.invalid(column, cell)),
        }
    }

    fn invalid(&self, column: &'static str, cell: &Data) -> SpreadsheetError {
        SpreadsheetError::InvalidValue {
            sheet: self.table.sheet.clone(),
            row: self.number,
            field: column,
            value: cell_text(cell).unwrap_or_default(),
        }
    }
}

/// Display text of a cell; integral numbers lose their trailing `.0`.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(value) => value.trim().to_string(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => format_number(*value),
        Data::Bool(value) => value.to_string(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) if value.is_finite() => Some(*value),
        Data::Int(value) => Some(*value as f64),
        _ => None,
    }
}

pub fn cell_bool(cell: &Data) -> Option<bool> {
    match cell {
        Data::Bool(value) => Some(*value),
        Data::String(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Cell content for exported sheets.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// Write side: collects sheets and renders the workbook bytes.
pub struct SheetWriter {
    workbook: Workbook,
}

impl Default for SheetWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
        }
    }

    pub fn sheet(&mut self, name: &str, rows: &[Vec<Cell>]) -> Result<(), SpreadsheetError> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(name)?;

        for (row_index, row) in rows.iter().enumerate() {
            let row_number = row_index as u32;
            for (column_index, cell) in row.iter().enumerate() {
                let column = column_index as u16;
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row_number, column, text.as_str())?;
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(row_number, column, *value)?;
                    }
                    Cell::Bool(value) => {
                        worksheet.write_boolean(row_number, column, *value)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<u8>, SpreadsheetError> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

/// Download produced by an export endpoint.
#[derive(Debug, Clone)]
pub struct SpreadsheetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl IntoResponse for SpreadsheetFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}
