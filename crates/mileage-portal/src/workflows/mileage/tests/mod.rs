mod common;
mod service;
mod workbook;
