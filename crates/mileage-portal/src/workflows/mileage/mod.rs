//! Mileage scholarship: scoring areas, the course catalog, student activities and the
//! per-term scholarship application.

pub mod domain;
pub mod router;
pub(crate) mod schema;
pub mod service;
pub mod workbook;

#[cfg(test)]
mod tests;

pub use domain::{
    Activity, ActivityDraft, Application, Course, Field, FieldType, FieldValue, MileageArea,
    COURSE_COMPLETION_AREA_NAME, PBL_COURSE_POINTS,
};
pub use router::mileage_router;
pub use schema::build_activity;
pub use service::MileageService;
