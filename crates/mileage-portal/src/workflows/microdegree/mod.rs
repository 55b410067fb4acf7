//! Microdegree (MD) completion: process catalog, completed subjects, the completion
//! evaluator and per-term MD applications.

pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{catalog_template, read_catalog, write_catalog, Catalog};
pub use domain::{CourseType, MdApplication, MdProcess, Subject, SubjectCategory};
pub use evaluation::{evaluate, evaluate_all, ProcessReport, ProcessStatus};
pub use router::microdegree_router;
pub use service::{MicrodegreeService, NO_COMPLETED_PROCESS};
