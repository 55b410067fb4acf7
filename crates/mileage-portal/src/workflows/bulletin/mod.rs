//! Notices, downloadable forms and the popup notice shown on the student landing page.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{Form, FormDraft, Notice, NoticeDraft, PopupNotice, PopupNoticeDraft};
pub use router::bulletin_router;
pub use service::BulletinService;
