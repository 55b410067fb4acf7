//! Portal workflows: mileage scholarship, microdegree completion, bulletin board and the
//! student directory, plus the spreadsheet and term plumbing they share.

pub mod bulletin;
pub mod microdegree;
pub mod mileage;
pub(crate) mod serde_util;
pub mod spreadsheet;
pub mod students;
pub mod term;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use term::{CurrentTerm, Term};

/// Decodes an uploaded file sent as base64, with or without a `data:<mime>;base64,` prefix.
pub fn decode_upload(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}
