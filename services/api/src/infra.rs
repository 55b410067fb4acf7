use metrics_exporter_prometheus::PrometheusHandle;
use mileage_portal::error::AppError;
use mileage_portal::storage::MemoryBlobStore;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) blobs: Arc<MemoryBlobStore>,
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mileage_portal::workflows::microdegree::MdProcess;

    #[test]
    fn read_json_file_reports_malformed_documents() {
        let dir = std::env::temp_dir();
        let valid = dir.join("mileage-portal-processes.json");
        std::fs::write(&valid, r#"[{ "id": "p-1", "name": "AI", "minRequiredCredits": null }]"#)
            .expect("write fixture");
        let processes: Vec<MdProcess> = read_json_file(&valid).expect("processes parse");
        assert_eq!(processes[0].min_required_credits, 0.0);

        let broken = dir.join("mileage-portal-broken.json");
        std::fs::write(&broken, "{ not json").expect("write fixture");
        let error = read_json_file::<Vec<MdProcess>>(&broken).expect_err("malformed json");
        assert!(matches!(error, AppError::Json(_)));

        let _ = std::fs::remove_file(valid);
        let _ = std::fs::remove_file(broken);
    }
}
