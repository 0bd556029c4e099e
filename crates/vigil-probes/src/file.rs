use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use vigil_core::error::Result;
use vigil_core::traits::ProbeProvider;
use vigil_core::types::ProbeResult;

/// Probes one attribute of a filesystem path.
pub struct FileProbe;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileParams {
    path: String,
    /// Which attribute to report: "exists" (default), "size", "is_file",
    /// "is_dir", or "readonly".
    #[serde(default = "default_attribute")]
    attribute: String,
}

fn default_attribute() -> String {
    "exists".to_string()
}

impl ProbeProvider for FileProbe {
    fn name(&self) -> &str {
        "file"
    }

    fn execute(
        &self,
        params: serde_json::Value,
        _cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>> {
        Box::pin(async move {
            let p: FileParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return Ok(ProbeResult::failure(format!("bad parameters: {e}"))),
            };

            let meta = tokio::fs::metadata(&p.path).await;

            let result = match (meta, p.attribute.as_str()) {
                (meta, "exists") => ProbeResult::found(serde_json::json!(meta.is_ok())),
                // Attributes of a path that does not exist are absent
                // observations, so NotExists conditions work on them.
                (Err(_), _) => ProbeResult::absent(format!("{} does not exist", p.path)),
                (Ok(meta), "size") => ProbeResult::found(serde_json::json!(meta.len())),
                (Ok(meta), "is_file") => ProbeResult::found(serde_json::json!(meta.is_file())),
                (Ok(meta), "is_dir") => ProbeResult::found(serde_json::json!(meta.is_dir())),
                (Ok(meta), "readonly") => {
                    ProbeResult::found(serde_json::json!(meta.permissions().readonly()))
                }
                (Ok(_), other) => {
                    return Ok(ProbeResult::failure(format!(
                        "unknown file attribute '{other}'"
                    )))
                }
            };

            Ok(result.with_metadata("path", p.path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn reports_existence_and_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let exists = FileProbe
            .execute(json!({ "path": path }), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(exists.value, Some(json!(true)));
        assert_eq!(exists.metadata.get("path"), Some(&path));

        let size = FileProbe
            .execute(
                json!({ "path": path, "attribute": "size" }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(size.value, Some(json!(5)));
    }

    #[tokio::test]
    async fn missing_path_is_false_for_exists_and_absent_otherwise() {
        let exists = FileProbe
            .execute(
                json!({ "path": "/no/such/path" }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(exists.success);
        assert_eq!(exists.value, Some(json!(false)));

        let size = FileProbe
            .execute(
                json!({ "path": "/no/such/path", "attribute": "size" }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(size.success);
        assert!(size.value.is_none());
    }

    #[tokio::test]
    async fn unknown_attribute_is_a_probe_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileProbe
            .execute(
                json!({ "path": dir.path(), "attribute": "inode" }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("inode"));
    }

    #[tokio::test]
    async fn bad_parameters_are_a_probe_failure() {
        let result = FileProbe
            .execute(json!({ "paht": "/tmp" }), CancellationToken::new())
            .await
            .unwrap();
        assert!(!result.success);
    }
}
