use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use vigil_core::error::{Result, VigilError};
use vigil_core::traits::ProbeProvider;
use vigil_core::types::ProbeResult;

/// Runs an executable and reports its exit status and trimmed stdout as
/// `{ "status": i64, "stdout": string }`. Observes cancellation while the
/// child runs.
pub struct CommandProbe;

#[derive(Deserialize)]
struct CommandParams {
    program: String,
    #[serde(default)]
    args: Vec<String>,
}

impl ProbeProvider for CommandProbe {
    fn name(&self) -> &str {
        "command"
    }

    fn execute(
        &self,
        params: serde_json::Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>> {
        Box::pin(async move {
            let p: CommandParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return Ok(ProbeResult::failure(format!("bad parameters: {e}"))),
            };

            if cancel.is_cancelled() {
                return Err(VigilError::Cancelled);
            }

            let output = tokio::select! {
                output = tokio::process::Command::new(&p.program).args(&p.args).output() => output,
                _ = cancel.cancelled() => return Err(VigilError::Cancelled),
            };

            let output = match output {
                Ok(output) => output,
                Err(e) => {
                    return Ok(ProbeResult::failure(format!("{}: {e}", p.program)));
                }
            };

            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let status = output.status.code().unwrap_or(-1);
            Ok(ProbeResult::found(serde_json::json!({
                "status": status,
                "stdout": stdout,
            }))
            .with_metadata("program", p.program))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn captures_status_and_stdout() {
        let result = CommandProbe
            .execute(
                json!({ "program": "echo", "args": ["compliant"] }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.success);
        let value = result.value.unwrap();
        assert_eq!(value["status"], json!(0));
        assert_eq!(value["stdout"], json!("compliant"));
    }

    #[tokio::test]
    async fn missing_executable_is_a_probe_failure() {
        let result = CommandProbe
            .execute(
                json!({ "program": "vigil-no-such-binary" }),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("vigil-no-such-binary"));
    }

    #[tokio::test]
    async fn already_cancelled_token_aborts_the_probe() {
        let token = CancellationToken::new();
        token.cancel();
        let err = CommandProbe
            .execute(json!({ "program": "sleep", "args": ["60"] }), token)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Cancelled));
    }
}
