use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use vigil_core::error::Result;
use vigil_core::traits::ProbeProvider;
use vigil_core::types::ProbeResult;

/// Probes an environment variable of the auditing process. An unset
/// variable is an absent observation, not a failure.
pub struct EnvProbe;

#[derive(Deserialize)]
struct EnvParams {
    name: String,
}

impl ProbeProvider for EnvProbe {
    fn name(&self) -> &str {
        "env"
    }

    fn execute(
        &self,
        params: serde_json::Value,
        _cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>> {
        Box::pin(async move {
            let p: EnvParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return Ok(ProbeResult::failure(format!("bad parameters: {e}"))),
            };
            let result = match std::env::var(&p.name) {
                Ok(value) => ProbeResult::found(serde_json::json!(value)),
                Err(std::env::VarError::NotPresent) => {
                    ProbeResult::absent(format!("{} is not set", p.name))
                }
                Err(e) => ProbeResult::failure(format!("{}: {e}", p.name)),
            };
            Ok(result.with_metadata("variable", p.name))
        })
    }
}
