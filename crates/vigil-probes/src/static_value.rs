use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use vigil_core::error::Result;
use vigil_core::traits::ProbeProvider;
use vigil_core::types::ProbeResult;

/// Returns a value supplied in the rule's parameters verbatim. Useful for
/// constant facts and for exercising conditions without touching the
/// system.
pub struct StaticProbe;

#[derive(Deserialize)]
struct StaticParams {
    #[serde(default)]
    value: serde_json::Value,
}

impl ProbeProvider for StaticProbe {
    fn name(&self) -> &str {
        "static"
    }

    fn execute(
        &self,
        params: serde_json::Value,
        _cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>> {
        Box::pin(async move {
            let p: StaticParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return Ok(ProbeResult::failure(format!("bad parameters: {e}"))),
            };
            if p.value.is_null() {
                Ok(ProbeResult::absent("static value is null"))
            } else {
                Ok(ProbeResult::found(p.value))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_the_configured_value() {
        let result = StaticProbe
            .execute(json!({ "value": 42 }), CancellationToken::new())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.value, Some(json!(42)));
    }

    #[tokio::test]
    async fn null_value_is_absent() {
        let result = StaticProbe
            .execute(json!({}), CancellationToken::new())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.value.is_none());
    }
}
