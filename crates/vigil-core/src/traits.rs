use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::ProbeResult;

/// Probe provider — retrieves one piece of system state.
///
/// Ordinary failures (path not found, access denied, malformed parameters)
/// must be reported as `Ok(ProbeResult { success: false, .. })`, never as
/// `Err`. `Err(VigilError::Cancelled)` signals that the probe observed
/// cancellation; any other `Err` is an internal fault and is converted to a
/// severity-10 rule failure by the orchestrator.
pub trait ProbeProvider: Send + Sync + 'static {
    /// Provider name, matched case-insensitively against
    /// `RuleDefinition::provider`.
    fn name(&self) -> &str;

    /// Probe the system. `params` is the rule's opaque parameter bag;
    /// providers should deserialize it into a typed struct immediately.
    /// Long-running probes must check `cancel` rather than rely on being
    /// killed.
    fn execute(
        &self,
        params: serde_json::Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>>;
}
