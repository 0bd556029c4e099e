//! Mock probe providers for engine and provider tests.
//!
//! `ScriptedProbe` maps a `key` parameter to a canned behavior and records
//! every invocation, so tests can assert both outcomes and start order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use vigil_core::error::{Result, VigilError};
use vigil_core::traits::ProbeProvider;
use vigil_core::types::ProbeResult;

/// What a scripted probe does when invoked for a given key.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Successful probe observing this value.
    Value(serde_json::Value),
    /// Successful probe observing that the entity is absent.
    Absent,
    /// Ordinary probe failure with this message (`success: false`).
    ProbeFailure(String),
    /// Internal fault: the provider returns `Err`.
    InternalError(String),
    /// Never completes until the cancellation token fires.
    HangUntilCancelled,
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub key: String,
    pub started: Instant,
}

/// Cloneable handle onto a probe's invocation log.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// Keys in invocation order.
    pub fn started_keys(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|c| c.key.clone()).collect()
    }

    fn record(&self, key: &str) {
        self.0.lock().unwrap().push(Call {
            key: key.to_string(),
            started: Instant::now(),
        });
    }
}

#[derive(Deserialize)]
struct ScriptedParams {
    key: String,
}

struct Script {
    behavior: Behavior,
    delay: Option<Duration>,
}

/// A probe provider driven entirely by a per-key script.
pub struct ScriptedProbe {
    name: String,
    scripts: HashMap<String, Script>,
    log: CallLog,
}

impl ScriptedProbe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: HashMap::new(),
            log: CallLog::default(),
        }
    }

    /// Script the behavior for a key.
    pub fn on(mut self, key: impl Into<String>, behavior: Behavior) -> Self {
        self.scripts.insert(
            key.into(),
            Script {
                behavior,
                delay: None,
            },
        );
        self
    }

    /// Script a behavior that takes `delay` of (possibly virtual) time,
    /// observing cancellation while it waits.
    pub fn on_delayed(
        mut self,
        key: impl Into<String>,
        behavior: Behavior,
        delay: Duration,
    ) -> Self {
        self.scripts.insert(
            key.into(),
            Script {
                behavior,
                delay: Some(delay),
            },
        );
        self
    }

    /// Grab a handle onto the invocation log before handing the probe to a
    /// registry.
    pub fn log_handle(&self) -> CallLog {
        self.log.clone()
    }
}

impl ProbeProvider for ScriptedProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        params: serde_json::Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<ProbeResult>> {
        Box::pin(async move {
            let params: ScriptedParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return Ok(ProbeResult::failure(format!("bad parameters: {e}"))),
            };

            let Some(script) = self.scripts.get(&params.key) else {
                return Ok(ProbeResult::failure(format!(
                    "no script for key '{}'",
                    params.key
                )));
            };

            self.log.record(&params.key);

            if let Some(delay) = script.delay {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(VigilError::Cancelled),
                }
            }

            match &script.behavior {
                Behavior::Value(value) => Ok(ProbeResult::found(value.clone())
                    .with_metadata("key", params.key)),
                Behavior::Absent => Ok(ProbeResult::absent("scripted absent")),
                Behavior::ProbeFailure(message) => Ok(ProbeResult::failure(message.clone())),
                Behavior::InternalError(message) => Err(VigilError::ProbeExecution {
                    provider: self.name.clone(),
                    message: message.clone(),
                }),
                Behavior::HangUntilCancelled => {
                    cancel.cancelled().await;
                    Err(VigilError::Cancelled)
                }
            }
        })
    }
}
