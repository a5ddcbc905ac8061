//! # Model Gateway
//!
//! A resilient call chain over an ordered backend stack. The gateway walks the
//! stack once, returns the first usable result, and otherwise resolves to the
//! caller's static default. [`ModelGateway::call`] never fails.

pub mod backends;
pub mod extract;
pub mod scripted;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::BackendError;
use crate::models::GatewayConfig;
use backends::{GenerateRequest, ModelBackend};

pub use extract::extract_structured;
pub use scripted::ScriptedBackend;

/// Immutable description of one model call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCallSpec {
    /// Used in attempt logs
    pub agent_label: String,
    pub system_instruction: String,
    pub user_prompt: String,
    /// Returned when every backend fails
    pub default_value: Value,
    pub expect_structured: bool,
    pub use_extended_reasoning: bool,
}

impl ModelCallSpec {
    /// A structured call without extended reasoning.
    pub fn new(
        agent_label: impl Into<String>,
        system_instruction: impl Into<String>,
        user_prompt: impl Into<String>,
        default_value: Value,
    ) -> Self {
        Self {
            agent_label: agent_label.into(),
            system_instruction: system_instruction.into(),
            user_prompt: user_prompt.into(),
            default_value,
            expect_structured: true,
            use_extended_reasoning: false,
        }
    }

    pub fn with_extended_reasoning(mut self) -> Self {
        self.use_extended_reasoning = true;
        self
    }

    /// Return raw text as a JSON string instead of extracting a payload.
    pub fn raw_text(mut self) -> Self {
        self.expect_structured = false;
        self
    }
}

/// The result of a gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub value: Value,
    /// Backend that produced `value`; `None` when it is the static default
    pub backend: Option<String>,
}

impl Generation {
    fn fallback(spec: &ModelCallSpec) -> Self {
        Self {
            value: spec.default_value.clone(),
            backend: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.backend.is_none()
    }
}

/// Ordered backend stack with a per-attempt timeout
#[derive(Clone)]
pub struct ModelGateway {
    backends: Vec<Arc<dyn ModelBackend>>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field(
                "backends",
                &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl Default for ModelGateway {
    fn default() -> Self {
        Self::offline()
    }
}

impl ModelGateway {
    pub fn new(backends: Vec<Arc<dyn ModelBackend>>) -> Self {
        Self {
            backends,
            attempt_timeout: GatewayConfig::default().attempt_timeout(),
        }
    }

    /// A gateway with no backends; every call resolves to its default.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    /// Build the stack from configuration.
    ///
    /// Backends whose credential is missing are skipped with a warning.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let backends = config
            .backends
            .iter()
            .filter_map(|model| match model.create_backend(&config.generation) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!(backend = %model.label(), error = %e, "Skipping backend");
                    None
                }
            })
            .collect();

        Self::new(backends).with_attempt_timeout(config.attempt_timeout())
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn is_offline(&self) -> bool {
        self.backends.is_empty()
    }

    /// Run the call chain. Never fails.
    pub async fn call(&self, spec: &ModelCallSpec) -> Generation {
        if self.backends.is_empty() {
            tracing::debug!(agent = %spec.agent_label, "No backends configured; using default");
            return Generation::fallback(spec);
        }
        if spec.user_prompt.trim().is_empty() {
            tracing::debug!(agent = %spec.agent_label, "Empty prompt; using default");
            return Generation::fallback(spec);
        }

        let request = GenerateRequest {
            system_instruction: &spec.system_instruction,
            user_prompt: &spec.user_prompt,
            include_thoughts: spec.use_extended_reasoning,
        };

        for (attempt, backend) in self.backends.iter().enumerate() {
            match self.attempt(backend.as_ref(), &request, spec.expect_structured).await {
                Ok(value) => {
                    tracing::info!(
                        agent = %spec.agent_label,
                        backend = backend.name(),
                        attempt = attempt + 1,
                        outcome = "ok",
                        "Model call succeeded"
                    );
                    return Generation {
                        value,
                        backend: Some(backend.name().to_string()),
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        agent = %spec.agent_label,
                        backend = backend.name(),
                        attempt = attempt + 1,
                        outcome = "failed",
                        error = %e,
                        "Model call failed; trying next backend"
                    );
                }
            }
        }

        tracing::warn!(agent = %spec.agent_label, "All backends failed; using default");
        Generation::fallback(spec)
    }

    async fn attempt(
        &self,
        backend: &dyn ModelBackend,
        request: &GenerateRequest<'_>,
        expect_structured: bool,
    ) -> Result<Value, BackendError> {
        let text = tokio::time::timeout(self.attempt_timeout, backend.generate(request))
            .await
            .map_err(|_| BackendError::Timeout(self.attempt_timeout.as_millis() as u64))??;

        if expect_structured {
            extract_structured(&text).ok_or(BackendError::Unparseable)
        } else {
            Ok(Value::String(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> ModelCallSpec {
        ModelCallSpec::new("test", "system", "prompt", json!({"fallback": true}))
    }

    #[tokio::test]
    async fn test_all_failing_backends_yield_default() {
        let gateway = ModelGateway::new(vec![
            Arc::new(ScriptedBackend::failing("a")),
            Arc::new(ScriptedBackend::always("b", "no payload here")),
            Arc::new(ScriptedBackend::new("c")),
        ]);

        let generation = gateway.call(&spec()).await;
        assert_eq!(generation.value, json!({"fallback": true}));
        assert!(generation.is_default());
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let first = Arc::new(ScriptedBackend::new("first").reply("```json\n{\"x\":1}\n```"));
        let second = Arc::new(ScriptedBackend::always("second", "{\"x\":2}"));
        let gateway = ModelGateway::new(vec![first.clone(), second.clone()]);

        let generation = gateway.call(&spec()).await;
        assert_eq!(generation.value, json!({"x": 1}));
        assert_eq!(generation.backend.as_deref(), Some("first"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_parse_failure_falls_through_without_retry() {
        let first = Arc::new(ScriptedBackend::always("first", "just prose"));
        let second = Arc::new(ScriptedBackend::always("second", "{\"ok\": 1}"));
        let gateway = ModelGateway::new(vec![first.clone(), second.clone()]);

        let generation = gateway.call(&spec()).await;
        assert_eq!(generation.value, json!({"ok": 1}));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let slow = Arc::new(
            ScriptedBackend::always("slow", "{\"late\": true}").with_delay(Duration::from_secs(5)),
        );
        let fast = Arc::new(ScriptedBackend::always("fast", "{\"late\": false}"));
        let gateway = ModelGateway::new(vec![slow.clone(), fast])
            .with_attempt_timeout(Duration::from_millis(20));

        let generation = gateway.call(&spec()).await;
        assert_eq!(generation.value, json!({"late": false}));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_raw_text_mode_returns_string() {
        let gateway = ModelGateway::new(vec![Arc::new(ScriptedBackend::always(
            "a",
            "plain words",
        ))]);
        let generation = gateway.call(&spec().raw_text()).await;
        assert_eq!(generation.value, json!("plain words"));
    }

    #[tokio::test]
    async fn test_extended_reasoning_sets_include_thoughts() {
        let backend = ScriptedBackend::new("t").with_responder(|req| {
            Ok(format!("{{\"thoughts\": {}}}", req.include_thoughts))
        });
        let gateway = ModelGateway::new(vec![Arc::new(backend)]);

        let generation = gateway.call(&spec().with_extended_reasoning()).await;
        assert_eq!(generation.value, json!({"thoughts": true}));
    }

    #[test]
    fn test_offline_gateway_makes_no_attempt() {
        let gateway = ModelGateway::offline();
        let generation = tokio_test::block_on(gateway.call(&spec()));
        assert!(generation.is_default());
        assert!(gateway.is_offline());
    }

    #[tokio::test]
    async fn test_empty_prompt_skips_backends() {
        let backend = Arc::new(ScriptedBackend::always("a", "{\"x\":1}"));
        let gateway = ModelGateway::new(vec![backend.clone()]);
        let mut empty = spec();
        empty.user_prompt = "   ".to_string();

        assert!(gateway.call(&empty).await.is_default());
        assert_eq!(backend.calls(), 0);
    }
}
