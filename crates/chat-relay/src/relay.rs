//! Chat relay adapter.
//!
//! Validates one inbound chat message, dispatches it to the configured
//! provider, and normalizes the outcome into [`ChatReply`] or [`RelayError`].
//!
//! ```text
//! Start ──► method check ──► body parse ──► api key check ──► provider.generate
//!              │ 405             │ 400            │ 500            │
//!              ▼                 ▼                ▼                ├─ ok, text   ──► 200
//!            Failed            Failed           Failed             ├─ ok, empty  ──► 500
//!                                                                  ├─ err        ──► 500
//!                                                                  └─ timed out  ──► 504
//! ```
//!
//! Every path is terminal: there is no retry and no fallback provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::Method;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ProviderConfig;
use crate::llm::{GenerateRequest, LLMError, LLMProvider};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Successful relay result, serialized as `{"reply": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

// ============================================================================
// RelayError
// ============================================================================

/// Terminal failure of a relayed request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Message is required")]
    MissingMessage,

    /// The provider API key is not configured.
    #[error("Server configuration error")]
    Configuration,

    #[error("Failed to get response from AI. {0}")]
    Upstream(#[from] LLMError),

    #[error("No valid reply received from AI")]
    EmptyReply,

    #[error("Timed out waiting for response from AI after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl RelayError {
    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MethodNotAllowed => 405,
            RelayError::MissingMessage => 400,
            RelayError::Configuration | RelayError::Upstream(_) | RelayError::EmptyReply => 500,
            RelayError::Timeout(_) => 504,
        }
    }
}

// ============================================================================
// ChatRelay
// ============================================================================

/// The relay adapter: one configured provider, no per-request state.
pub struct ChatRelay {
    config: ProviderConfig,
    provider: Option<Arc<dyn LLMProvider>>,
}

impl ChatRelay {
    /// Build the relay and its provider from resolved configuration.
    ///
    /// Without an API key no provider is constructed; every chat request then
    /// fails with [`RelayError::Configuration`].
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        let provider = match &config.api_key {
            Some(key) => Some(
                config
                    .kind
                    .build(client, config.base_url.clone(), key.clone()),
            ),
            None => {
                warn!(
                    provider = %config.kind,
                    env = %config.api_key_env,
                    "No API key configured; chat requests will fail until {} is set",
                    config.api_key_env
                );
                None
            }
        };
        Self { config, provider }
    }

    /// Build the relay around an existing provider implementation.
    pub fn with_provider(config: ProviderConfig, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    /// Whether chat requests can reach a provider.
    pub fn is_ready(&self) -> bool {
        self.config.api_key.is_some() && self.provider.is_some()
    }

    /// Relay one inbound request.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> Result<ChatReply, RelayError> {
        if *method != Method::POST {
            debug!(%method, "Rejected chat request with unsupported method");
            return Err(RelayError::MethodNotAllowed);
        }

        let message = parse_message(body)?;

        let provider = match (&self.config.api_key, &self.provider) {
            (Some(_), Some(provider)) => provider,
            _ => {
                error!(
                    provider = %self.config.kind,
                    env = %self.config.api_key_env,
                    "API key missing; set {} to enable the relay",
                    self.config.api_key_env
                );
                return Err(RelayError::Configuration);
            }
        };

        let request = GenerateRequest {
            model: self.config.model.clone(),
            persona: self.config.persona.clone(),
            message,
            max_tokens: self.config.params.max_tokens,
            temperature: self.config.params.temperature,
        };

        let started = Instant::now();
        let timeout = self.config.upstream_timeout;
        let generation = match tokio::time::timeout(timeout, provider.generate(&request)).await {
            Ok(Ok(generation)) => generation,
            Ok(Err(e)) => {
                error!(provider = %self.config.kind, error = %e, "Provider request failed");
                return Err(RelayError::Upstream(e));
            }
            Err(_elapsed) => {
                error!(
                    provider = %self.config.kind,
                    timeout_secs = timeout.as_secs(),
                    "Provider request timed out"
                );
                return Err(RelayError::Timeout(timeout));
            }
        };

        if generation.text.is_empty() {
            error!(provider = %self.config.kind, "Provider returned no reply text");
            return Err(RelayError::EmptyReply);
        }

        let usage = generation.usage.unwrap_or_default();
        info!(
            provider = %self.config.kind,
            model = %self.config.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Relayed chat reply"
        );

        Ok(ChatReply {
            reply: generation.text,
        })
    }
}

/// Extract a non-empty `message` from a JSON object body.
///
/// Arrays and other non-object bodies are rejected, even when their first
/// element is a string.
fn parse_message(body: &[u8]) -> Result<String, RelayError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Failed to parse chat request body");
        RelayError::MissingMessage
    })?;

    let Value::Object(fields) = value else {
        debug!("Chat request body is not a JSON object");
        return Err(RelayError::MissingMessage);
    };

    match fields.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => Ok(message.to_string()),
        _ => Err(RelayError::MissingMessage),
    }
}

// ============================================================================
// Tests
// ============================================================================
