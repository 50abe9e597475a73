//! LLM error types.

use thiserror::Error;

/// Read a non-success upstream response into an `Api` error, keeping its body.
pub(super) async fn api_error(response: reqwest::Response) -> LLMError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    LLMError::Api { status, message }
}

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// API returned a success status with a body we could not decode
    #[error("invalid response payload: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The prompt was rejected by the provider's safety filters
    #[error("prompt blocked by provider: {0}")]
    Blocked(String),
}
