//! LLM provider trait and provider kinds.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::LLMError;
use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::types::{GenerateRequest, Generation};

/// Trait for LLM providers with different API formats.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate reply text for a single user message.
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, LLMError>;
}

/// Supported upstream providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    #[default]
    Gemini,
}

impl Provider {
    /// Environment variable holding the API key when the config does not name one.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-3.5-turbo",
            Provider::Gemini => "gemini-pro",
        }
    }

    /// Construct the provider implementation for this kind.
    pub fn build(
        &self,
        client: Client,
        base_url: String,
        api_key: String,
    ) -> Arc<dyn LLMProvider> {
        let provider: Arc<dyn LLMProvider> = match self {
            Provider::OpenAI => Arc::new(OpenAIProvider::new(client, base_url, api_key)),
            Provider::Gemini => Arc::new(GeminiProvider::new(client, base_url, api_key)),
        };
        info!(provider = %self, "Registered provider");
        provider
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("unknown provider '{other}' (expected openai or gemini)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serde_names() {
        assert_eq!(serde_json::to_string(&Provider::OpenAI).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&Provider::Gemini).unwrap(), "\"gemini\"");
        assert_eq!(
            serde_json::from_str::<Provider>("\"openai\"").unwrap(),
            Provider::OpenAI
        );
    }

    #[test]
    fn provider_from_str_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("google".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_defaults() {
        assert_eq!(Provider::OpenAI.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(Provider::Gemini.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(Provider::Gemini.default_model(), "gemini-pro");
        assert_eq!(Provider::default(), Provider::Gemini);
    }
}
