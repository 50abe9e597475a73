use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::llm::Provider;

/// Persona used when the config does not override it.
pub const DEFAULT_PERSONA: &str = "You are a helpful assistant specialized in Quantum Mechanics. \
Explain concepts clearly and concisely.";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(origin) = &self.server.cors_origin
            && HeaderValue::from_str(origin).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "server.cors_origin is not a valid header value: {origin:?}"
            )));
        }
        if self.relay.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "relay.max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.relay.temperature) {
            return Err(ConfigError::Invalid(format!(
                "relay.temperature must be between 0 and 1, got {}",
                self.relay.temperature
            )));
        }
        if self.relay.upstream_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "relay.upstream_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.relay.upstream_timeout_seconds >= self.server.request_timeout_seconds {
            return Err(ConfigError::Invalid(format!(
                "relay.upstream_timeout_seconds ({}) must be less than \
                 server.request_timeout_seconds ({})",
                self.relay.upstream_timeout_seconds, self.server.request_timeout_seconds
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Frontend origin allowed to call the relay from a browser.
    /// If not set, no CORS headers are emitted.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_origin: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

// ============================================================================
// RelayConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Defaults to the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    /// Defaults to the provider's public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,
    #[serde(default = "default_inject_persona")]
    pub inject_persona: bool,
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            base_url: None,
            api_key_env: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            upstream_timeout_seconds: default_upstream_timeout(),
            inject_persona: default_inject_persona(),
            persona: default_persona(),
        }
    }
}

impl RelayConfig {
    /// Resolve the provider configuration, reading the API key through `lookup`.
    ///
    /// An unset or empty key resolves to `None`; the relay reports it per request.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> ProviderConfig {
        let kind = self.provider;
        let api_key_env = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.api_key_env().to_string());
        let api_key = lookup(api_key_env.as_str()).filter(|key| !key.is_empty());

        ProviderConfig {
            kind,
            api_key,
            api_key_env,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            params: GenerationParams {
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            },
            persona: self.inject_persona.then(|| self.persona.clone()),
            upstream_timeout: Duration::from_secs(self.upstream_timeout_seconds),
        }
    }

    /// Resolve against the process environment.
    pub fn resolve_from_env(&self) -> ProviderConfig {
        self.resolve(|name| std::env::var(name).ok())
    }
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_inject_persona() -> bool {
    true
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

// ============================================================================
// ProviderConfig
// ============================================================================

/// Immutable provider settings, resolved once at startup.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: Provider,
    pub api_key: Option<String>,
    /// Where the key was expected, for operator-facing messages.
    pub api_key_env: String,
    pub model: String,
    pub base_url: String,
    pub params: GenerationParams,
    /// Persona instruction sent with every message, `None` when injection is off.
    pub persona: Option<String>,
    pub upstream_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .field("persona", &self.persona)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert!(config.server.cors_origin.is_none());
        assert_eq!(config.relay.provider, Provider::Gemini);
        assert_eq!(config.relay.max_tokens, 500);
        assert_eq!(config.relay.temperature, 0.7);
        assert_eq!(config.relay.upstream_timeout_seconds, 30);
        assert!(config.relay.inject_persona);
        assert_eq!(config.relay.persona, DEFAULT_PERSONA);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(&missing_path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.relay.provider, Provider::Gemini);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 20
  cors_origin: "https://quantum.example.app"
relay:
  provider: openai
  model: gpt-4o-mini
  base_url: "http://localhost:9999/v1/"
  api_key_env: RELAY_KEY
  max_tokens: 128
  temperature: 0.2
  upstream_timeout_seconds: 5
  inject_persona: false
  persona: "Answer like a pirate."
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 20);
        assert_eq!(
            config.server.cors_origin.as_deref(),
            Some("https://quantum.example.app")
        );
        assert_eq!(config.relay.provider, Provider::OpenAI);
        assert_eq!(config.relay.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.relay.api_key_env.as_deref(), Some("RELAY_KEY"));
        assert_eq!(config.relay.max_tokens, 128);
        assert_eq!(config.relay.temperature, 0.2);
        assert_eq!(config.relay.upstream_timeout_seconds, 5);
        assert!(!config.relay.inject_persona);
        assert_eq!(config.relay.persona, "Answer like a pirate.");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
relay:
  provider: openai
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.port, 8080); // default
        assert_eq!(config.relay.provider, Provider::OpenAI);
        assert_eq!(config.relay.max_tokens, 500); // default
        assert!(config.relay.model.is_none());
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_params() {
        let mut config = Config::default();
        config.relay.temperature = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.relay.max_tokens = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.relay.upstream_timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.server.cors_origin = Some("https://bad\norigin".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.relay.upstream_timeout_seconds = config.server.request_timeout_seconds;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.server.request_timeout_seconds = 10;
        config.relay.upstream_timeout_seconds = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.server.request_timeout_seconds = 31;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_uses_provider_defaults() {
        let relay = RelayConfig::default();
        let resolved = relay.resolve(env(&[
            ("GEMINI_API_KEY", "g-key"),
            ("OPENAI_API_KEY", "o-key"),
        ]));

        assert_eq!(resolved.kind, Provider::Gemini);
        assert_eq!(resolved.api_key.as_deref(), Some("g-key"));
        assert_eq!(resolved.api_key_env, "GEMINI_API_KEY");
        assert_eq!(resolved.model, "gemini-pro");
        assert_eq!(
            resolved.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(resolved.params.max_tokens, 500);
        assert_eq!(resolved.persona.as_deref(), Some(DEFAULT_PERSONA));
        assert_eq!(resolved.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_openai_reads_openai_key() {
        let relay = RelayConfig {
            provider: Provider::OpenAI,
            ..RelayConfig::default()
        };
        let resolved = relay.resolve(env(&[("OPENAI_API_KEY", "o-key")]));
        assert_eq!(resolved.api_key.as_deref(), Some("o-key"));
        assert_eq!(resolved.model, "gpt-3.5-turbo");
        assert_eq!(resolved.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_resolve_custom_key_env_and_trailing_slash() {
        let relay = RelayConfig {
            provider: Provider::OpenAI,
            api_key_env: Some("RELAY_KEY".to_string()),
            base_url: Some("http://localhost:9999/v1/".to_string()),
            ..RelayConfig::default()
        };
        let resolved = relay.resolve(env(&[
            ("RELAY_KEY", "secret"),
            ("OPENAI_API_KEY", "other"),
        ]));
        assert_eq!(resolved.api_key.as_deref(), Some("secret"));
        assert_eq!(resolved.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_resolve_missing_or_empty_key_is_none() {
        let relay = RelayConfig::default();
        assert!(relay.resolve(env(&[])).api_key.is_none());
        assert!(relay.resolve(env(&[("GEMINI_API_KEY", "")])).api_key.is_none());
    }

    #[test]
    fn test_resolve_persona_disabled() {
        let relay = RelayConfig {
            inject_persona: false,
            ..RelayConfig::default()
        };
        assert!(relay.resolve(env(&[])).persona.is_none());
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let resolved =
            RelayConfig::default().resolve(env(&[("GEMINI_API_KEY", "super-secret")]));
        let debug = format!("{resolved:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_error_display() {
        let io_error = ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ));
        assert!(io_error.to_string().contains("failed to read config file"));
    }
}
