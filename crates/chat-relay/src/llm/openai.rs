//! OpenAI chat-completions provider.

use async_trait::async_trait;
use reqwest::Client;

use super::error::{LLMError, api_error};
use super::provider::LLMProvider;
use super::types::{GenerateRequest, Generation, Message, Role, Usage};

/// Provider for the OpenAI chat-completions API.
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAIProvider {
    #[must_use]
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&to_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response.text().await?;
        let openai_response: Response = serde_json::from_str(&body)?;
        Ok(from_response(openai_response))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct Request {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(serde::Deserialize)]
struct ResponseMessage {
    /// Null when the model answered with a refusal or tool call only.
    content: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_request(request: &GenerateRequest) -> Request {
    let mut messages = Vec::with_capacity(2);
    if let Some(persona) = &request.persona {
        messages.push(Message {
            role: Role::System,
            content: persona.clone(),
        });
    }
    messages.push(Message {
        role: Role::User,
        content: request.message.clone(),
    });

    Request {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

fn from_response(response: Response) -> Generation {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    Generation {
        text,
        usage: response.usage,
    }
}
