//! Common types shared by all providers.

use serde::{Deserialize, Serialize};

/// A provider-neutral generation request for one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    /// Instruction prepended to the user message, if persona injection is enabled.
    pub persona: Option<String>,
    pub message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The text produced by a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Reply text; empty when the provider produced none.
    pub text: String,
    pub usage: Option<Usage>,
}

/// A message in an outbound chat-completions request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
