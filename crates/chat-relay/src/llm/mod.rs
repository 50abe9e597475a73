//! LLM provider clients for single-turn text generation.

mod error;
mod gemini;
mod openai;
mod provider;
mod types;

pub use error::LLMError;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use provider::{LLMProvider, Provider};
pub use types::{GenerateRequest, Generation, Message, Role, Usage};
