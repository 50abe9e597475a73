//! Chat Relay - forwards a single chat message to OpenAI or Gemini and relays the reply.

pub mod config;
pub mod handlers;
pub mod llm;
pub mod relay;
pub mod response;
pub mod server;
