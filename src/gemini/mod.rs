//! Gemini `generateContent` client and the chat session handle used by the pipeline.

pub mod client;
mod reply;
pub mod session;
pub mod types;

pub use client::{GeminiClient, GeminiError};
pub use session::{ChatModel, GeminiProvider, ModelProvider, SessionMode};
