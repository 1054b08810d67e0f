//! Generation service clients for Quire.
//!
//! The OpenAI-compatible client speaks the chat completions protocol in
//! both single-shot and server-sent-event streaming modes. The `mock`
//! feature adds a scripted driver for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod openai;
#[cfg(feature = "mock")]
mod mock;

pub use openai::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChunkChoice,
    Choice, Delta, MAX_OUTPUT_TOKENS_CAP, OpenAiClient, OpenAiConfig, OpenAiConfigBuilder, Usage,
};
#[cfg(feature = "mock")]
pub use mock::{MockStep, ScriptedDriver};
