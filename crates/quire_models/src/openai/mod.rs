//! OpenAI-compatible chat completions client.

mod client;
mod config;
mod convert;
mod request;
mod response;
mod sse;

pub use client::OpenAiClient;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};
pub use convert::MAX_OUTPUT_TOKENS_CAP;
pub use request::{ChatCompletionRequest, ChatMessage};
pub use response::{ChatCompletionChunk, ChatCompletionResponse, ChunkChoice, Choice, Delta, Usage};
