//! Trait definitions for generation service backends.

use crate::GenerationStream;
use async_trait::async_trait;
use quire_core::{GenerateRequest, GenerateResponse};
use quire_error::QuireResult;

/// Core trait that all generation backends must implement.
#[async_trait]
pub trait GenerationDriver: Send + Sync {
    /// Generate a complete response in a single call.
    async fn generate(&self, req: &GenerateRequest) -> QuireResult<GenerateResponse>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier used when the request names none.
    fn model_name(&self) -> &str;
}

/// Trait for backends that support streaming responses.
#[async_trait]
pub trait Streaming: GenerationDriver {
    /// Open a streaming response.
    ///
    /// The returned handle yields fragments as they arrive. Dropping or
    /// closing it releases the underlying connection.
    async fn generate_stream(&self, req: &GenerateRequest) -> QuireResult<GenerationStream>;

    /// Issue a request in either mode.
    async fn call(&self, req: &GenerateRequest, streaming: bool) -> QuireResult<GenerationOutput> {
        if streaming {
            Ok(GenerationOutput::Stream(self.generate_stream(req).await?))
        } else {
            Ok(GenerationOutput::Complete(self.generate(req).await?))
        }
    }
}

/// Result of [`Streaming::call`]: the full text or a fragment producer.
#[derive(Debug)]
pub enum GenerationOutput {
    /// Single-shot response
    Complete(GenerateResponse),
    /// Streaming response handle
    Stream(GenerationStream),
}
