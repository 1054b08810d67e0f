use super::{convert, sse, ChatCompletionRequest, ChatCompletionResponse, OpenAiConfig};
use async_trait::async_trait;
use quire_core::{GenerateRequest, GenerateResponse};
use quire_error::{ConfigError, QuireResult, ServiceError, ServiceErrorKind};
use quire_interface::{GenerationDriver, GenerationStream, Streaming};
use tracing::instrument;

/// Longest error body echoed into a [`ServiceError`].
const ERROR_BODY_PREVIEW: usize = 500;

/// Client for OpenAI-compatible chat completion services.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// The configured timeout bounds connection setup and every read, so a
    /// stalled stream fails instead of hanging.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the HTTP client cannot be built.
    #[instrument(skip(config), fields(api_base = %config.api_base(), model = %config.model()))]
    pub fn new(config: OpenAiConfig) -> Result<Self, ConfigError> {
        tracing::debug!("Creating generation client");
        let client = reqwest::Client::builder()
            .connect_timeout(*config.timeout())
            .read_timeout(*config.timeout())
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, ServiceError> {
        let url = self.config.completions_url();
        tracing::debug!(url = %url, stream = ?request.stream, "Sending chat completion request");

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key())
            .json(request);
        if request.stream != Some(true) {
            builder = builder.timeout(*self.config.timeout());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Request failed: {}", e);
            transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            tracing::error!(status = status.as_u16(), body = %preview, "Service returned error");
            return Err(ServiceError::with_status(
                status.as_u16(),
                format!("{}: {}", status, preview),
            ));
        }

        Ok(response)
    }

    /// Send a single-shot chat completion request
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ServiceError> {
        let response = self.send(request).await?;

        let result = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse response: {}", e);
            if e.is_timeout() {
                transport_error(&e)
            } else {
                ServiceError::new(ServiceErrorKind::Unknown(format!(
                    "Failed to parse response: {}",
                    e
                )))
            }
        })?;

        tracing::debug!("Chat completion successful");
        Ok(result)
    }
}

/// Classify a failure that happened before or while reading a response.
fn transport_error(e: &reqwest::Error) -> ServiceError {
    if let Some(status) = e.status() {
        return ServiceError::with_status(status.as_u16(), e.to_string());
    }
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        ServiceError::new(ServiceErrorKind::TransientNetwork(e.to_string()))
    } else {
        ServiceError::new(ServiceErrorKind::Unknown(e.to_string()))
    }
}

#[async_trait]
impl GenerationDriver for OpenAiClient {
    #[instrument(skip(self, req), fields(provider = "openai", model = %self.config.model()))]
    async fn generate(&self, req: &GenerateRequest) -> QuireResult<GenerateResponse> {
        let chat_request = convert::to_chat_request(req, &self.config, false);
        let response = self.chat_completion(&chat_request).await?;
        Ok(convert::from_chat_response(response)?)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }
}

#[async_trait]
impl Streaming for OpenAiClient {
    #[instrument(skip(self, req), fields(provider = "openai", model = %self.config.model()))]
    async fn generate_stream(&self, req: &GenerateRequest) -> QuireResult<GenerationStream> {
        let chat_request = convert::to_chat_request(req, &self.config, true);
        let response = self.send(&chat_request).await?;

        tracing::debug!("Streaming request accepted, decoding event stream");
        let body = Box::pin(response.bytes_stream());
        Ok(GenerationStream::new(sse::decode_chunks(body)))
    }
}
