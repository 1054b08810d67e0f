//! Immutable client configuration.

use quire_error::ConfigError;
use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Connection settings for an [`OpenAiClient`](crate::OpenAiClient).
///
/// The value is fixed at client construction; nothing reads credentials
/// from process-wide state afterwards.
///
/// # Examples
///
/// ```
/// use quire_models::OpenAiConfig;
/// use std::time::Duration;
///
/// let config = OpenAiConfig::builder()
///     .api_key("sk-test")
///     .model("gpt-4o-mini")
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.api_base(), "https://api.openai.com/v1");
/// assert_eq!(*config.max_tokens(), 2000);
/// ```
#[derive(Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OpenAiConfig {
    /// Base URL, without the `/chat/completions` suffix
    #[builder(default = "DEFAULT_API_BASE.to_string()")]
    api_base: String,
    /// Bearer credential
    api_key: String,
    /// Default model id
    #[builder(default = "\"gpt-3.5-turbo\".to_string()")]
    model: String,
    /// Default sampling temperature
    #[builder(default = "0.7")]
    temperature: f32,
    /// Default output token limit
    #[builder(default = "2000")]
    max_tokens: u32,
    /// Connect timeout and the longest silence tolerated while reading
    #[builder(default = "Duration::from_secs(120)")]
    timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl OpenAiConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err("api_key must not be empty".to_string());
            }
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("temperature must be within [0, 2], got {}", temperature));
            }
        }
        Ok(())
    }

    /// Build, reporting problems as a [`ConfigError`].
    pub fn build_config(&self) -> Result<OpenAiConfig, ConfigError> {
        self.build().map_err(|e| ConfigError::new(e.to_string()))
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}
