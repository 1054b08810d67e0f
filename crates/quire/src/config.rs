//! Layered application configuration.
//!
//! Sources, later ones overriding earlier:
//! 1. Bundled defaults (`quire.toml` compiled into the binary)
//! 2. `~/.config/quire/quire.toml`
//! 3. `./quire.toml`, or an explicit path
//! 4. `QUIRE__SECTION__KEY` environment variables
//!
//! An empty `openai.api_key` falls back to `OPENAI_API_KEY`, which may come
//! from a `.env` file.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use quire_error::ConfigError;
use quire_models::OpenAiConfig;
use quire_narrative::{GenerationSettings, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../quire.toml");

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
///
/// # Example
///
/// ```no_run
/// use quire::QuireConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = QuireConfig::load(None)?;
/// config.validate()?;
/// let client_config = config.openai_config()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuireConfig {
    /// Generation service settings
    pub openai: OpenAiSection,
    /// Per-kind sampling and streaming settings
    pub generation: GenerationSection,
    /// Local store settings
    pub database: DatabaseSection,
}

/// `[openai]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenAiSection {
    /// Bearer credential
    #[serde(default)]
    pub api_key: String,
    /// Endpoint base URL
    pub api_base: String,
    /// Model id
    pub model: String,
    /// Default sampling temperature
    pub temperature: f64,
    /// Default output token limit
    pub max_tokens: u32,
    /// Connect and read timeout
    pub timeout_secs: u64,
}

/// `[generation]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationSection {
    /// Stream responses as they are produced
    pub streaming: bool,
    /// Longest pause between progress flushes
    pub flush_interval_ms: u64,
    /// Outline requests
    pub outline: SamplingSection,
    /// Chapter requests
    pub content: SamplingSection,
}

/// Sampling settings for one generation kind.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SamplingSection {
    /// Sampling temperature
    pub temperature: f64,
    /// Output token limit
    pub max_tokens: u32,
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseSection {
    /// SQLite file path
    pub path: String,
}

impl QuireConfig {
    /// Load and merge every source.
    ///
    /// With `path` set, that file replaces `./quire.toml` and must exist.
    /// The result is not validated; call [`validate`](Self::validate) before
    /// building a client from it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a source cannot be read or parsed.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(env_file) => debug!(path = %env_file.display(), "Loaded .env"),
            Err(e) => debug!(error = %e, "No .env loaded"),
        }

        let mut builder = defaults();
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/quire/quire.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("quire").required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix("QUIRE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config = build(builder)?;
        if config.openai.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                debug!("Using API key from {}", API_KEY_ENV);
                config.openai.api_key = key;
            }
        }

        debug!(model = %config.openai.model, database = %config.database.path, "Configuration loaded");
        Ok(config)
    }

    /// Bundled defaults overlaid with a TOML document. No other source is read.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document does not parse.
    pub fn from_toml(overrides: &str) -> Result<Self, ConfigError> {
        build(defaults().add_source(File::from_str(overrides, FileFormat::Toml)))
    }

    /// Check credentials and value ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.trim().is_empty() {
            return Err(ConfigError::new(format!(
                "openai.api_key is not set (set it in quire.toml, QUIRE__OPENAI__API_KEY or {})",
                API_KEY_ENV
            )));
        }
        if self.openai.api_base.trim().is_empty() {
            return Err(ConfigError::new("openai.api_base must not be empty"));
        }
        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::new("openai.model must not be empty"));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::new("database.path must not be empty"));
        }

        check_sampling("openai", self.openai.temperature, self.openai.max_tokens)?;
        check_sampling(
            "generation.outline",
            self.generation.outline.temperature,
            self.generation.outline.max_tokens,
        )?;
        check_sampling(
            "generation.content",
            self.generation.content.temperature,
            self.generation.content.max_tokens,
        )?;

        if self.openai.timeout_secs == 0 {
            return Err(ConfigError::new("openai.timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Generation client settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the client builder rejects a value.
    pub fn openai_config(&self) -> Result<OpenAiConfig, ConfigError> {
        OpenAiConfig::builder()
            .api_key(self.openai.api_key.clone())
            .api_base(self.openai.api_base.clone())
            .model(self.openai.model.clone())
            .temperature(self.openai.temperature as f32)
            .max_tokens(self.openai.max_tokens)
            .timeout(Duration::from_secs(self.openai.timeout_secs))
            .build_config()
    }

    /// Orchestrator settings, with `streaming` overridden when set.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the pipeline builder rejects a value.
    pub fn pipeline_config(&self, streaming: Option<bool>) -> Result<PipelineConfig, ConfigError> {
        let outline = self.generation.outline;
        let content = self.generation.content;
        PipelineConfig::builder()
            .outline(GenerationSettings::new(outline.temperature, outline.max_tokens))
            .chapter(GenerationSettings::new(content.temperature, content.max_tokens))
            .streaming(streaming.unwrap_or(self.generation.streaming))
            .flush_interval(Duration::from_millis(self.generation.flush_interval_ms))
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid pipeline settings: {}", e)))
    }
}

fn defaults() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<QuireConfig, ConfigError> {
    builder
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
        .try_deserialize()
        .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))
}

fn check_sampling(section: &str, temperature: f64, max_tokens: u32) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::new(format!(
            "{}.temperature must be within [0, 2], got {}",
            section, temperature
        )));
    }
    if max_tokens == 0 {
        return Err(ConfigError::new(format!(
            "{}.max_tokens must be greater than 0",
            section
        )));
    }
    Ok(())
}
