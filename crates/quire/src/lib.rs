//! Quire - AI-assisted novel writing
//!
//! Quire turns a theme, a style and a topic into a structured story outline,
//! then writes chapters against that outline, streaming text as the model
//! produces it and keeping every revision in a local SQLite store.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quire::{
//!     CancelToken, NarrativePipeline, NoopSink, OpenAiClient, OutlineParams, QuireConfig,
//!     SqliteArtifactRepository,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = QuireConfig::load(None)?;
//!     config.validate()?;
//!     let client = OpenAiClient::new(config.openai_config()?)?;
//!     let repository = Arc::new(SqliteArtifactRepository::open(&config.database.path)?);
//!     let pipeline = NarrativePipeline::new(client, repository)
//!         .with_config(config.pipeline_config(None)?);
//!
//!     let params = OutlineParams::new("mystery", "noir", "a missing heirloom");
//!     let outcome = pipeline
//!         .generate_outline(1, &params, &mut NoopSink, &CancelToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `quire_error` - Error types
//! - `quire_core` - Documents, parameters and request types
//! - `quire_interface` - Driver and repository traits, stored records
//! - `quire_models` - OpenAI-compatible generation client
//! - `quire_database` - SQLite persistence
//! - `quire_narrative` - Prompts, stream aggregation, parsing and the pipeline
//!
//! This crate re-exports everything and adds configuration loading.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use crate::config::{
    API_KEY_ENV, DatabaseSection, GenerationSection, OpenAiSection, QuireConfig, SamplingSection,
};

pub use quire_core::*;
pub use quire_database::{SCHEMA_VERSION, SqliteArtifactRepository};
pub use quire_error::*;
pub use quire_interface::*;
pub use quire_models::{MAX_OUTPUT_TOKENS_CAP, OpenAiClient, OpenAiConfig, OpenAiConfigBuilder};
pub use quire_narrative::{
    AggregateOutcome, CancelToken, ChannelSink, ChapterEdit, GenerationSettings,
    InFlightRegistry, NarrativePipeline, NoopSink, PipelineConfig, PipelineEvent, PipelineHandle,
    PipelineOutcome, ProgressSink, StreamAggregator, build_prompt, parse_chapter, parse_outline,
    save_chapter_edit, save_outline_edit,
};
