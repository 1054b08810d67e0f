//! Outline and chapter generation for Quire.
//!
//! This crate turns generation parameters into stored artifacts:
//!
//! - [`build_prompt`] renders deterministic request payloads
//! - [`StreamAggregator`] buffers streamed fragments and flushes progress
//! - [`parse_outline`] and [`parse_chapter`] decode loosely formatted output
//! - [`save_chapter_edit`] and [`save_outline_edit`] store hand edits
//! - [`NarrativePipeline`] runs the whole sequence against a
//!   [`Streaming`](quire_interface::Streaming) driver and an
//!   [`ArtifactRepository`](quire_interface::ArtifactRepository)
//!
//! # Example
//!
//! ```rust,ignore
//! use quire_narrative::{CancelToken, NarrativePipeline};
//!
//! let pipeline = NarrativePipeline::new(driver, repository);
//! let mut sink = |text: &str| -> Result<(), quire_error::SinkError> {
//!     print!("{}", text);
//!     Ok(())
//! };
//! let outcome = pipeline
//!     .generate_outline(project_id, &params, &mut sink, &CancelToken::new())
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod document;
mod editing;
mod events;
mod extraction;
mod pipeline;
mod prompt;
mod sections;

pub use aggregator::{
    AggregateOutcome, CancelToken, ChannelSink, DEFAULT_FLUSH_INTERVAL, FLUSH_PUNCTUATION,
    NoopSink, ProgressSink, StreamAggregator,
};
pub use document::StructuredDocument;
pub use editing::{ChapterEdit, save_chapter_edit, save_outline_edit};
pub use events::{InFlightGuard, InFlightRegistry, PipelineEvent, PipelineHandle};
pub use extraction::{extract_fenced_block, parse_chapter, parse_document, parse_outline};
pub use pipeline::{
    GenerationSettings, NarrativePipeline, PipelineConfig, PipelineConfigBuilder,
    PipelineConfigBuilderError, PipelineOutcome,
};
pub use prompt::{MIN_OUTLINE_CHAPTERS, SYSTEM_PROMPT, build_prompt};
