//! Core data types for the Quire novel generation pipeline.
//!
//! This crate provides the request, document and parameter types shared by
//! the generation client, the parser, the store and the orchestrator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod message;
mod params;
mod request;
mod role;
mod telemetry;

pub use document::{ChapterDraft, ChapterOutline, CharacterSketch, OutlineDocument};
pub use message::Message;
pub use params::{
    ChapterParams, GenerationKind, GenerationParams, OutlineParams, StyleParams,
    DEFAULT_CHAPTER_LENGTH, DEFAULT_STYLE,
};
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
pub use telemetry::init_tracing;
