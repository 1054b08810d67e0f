//! Trait definitions for the Quire novel generation pipeline.
//!
//! This crate defines the seams between the orchestrator and its
//! collaborators: the generation service driver, its stream handle, and the
//! artifact store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod records;
mod repository;
mod stream;
mod traits;

pub use records::{
    Chapter, ChapterStatus, Character, NewChapter, NewChapterBuilder, NewCharacter, NewProject,
    NewProjectBuilder, NewReview, OutlineRecord, Project, ProjectStatus, ProjectUpdate, Review,
    ReviewStatus, ReviewType,
};
pub use repository::ArtifactRepository;
pub use stream::{FinishReason, GenerationStream, StreamChunk};
pub use traits::{GenerationDriver, GenerationOutput, Streaming};
