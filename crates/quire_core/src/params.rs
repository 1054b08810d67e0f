//! Generation parameters.

use crate::OutlineDocument;
use serde::{Deserialize, Serialize};

/// Style used when the caller does not name one.
pub const DEFAULT_STYLE: &str = "default";

/// Target chapter length in characters when the caller does not name one.
pub const DEFAULT_CHAPTER_LENGTH: u32 = 2000;

/// Which artifact a pipeline run produces.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenerationKind {
    /// A story outline
    Outline,
    /// Chapter text
    Chapter,
}

/// Inputs for outline generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineParams {
    /// Genre or theme
    pub theme: String,
    /// Writing style
    pub style: String,
    /// Subject of the story
    pub topic: String,
}

impl OutlineParams {
    /// Create outline parameters.
    pub fn new(
        theme: impl Into<String>,
        style: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            theme: theme.into(),
            style: style.into(),
            topic: topic.into(),
        }
    }
}

/// Style controls for chapter generation.
///
/// # Examples
///
/// ```
/// use quire_core::{StyleParams, DEFAULT_CHAPTER_LENGTH};
///
/// let style = StyleParams::default();
/// assert_eq!(*style.length(), DEFAULT_CHAPTER_LENGTH);
/// assert_eq!(style.style(), "default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StyleParams {
    /// Writing style
    style: String,
    /// Target length in characters
    length: u32,
}

impl StyleParams {
    /// Create style parameters.
    pub fn new(style: impl Into<String>, length: u32) -> Self {
        Self {
            style: style.into(),
            length,
        }
    }
}

impl Default for StyleParams {
    fn default() -> Self {
        Self::new(DEFAULT_STYLE, DEFAULT_CHAPTER_LENGTH)
    }
}

/// Inputs for chapter generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterParams {
    /// Owning project
    pub project_id: i64,
    /// 1-based chapter index into the outline
    pub chapter_index: i32,
    /// The outline the chapter is written against
    pub outline: OutlineDocument,
    /// Style controls
    pub style: StyleParams,
}

/// Parameters for either generation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum GenerationParams {
    /// Outline inputs
    Outline(OutlineParams),
    /// Chapter inputs
    Chapter(ChapterParams),
}

impl GenerationParams {
    /// The generation kind these parameters describe.
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationParams::Outline(_) => GenerationKind::Outline,
            GenerationParams::Chapter(_) => GenerationKind::Chapter,
        }
    }
}
