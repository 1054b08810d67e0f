//! Structured narrative documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry in an outline's chapter list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterOutline {
    /// Chapter title
    pub title: String,
    /// What happens in the chapter
    #[serde(default)]
    pub summary: String,
}

impl ChapterOutline {
    /// Create a chapter outline entry.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// A character named by an outline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterSketch {
    /// Character name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// The validated story outline.
///
/// `main_storyline` and `chapters` are always present once a document has
/// passed through the parser; the remaining sections default to empty and
/// are omitted from the serialized form when empty.
///
/// # Examples
///
/// ```
/// use quire_core::{ChapterOutline, OutlineDocument};
///
/// let mut outline = OutlineDocument::default();
/// outline.chapters.push(ChapterOutline::new("The Wake", "A body on the pier."));
///
/// let json = serde_json::to_value(&outline).unwrap();
/// assert!(json.get("main_storyline").is_some());
/// assert!(json.get("worldbuilding").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlineDocument {
    /// Story overview as a free-form mapping
    #[serde(default)]
    pub main_storyline: Map<String, Value>,
    /// Ordered chapter list
    #[serde(default)]
    pub chapters: Vec<ChapterOutline>,
    /// Principal characters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<CharacterSketch>,
    /// Setting notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worldbuilding: Vec<String>,
    /// Themes and motifs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thematic_elements: Vec<String>,
    /// Key plot points
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
}

impl OutlineDocument {
    /// Storyline prose, if the overview carries a recognizable text field.
    pub fn storyline_text(&self) -> Option<&str> {
        ["summary", "storyline", "overview", "premise"]
            .iter()
            .find_map(|key| self.main_storyline.get(*key).and_then(Value::as_str))
    }

    /// Chapter entry for a 1-based index.
    pub fn chapter(&self, index: usize) -> Option<&ChapterOutline> {
        index.checked_sub(1).and_then(|i| self.chapters.get(i))
    }
}

/// A generated chapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterDraft {
    /// Chapter title
    #[serde(default)]
    pub title: String,
    /// Chapter prose
    #[serde(default)]
    pub content: String,
}
