//! Persisted artifact records.
//!
//! These types are shared between the orchestrator and the persistence layer.

use chrono::{DateTime, Utc};
use quire_core::OutlineDocument;
use quire_error::{QuireResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Project lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    /// Just created
    #[default]
    Draft,
    /// Being written
    InProgress,
    /// Finished
    Completed,
}

/// Chapter lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChapterStatus {
    /// Not yet written
    #[default]
    NotStarted,
    /// Generation in progress
    Generating,
    /// Generated, awaiting review
    PendingReview,
    /// Accepted
    Completed,
}

/// Review focus.
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
pub enum ReviewType {
    /// Plot structure
    Plot,
    /// Character consistency
    Character,
    /// Prose style
    Style,
    /// Internal logic
    Logic,
}

/// Review resolution state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewStatus {
    /// Open
    #[default]
    Pending,
    /// Addressed
    Resolved,
}

/// A stored project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Row id
    pub id: i64,
    /// Project name
    pub name: String,
    /// Author name
    pub author: Option<String>,
    /// Genre or theme
    pub theme: Option<String>,
    /// Writing style
    pub style: Option<String>,
    /// Subject of the story
    pub topic: Option<String>,
    /// Lifecycle status
    pub status: ProjectStatus,
    /// Model used for generation
    pub ai_model: Option<String>,
    /// Opaque settings blob
    pub settings: Option<serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// Fields for a new project.
///
/// # Examples
///
/// ```
/// use quire_interface::NewProject;
///
/// let project = NewProject::builder()
///     .name("The Heirloom")
///     .theme("mystery")
///     .build()
///     .unwrap();
/// assert_eq!(project.theme.as_deref(), Some("mystery"));
/// assert_eq!(project.author, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewProject {
    /// Project name
    pub name: String,
    /// Author name
    #[builder(setter(strip_option), default)]
    pub author: Option<String>,
    /// Genre or theme
    #[builder(setter(strip_option), default)]
    pub theme: Option<String>,
    /// Writing style
    #[builder(setter(strip_option), default)]
    pub style: Option<String>,
    /// Subject of the story
    #[builder(setter(strip_option), default)]
    pub topic: Option<String>,
    /// Model used for generation
    #[builder(setter(strip_option), default)]
    pub ai_model: Option<String>,
    /// Opaque settings blob
    #[builder(setter(strip_option), default)]
    pub settings: Option<serde_json::Value>,
}

impl NewProject {
    /// Creates a new project builder.
    pub fn builder() -> NewProjectBuilder {
        NewProjectBuilder::default()
    }
}

/// A partial project update.
///
/// Only the named fields are written. Build one from loose `(field, value)`
/// pairs with [`ProjectUpdate::from_fields`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// New name
    pub name: Option<String>,
    /// New author
    pub author: Option<String>,
    /// New theme
    pub theme: Option<String>,
    /// New style
    pub style: Option<String>,
    /// New topic
    pub topic: Option<String>,
    /// New status
    pub status: Option<ProjectStatus>,
    /// Model used for generation
    pub ai_model: Option<String>,
    /// New settings blob
    pub settings: Option<serde_json::Value>,
}

impl ProjectUpdate {
    /// Names accepted by [`ProjectUpdate::from_fields`].
    pub const FIELDS: [&'static str; 8] = [
        "name", "author", "theme", "style", "topic", "status", "ai_model", "settings",
    ];

    /// Build an update from field/value pairs.
    ///
    /// Unknown field names are dropped. A status that is not a known
    /// lifecycle value is a validation error. Settings are stored as JSON
    /// when the value parses, otherwise as a JSON string.
    ///
    /// # Examples
    ///
    /// ```
    /// use quire_interface::{ProjectStatus, ProjectUpdate};
    ///
    /// let update = ProjectUpdate::from_fields([("status", "in_progress"), ("mood", "x")]).unwrap();
    /// assert_eq!(update.status, Some(ProjectStatus::InProgress));
    ///
    /// let empty = ProjectUpdate::from_fields([("unknown_field", "x")]).unwrap();
    /// assert!(empty.is_empty());
    /// ```
    pub fn from_fields<I, K, V>(fields: I) -> QuireResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut update = Self::default();
        for (field, value) in fields {
            let value = value.into();
            match field.as_ref() {
                "name" => update.name = Some(value),
                "author" => update.author = Some(value),
                "theme" => update.theme = Some(value),
                "style" => update.style = Some(value),
                "topic" => update.topic = Some(value),
                "status" => {
                    let status = ProjectStatus::from_str(&value).map_err(|_| {
                        ValidationError::new(format!("unknown project status '{}'", value))
                    })?;
                    update.status = Some(status);
                }
                "ai_model" => update.ai_model = Some(value),
                "settings" => {
                    update.settings = Some(
                        serde_json::from_str(&value)
                            .unwrap_or(serde_json::Value::String(value)),
                    );
                }
                other => {
                    tracing::warn!(field = other, "Ignoring unknown project field");
                }
            }
        }
        Ok(update)
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.theme.is_none()
            && self.style.is_none()
            && self.topic.is_none()
            && self.status.is_none()
            && self.ai_model.is_none()
            && self.settings.is_none()
    }
}

/// A stored outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineRecord {
    /// Row id
    pub id: i64,
    /// Owning project
    pub project_id: i64,
    /// The validated outline
    pub document: OutlineDocument,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A stored chapter revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Row id
    pub id: i64,
    /// Owning project
    pub project_id: i64,
    /// 1-based position in the outline
    pub chapter_index: i32,
    /// Chapter title
    pub title: Option<String>,
    /// Chapter prose
    pub content: String,
    /// Lifecycle status
    pub status: ChapterStatus,
    /// Generation settings used
    pub ai_params: Option<serde_json::Value>,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// Fields for a new chapter revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewChapter {
    /// Owning project
    pub project_id: i64,
    /// 1-based position in the outline
    pub chapter_index: i32,
    /// Chapter title
    #[builder(setter(strip_option), default)]
    pub title: Option<String>,
    /// Chapter prose
    pub content: String,
    /// Lifecycle status
    #[builder(default)]
    pub status: ChapterStatus,
    /// Generation settings used
    #[builder(setter(strip_option), default)]
    pub ai_params: Option<serde_json::Value>,
}

impl NewChapter {
    /// Creates a new chapter builder.
    pub fn builder() -> NewChapterBuilder {
        NewChapterBuilder::default()
    }
}

/// A stored character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Row id
    pub id: i64,
    /// Owning project
    pub project_id: i64,
    /// Character fields
    #[serde(flatten)]
    pub fields: NewCharacter,
}

/// Fields for a new character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCharacter {
    /// Character name
    pub name: String,
    /// Summary description
    pub description: Option<String>,
    /// Personality notes
    pub personality: Option<String>,
    /// Appearance notes
    pub appearance: Option<String>,
    /// Backstory
    pub background: Option<String>,
    /// Relationships to other characters
    pub relationships: Option<String>,
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Row id
    pub id: i64,
    /// Owning project
    pub project_id: i64,
    /// When the review was recorded
    pub review_time: DateTime<Utc>,
    /// Review fields
    #[serde(flatten)]
    pub fields: NewReview,
}

/// Fields for a new review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Review focus
    pub review_type: ReviewType,
    /// Overall finding
    pub result: Option<String>,
    /// Problems found
    pub issues: Option<String>,
    /// Suggested fixes
    pub suggestions: Option<String>,
    /// Resolution state
    pub status: ReviewStatus,
}

impl NewReview {
    /// A pending review of the given type.
    pub fn new(review_type: ReviewType) -> Self {
        Self {
            review_type,
            result: None,
            issues: None,
            suggestions: None,
            status: ReviewStatus::Pending,
        }
    }
}
