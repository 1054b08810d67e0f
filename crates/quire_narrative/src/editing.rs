//! Hand-edited artifacts.
//!
//! Edits never overwrite: each save appends a revision, the same way
//! generated artifacts are stored.

use crate::parse_outline;
use quire_error::{QuireResult, ValidationError};
use quire_interface::{ArtifactRepository, Chapter, ChapterStatus, NewChapter, OutlineRecord};
use tracing::{debug, info, instrument};

/// A hand-edited chapter revision.
///
/// # Examples
///
/// ```
/// use quire_interface::ChapterStatus;
/// use quire_narrative::ChapterEdit;
///
/// let edit = ChapterEdit::new(1, 2, "Rain fell.").with_status(ChapterStatus::PendingReview);
/// assert_eq!(edit.status, ChapterStatus::PendingReview);
/// assert_eq!(edit.title, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterEdit {
    /// Owning project
    pub project_id: i64,
    /// 1-based position in the outline
    pub chapter_index: i32,
    /// New title; `None` keeps the current one
    pub title: Option<String>,
    /// Edited prose
    pub content: String,
    /// Status of the new revision
    pub status: ChapterStatus,
}

impl ChapterEdit {
    /// An accepted edit of a chapter.
    pub fn new(project_id: i64, chapter_index: i32, content: impl Into<String>) -> Self {
        Self {
            project_id,
            chapter_index,
            title: None,
            content: content.into(),
            status: ChapterStatus::Completed,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the revision status.
    pub fn with_status(mut self, status: ChapterStatus) -> Self {
        self.status = status;
        self
    }
}

/// Store an edited chapter as a new revision.
///
/// Without a title the previous revision's title is kept, or failing that
/// the outline's title for the chapter.
///
/// # Errors
///
/// Returns a [`ValidationError`] for blank content, a non-positive index, a
/// status other than `completed` or `pending_review`, or a missing project.
#[instrument(
    skip(repository, edit),
    fields(project_id = edit.project_id, chapter_index = edit.chapter_index)
)]
pub async fn save_chapter_edit(
    repository: &dyn ArtifactRepository,
    edit: ChapterEdit,
) -> QuireResult<Chapter> {
    if edit.content.trim().is_empty() {
        Err(ValidationError::new("chapter content must not be empty"))?
    }
    if edit.chapter_index <= 0 {
        Err(ValidationError::new(format!(
            "chapter index must be positive, got {}",
            edit.chapter_index
        )))?
    }
    if !matches!(edit.status, ChapterStatus::Completed | ChapterStatus::PendingReview) {
        Err(ValidationError::new(format!(
            "an edited chapter must be completed or pending_review, not {}",
            edit.status
        )))?
    }
    require_project(repository, edit.project_id).await?;

    let title = match edit.title.filter(|title| !title.trim().is_empty()) {
        Some(title) => Some(title.trim().to_string()),
        None => current_title(repository, edit.project_id, edit.chapter_index).await?,
    };
    debug!(?title, "Resolved chapter title");

    let chapter = NewChapter {
        project_id: edit.project_id,
        chapter_index: edit.chapter_index,
        title,
        content: edit.content,
        status: edit.status,
        ai_params: None,
    };
    let stored = repository.save_chapter(&chapter).await?;
    info!(chapter_id = stored.id, status = %stored.status, "Saved chapter edit");
    Ok(stored)
}

/// Store an edited outline as a new row.
///
/// The text goes through the same decoder as generated output, so JSON,
/// fenced JSON and labelled prose are all accepted.
///
/// # Errors
///
/// Returns a [`ValidationError`] for blank text, an outline with no
/// chapters, or a missing project.
#[instrument(skip(repository, text), fields(text_len = text.len()))]
pub async fn save_outline_edit(
    repository: &dyn ArtifactRepository,
    project_id: i64,
    text: &str,
) -> QuireResult<OutlineRecord> {
    if text.trim().is_empty() {
        Err(ValidationError::new("outline text must not be empty"))?
    }
    require_project(repository, project_id).await?;

    let document = parse_outline(text)?;
    if document.chapters.is_empty() {
        Err(ValidationError::new("edited outline has no chapters"))?
    }

    let record = repository.save_outline(project_id, &document).await?;
    info!(
        outline_id = record.id,
        chapters = record.document.chapters.len(),
        "Saved outline edit"
    );
    Ok(record)
}

async fn require_project(repository: &dyn ArtifactRepository, project_id: i64) -> QuireResult<()> {
    match repository.get_project(project_id).await? {
        Some(_) => Ok(()),
        None => Err(ValidationError::new(format!("project {} does not exist", project_id)).into()),
    }
}

async fn current_title(
    repository: &dyn ArtifactRepository,
    project_id: i64,
    chapter_index: i32,
) -> QuireResult<Option<String>> {
    if let Some(previous) = repository.get_chapter(project_id, chapter_index).await? {
        if previous.title.is_some() {
            return Ok(previous.title);
        }
    }
    Ok(repository
        .get_latest_outline(project_id)
        .await?
        .and_then(|outline| {
            outline
                .document
                .chapter(chapter_index as usize)
                .map(|entry| entry.title.clone())
        })
        .filter(|title| !title.is_empty()))
}
