//! Repository trait for artifact persistence.

use crate::{
    Chapter, Character, NewChapter, NewCharacter, NewProject, NewReview, OutlineRecord, Project,
    ProjectUpdate, Review,
};
use async_trait::async_trait;
use quire_core::OutlineDocument;
use quire_error::QuireResult;

/// Store for projects and everything they own.
///
/// Outlines and chapters are append-only: saves always insert, and reads
/// return the most recent row. Absence is reported as `None`, never as an
/// error.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Create a project and return the stored row.
    async fn create_project(&self, project: &NewProject) -> QuireResult<Project>;

    /// Load a project by id.
    async fn get_project(&self, id: i64) -> QuireResult<Option<Project>>;

    /// List all projects, most recently modified first.
    async fn list_projects(&self) -> QuireResult<Vec<Project>>;

    /// Apply a partial update.
    ///
    /// Returns whether a row was affected. An empty update affects nothing
    /// and leaves `last_modified` untouched.
    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> QuireResult<bool>;

    /// Delete a project and all dependent rows in one transaction.
    ///
    /// Returns whether the project existed.
    async fn delete_project(&self, id: i64) -> QuireResult<bool>;

    /// Append an outline.
    async fn save_outline(
        &self,
        project_id: i64,
        document: &OutlineDocument,
    ) -> QuireResult<OutlineRecord>;

    /// Most recently created outline for a project.
    async fn get_latest_outline(&self, project_id: i64) -> QuireResult<Option<OutlineRecord>>;

    /// Every outline for a project, newest first.
    async fn list_outlines(&self, project_id: i64) -> QuireResult<Vec<OutlineRecord>>;

    /// Append a chapter revision.
    async fn save_chapter(&self, chapter: &NewChapter) -> QuireResult<Chapter>;

    /// Most recently modified revision of a chapter.
    async fn get_chapter(&self, project_id: i64, chapter_index: i32)
    -> QuireResult<Option<Chapter>>;

    /// Every revision of a chapter, newest first.
    async fn chapter_history(&self, project_id: i64, chapter_index: i32)
    -> QuireResult<Vec<Chapter>>;

    /// Add a character to a project.
    async fn add_character(&self, project_id: i64, character: &NewCharacter)
    -> QuireResult<Character>;

    /// Characters of a project in insertion order.
    async fn list_characters(&self, project_id: i64) -> QuireResult<Vec<Character>>;

    /// Record a review for a project.
    async fn add_review(&self, project_id: i64, review: &NewReview) -> QuireResult<Review>;

    /// Reviews of a project, newest first.
    async fn list_reviews(&self, project_id: i64) -> QuireResult<Vec<Review>>;
}
