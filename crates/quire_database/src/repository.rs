//! SQLite implementation of ArtifactRepository.

use crate::conversions::{
    chapter_from_row, character_from_row, format_timestamp, new_chapter_row, new_character_row,
    new_project_row, new_review_row, outline_from_row, project_changeset, project_from_row,
    review_from_row,
};
use crate::models::{
    ChapterRow, CharacterRow, NewOutlineRow, OutlineRow, ProjectRow, ReviewRow,
};
use crate::schema::{chapters, characters, outlines, projects, reviews};
use crate::{PersistenceResult, current_version, establish_connection, run_migrations};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use quire_core::OutlineDocument;
use quire_error::{PersistenceError, QuireResult};
use quire_interface::{
    ArtifactRepository, Chapter, Character, NewChapter, NewCharacter, NewProject, NewReview,
    OutlineRecord, Project, ProjectUpdate, Review,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// SQLite implementation of [`ArtifactRepository`] using Diesel.
///
/// Outlines and chapter revisions are append-only. Reads of "the latest"
/// order by timestamp and then by row id, so two rows written within the same
/// microsecond still resolve to the later insert.
///
/// # Example
/// ```no_run
/// use quire_database::SqliteArtifactRepository;
/// use quire_interface::{ArtifactRepository, NewProject};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repo = SqliteArtifactRepository::open("novel_writer.db")?;
///     let project = repo
///         .create_project(&NewProject::builder().name("The Heirloom").build()?)
///         .await?;
///     println!("created project {}", project.id);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SqliteArtifactRepository {
    /// Single connection shared behind an async mutex.
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for SqliteArtifactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteArtifactRepository").finish_non_exhaustive()
    }
}

impl SqliteArtifactRepository {
    /// Open (or create) a database file and bring its schema up to date.
    #[instrument]
    pub fn open(path: &str) -> PersistenceResult<Self> {
        let mut conn = establish_connection(path)?;
        let version = run_migrations(&mut conn)?;
        info!(version, "Artifact store ready");
        Ok(Self::from_connection(conn))
    }

    /// A fresh, migrated in-memory store.
    pub fn in_memory() -> PersistenceResult<Self> {
        Self::open(":memory:")
    }

    /// Wrap an already migrated connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Schema version recorded in the store.
    pub async fn schema_version(&self) -> PersistenceResult<i32> {
        let mut conn = self.conn.lock().await;
        current_version(&mut conn)
    }
}

#[async_trait]
impl ArtifactRepository for SqliteArtifactRepository {
    #[instrument(skip(self, project), fields(name = %project.name))]
    async fn create_project(&self, project: &NewProject) -> QuireResult<Project> {
        let row = new_project_row(project, &Utc::now())?;
        let mut conn = self.conn.lock().await;

        let stored = diesel::insert_into(projects::table)
            .values(&row)
            .returning(ProjectRow::as_returning())
            .get_result(&mut *conn)
            .map_err(PersistenceError::from)?;

        info!(project_id = stored.id, "Created project");
        Ok(project_from_row(stored)?)
    }

    async fn get_project(&self, id: i64) -> QuireResult<Option<Project>> {
        let mut conn = self.conn.lock().await;
        let row = projects::table
            .find(id)
            .select(ProjectRow::as_select())
            .first(&mut *conn)
            .optional()
            .map_err(PersistenceError::from)?;
        Ok(row.map(project_from_row).transpose()?)
    }

    async fn list_projects(&self) -> QuireResult<Vec<Project>> {
        let mut conn = self.conn.lock().await;
        let rows = projects::table
            .select(ProjectRow::as_select())
            .order((projects::last_modified.desc(), projects::id.desc()))
            .load(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(rows
            .into_iter()
            .map(project_from_row)
            .collect::<PersistenceResult<Vec<_>>>()?)
    }

    #[instrument(skip(self, update))]
    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> QuireResult<bool> {
        if update.is_empty() {
            warn!("No updatable fields supplied");
            return Ok(false);
        }

        let changes = project_changeset(update, &Utc::now())?;
        let mut conn = self.conn.lock().await;
        let affected = diesel::update(projects::table.find(id))
            .set(&changes)
            .execute(&mut *conn)
            .map_err(PersistenceError::from)?;

        debug!(affected, "Updated project");
        Ok(affected > 0)
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: i64) -> QuireResult<bool> {
        let mut conn = self.conn.lock().await;

        let deleted = conn.transaction::<_, PersistenceError, _>(|conn| {
            diesel::delete(reviews::table.filter(reviews::project_id.eq(id))).execute(conn)?;
            diesel::delete(characters::table.filter(characters::project_id.eq(id)))
                .execute(conn)?;
            diesel::delete(chapters::table.filter(chapters::project_id.eq(id))).execute(conn)?;
            diesel::delete(outlines::table.filter(outlines::project_id.eq(id))).execute(conn)?;
            let removed = diesel::delete(projects::table.find(id)).execute(conn)?;
            Ok(removed > 0)
        })?;

        info!(deleted, "Deleted project");
        Ok(deleted)
    }

    #[instrument(skip(self, document), fields(chapters = document.chapters.len()))]
    async fn save_outline(
        &self,
        project_id: i64,
        document: &OutlineDocument,
    ) -> QuireResult<OutlineRecord> {
        let row = NewOutlineRow {
            project_id,
            content: serde_json::to_string(document).map_err(PersistenceError::from)?,
            created_at: format_timestamp(&Utc::now()),
        };

        let mut conn = self.conn.lock().await;
        let stored = diesel::insert_into(outlines::table)
            .values(&row)
            .returning(OutlineRow::as_returning())
            .get_result(&mut *conn)
            .map_err(PersistenceError::from)?;

        debug!(outline_id = stored.id, "Saved outline");
        Ok(outline_from_row(stored)?)
    }

    async fn get_latest_outline(&self, project_id: i64) -> QuireResult<Option<OutlineRecord>> {
        let mut conn = self.conn.lock().await;
        let row = outlines::table
            .filter(outlines::project_id.eq(project_id))
            .select(OutlineRow::as_select())
            .order((outlines::created_at.desc(), outlines::id.desc()))
            .first(&mut *conn)
            .optional()
            .map_err(PersistenceError::from)?;
        Ok(row.map(outline_from_row).transpose()?)
    }

    async fn list_outlines(&self, project_id: i64) -> QuireResult<Vec<OutlineRecord>> {
        let mut conn = self.conn.lock().await;
        let rows = outlines::table
            .filter(outlines::project_id.eq(project_id))
            .select(OutlineRow::as_select())
            .order((outlines::created_at.desc(), outlines::id.desc()))
            .load(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(rows
            .into_iter()
            .map(outline_from_row)
            .collect::<PersistenceResult<Vec<_>>>()?)
    }

    #[instrument(
        skip(self, chapter),
        fields(project_id = chapter.project_id, chapter_index = chapter.chapter_index)
    )]
    async fn save_chapter(&self, chapter: &NewChapter) -> QuireResult<Chapter> {
        let row = new_chapter_row(chapter, &Utc::now())?;

        let mut conn = self.conn.lock().await;
        let stored = diesel::insert_into(chapters::table)
            .values(&row)
            .returning(ChapterRow::as_returning())
            .get_result(&mut *conn)
            .map_err(PersistenceError::from)?;

        debug!(chapter_id = stored.id, "Saved chapter revision");
        Ok(chapter_from_row(stored)?)
    }

    async fn get_chapter(
        &self,
        project_id: i64,
        chapter_index: i32,
    ) -> QuireResult<Option<Chapter>> {
        let mut conn = self.conn.lock().await;
        let row = chapters::table
            .filter(chapters::project_id.eq(project_id))
            .filter(chapters::chapter_index.eq(chapter_index))
            .select(ChapterRow::as_select())
            .order((chapters::last_modified.desc(), chapters::id.desc()))
            .first(&mut *conn)
            .optional()
            .map_err(PersistenceError::from)?;
        Ok(row.map(chapter_from_row).transpose()?)
    }

    async fn chapter_history(
        &self,
        project_id: i64,
        chapter_index: i32,
    ) -> QuireResult<Vec<Chapter>> {
        let mut conn = self.conn.lock().await;
        let rows = chapters::table
            .filter(chapters::project_id.eq(project_id))
            .filter(chapters::chapter_index.eq(chapter_index))
            .select(ChapterRow::as_select())
            .order((chapters::last_modified.desc(), chapters::id.desc()))
            .load(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(rows
            .into_iter()
            .map(chapter_from_row)
            .collect::<PersistenceResult<Vec<_>>>()?)
    }

    async fn add_character(
        &self,
        project_id: i64,
        character: &NewCharacter,
    ) -> QuireResult<Character> {
        let row = new_character_row(project_id, character);
        let mut conn = self.conn.lock().await;
        let stored = diesel::insert_into(characters::table)
            .values(&row)
            .returning(CharacterRow::as_returning())
            .get_result(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(character_from_row(stored))
    }

    async fn list_characters(&self, project_id: i64) -> QuireResult<Vec<Character>> {
        let mut conn = self.conn.lock().await;
        let rows = characters::table
            .filter(characters::project_id.eq(project_id))
            .select(CharacterRow::as_select())
            .order(characters::id.asc())
            .load(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(rows.into_iter().map(character_from_row).collect())
    }

    async fn add_review(&self, project_id: i64, review: &NewReview) -> QuireResult<Review> {
        let row = new_review_row(project_id, review, &Utc::now());
        let mut conn = self.conn.lock().await;
        let stored = diesel::insert_into(reviews::table)
            .values(&row)
            .returning(ReviewRow::as_returning())
            .get_result(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(review_from_row(stored)?)
    }

    async fn list_reviews(&self, project_id: i64) -> QuireResult<Vec<Review>> {
        let mut conn = self.conn.lock().await;
        let rows = reviews::table
            .filter(reviews::project_id.eq(project_id))
            .select(ReviewRow::as_select())
            .order((reviews::review_time.desc(), reviews::id.desc()))
            .load(&mut *conn)
            .map_err(PersistenceError::from)?;
        Ok(rows
            .into_iter()
            .map(review_from_row)
            .collect::<PersistenceResult<Vec<_>>>()?)
    }
}
