//! Versioned schema migrations.
//!
//! Each step runs in its own transaction and records the new version in the
//! single `schema_version` row. Every statement is guarded with
//! `IF NOT EXISTS`, so a step interrupted before its version was recorded
//! is safe to run again from the top.

use crate::PersistenceResult;
use crate::schema::schema_version;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use quire_error::{PersistenceError, PersistenceErrorKind};
use tracing::{debug, info};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 2;

const VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL
);
"#;

const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    author TEXT,
    theme TEXT,
    style TEXT,
    topic TEXT,
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'in_progress', 'completed')),
    ai_model TEXT,
    settings TEXT,
    created_at TEXT NOT NULL,
    last_modified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS outlines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    chapter_index INTEGER NOT NULL CHECK (chapter_index > 0),
    title TEXT,
    content TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'not_started'
        CHECK (status IN ('not_started', 'generating', 'pending_review', 'completed')),
    ai_params TEXT,
    last_modified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    personality TEXT,
    appearance TEXT,
    background TEXT,
    relationships TEXT
);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    review_time TEXT NOT NULL,
    review_type TEXT NOT NULL
        CHECK (review_type IN ('plot', 'character', 'style', 'logic')),
    result TEXT,
    issues TEXT,
    suggestions TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'resolved'))
);

CREATE INDEX IF NOT EXISTS idx_outlines_project ON outlines(project_id);
CREATE INDEX IF NOT EXISTS idx_chapters_project ON chapters(project_id);
CREATE INDEX IF NOT EXISTS idx_characters_project ON characters(project_id);
CREATE INDEX IF NOT EXISTS idx_reviews_project ON reviews(project_id);
"#;

const MIGRATION_V2: &str = r#"
CREATE INDEX IF NOT EXISTS idx_outlines_latest
    ON outlines(project_id, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_chapters_latest
    ON chapters(project_id, chapter_index, last_modified DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_reviews_latest
    ON reviews(project_id, review_time DESC, id DESC);
"#;

/// Name and SQL for a migration step.
fn migration(version: i32) -> Option<(&'static str, &'static str)> {
    match version {
        1 => Some(("initial_schema", MIGRATION_V1)),
        2 => Some(("latest_lookup_indexes", MIGRATION_V2)),
        _ => None,
    }
}

/// Highest applied migration, or 0 for a fresh store.
pub fn current_version(conn: &mut SqliteConnection) -> PersistenceResult<i32> {
    conn.batch_execute(VERSION_TABLE).map_err(migration_error)?;

    let version = schema_version::table
        .find(1)
        .select(schema_version::version)
        .first::<i32>(conn)
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Apply every migration above the store's current version.
///
/// Returns the version the store is at afterwards.
#[tracing::instrument(skip(conn))]
pub fn run_migrations(conn: &mut SqliteConnection) -> PersistenceResult<i32> {
    let current = current_version(conn)?;
    info!(current_version = current, target_version = SCHEMA_VERSION, "Checking database migrations");

    for version in (current + 1)..=SCHEMA_VERSION {
        let (name, sql) = migration(version).ok_or_else(|| {
            PersistenceError::new(PersistenceErrorKind::Migration(format!(
                "No migration defined for version {}",
                version
            )))
        })?;

        debug!(version, name, "Applying migration");
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            conn.batch_execute(sql)?;
            diesel::replace_into(schema_version::table)
                .values((
                    schema_version::id.eq(1),
                    schema_version::version.eq(version),
                    schema_version::applied_at.eq(crate::conversions::format_timestamp(
                        &chrono::Utc::now(),
                    )),
                ))
                .execute(conn)?;
            Ok(())
        })
        .map_err(migration_error)?;

        info!(version, name, "Applied migration");
    }

    Ok(current.max(SCHEMA_VERSION))
}

fn migration_error(e: diesel::result::Error) -> PersistenceError {
    tracing::error!("Migration failed: {}", e);
    PersistenceError::new(PersistenceErrorKind::Migration(e.to_string()))
}
