//! Diesel row models.
#![allow(missing_docs)]

use crate::schema::{chapters, characters, outlines, projects, reviews};
use diesel::prelude::*;

/// Database row for the projects table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub author: Option<String>,
    pub theme: Option<String>,
    pub style: Option<String>,
    pub topic: Option<String>,
    pub status: String,
    pub ai_model: Option<String>,
    pub settings: Option<String>,
    pub created_at: String,
    pub last_modified: String,
}

/// Insertable project.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProjectRow {
    pub name: String,
    pub author: Option<String>,
    pub theme: Option<String>,
    pub style: Option<String>,
    pub topic: Option<String>,
    pub status: String,
    pub ai_model: Option<String>,
    pub settings: Option<String>,
    pub created_at: String,
    pub last_modified: String,
}

/// Partial project update. `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
pub struct ProjectChangeset {
    pub name: Option<String>,
    pub author: Option<String>,
    pub theme: Option<String>,
    pub style: Option<String>,
    pub topic: Option<String>,
    pub status: Option<String>,
    pub ai_model: Option<String>,
    pub settings: Option<String>,
    pub last_modified: String,
}

/// Database row for the outlines table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(table_name = outlines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutlineRow {
    pub id: i64,
    pub project_id: i64,
    pub content: String,
    pub created_at: String,
}

/// Insertable outline.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outlines)]
pub struct NewOutlineRow {
    pub project_id: i64,
    pub content: String,
    pub created_at: String,
}

/// Database row for the chapters table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChapterRow {
    pub id: i64,
    pub project_id: i64,
    pub chapter_index: i32,
    pub title: Option<String>,
    pub content: String,
    pub status: String,
    pub ai_params: Option<String>,
    pub last_modified: String,
}

/// Insertable chapter revision.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chapters)]
pub struct NewChapterRow {
    pub project_id: i64,
    pub chapter_index: i32,
    pub title: Option<String>,
    pub content: String,
    pub status: String,
    pub ai_params: Option<String>,
    pub last_modified: String,
}

/// Database row for the characters table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CharacterRow {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub appearance: Option<String>,
    pub background: Option<String>,
    pub relationships: Option<String>,
}

/// Insertable character.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = characters)]
pub struct NewCharacterRow {
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub appearance: Option<String>,
    pub background: Option<String>,
    pub relationships: Option<String>,
}

/// Database row for the reviews table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReviewRow {
    pub id: i64,
    pub project_id: i64,
    pub review_time: String,
    pub review_type: String,
    pub result: Option<String>,
    pub issues: Option<String>,
    pub suggestions: Option<String>,
    pub status: String,
}

/// Insertable review.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow {
    pub project_id: i64,
    pub review_time: String,
    pub review_type: String,
    pub result: Option<String>,
    pub issues: Option<String>,
    pub suggestions: Option<String>,
    pub status: String,
}
