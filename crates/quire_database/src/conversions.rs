//! Conversions between row models and interface records.

use crate::models::{
    ChapterRow, CharacterRow, NewChapterRow, NewCharacterRow, NewProjectRow, NewReviewRow,
    OutlineRow, ProjectChangeset, ProjectRow, ReviewRow,
};
use crate::PersistenceResult;
use chrono::{DateTime, Utc};
use quire_error::{PersistenceError, PersistenceErrorKind};
use quire_interface::{
    Chapter, Character, NewChapter, NewCharacter, NewProject, NewReview, OutlineRecord, Project,
    ProjectStatus, ProjectUpdate, Review,
};
use std::str::FromStr;

/// Fixed-width UTC timestamp; lexical order matches chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(value: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| serialization(format!("Invalid timestamp '{}': {}", value, e)))
}

fn parse_enum<T: FromStr>(column: &str, value: &str) -> PersistenceResult<T> {
    T::from_str(value).map_err(|_| serialization(format!("Invalid {} '{}'", column, value)))
}

fn parse_json(value: Option<String>) -> PersistenceResult<Option<serde_json::Value>> {
    value
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(PersistenceError::from)
}

fn to_json(value: &Option<serde_json::Value>) -> PersistenceResult<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(PersistenceError::from)
}

#[track_caller]
fn serialization(message: String) -> PersistenceError {
    PersistenceError::new(PersistenceErrorKind::Serialization(message))
}

pub(crate) fn new_project_row(
    project: &NewProject,
    now: &DateTime<Utc>,
) -> PersistenceResult<NewProjectRow> {
    let stamp = format_timestamp(now);
    Ok(NewProjectRow {
        name: project.name.clone(),
        author: project.author.clone(),
        theme: project.theme.clone(),
        style: project.style.clone(),
        topic: project.topic.clone(),
        status: ProjectStatus::default().to_string(),
        ai_model: project.ai_model.clone(),
        settings: to_json(&project.settings)?,
        created_at: stamp.clone(),
        last_modified: stamp,
    })
}

pub(crate) fn project_from_row(row: ProjectRow) -> PersistenceResult<Project> {
    Ok(Project {
        id: row.id,
        name: row.name,
        author: row.author,
        theme: row.theme,
        style: row.style,
        topic: row.topic,
        status: parse_enum("project status", &row.status)?,
        ai_model: row.ai_model,
        settings: parse_json(row.settings)?,
        created_at: parse_timestamp(&row.created_at)?,
        last_modified: parse_timestamp(&row.last_modified)?,
    })
}

pub(crate) fn project_changeset(
    update: &ProjectUpdate,
    now: &DateTime<Utc>,
) -> PersistenceResult<ProjectChangeset> {
    Ok(ProjectChangeset {
        name: update.name.clone(),
        author: update.author.clone(),
        theme: update.theme.clone(),
        style: update.style.clone(),
        topic: update.topic.clone(),
        status: update.status.map(|s| s.to_string()),
        ai_model: update.ai_model.clone(),
        settings: to_json(&update.settings)?,
        last_modified: format_timestamp(now),
    })
}

pub(crate) fn outline_from_row(row: OutlineRow) -> PersistenceResult<OutlineRecord> {
    Ok(OutlineRecord {
        id: row.id,
        project_id: row.project_id,
        document: serde_json::from_str(&row.content)?,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub(crate) fn new_chapter_row(
    chapter: &NewChapter,
    now: &DateTime<Utc>,
) -> PersistenceResult<NewChapterRow> {
    Ok(NewChapterRow {
        project_id: chapter.project_id,
        chapter_index: chapter.chapter_index,
        title: chapter.title.clone(),
        content: chapter.content.clone(),
        status: chapter.status.to_string(),
        ai_params: to_json(&chapter.ai_params)?,
        last_modified: format_timestamp(now),
    })
}

pub(crate) fn chapter_from_row(row: ChapterRow) -> PersistenceResult<Chapter> {
    Ok(Chapter {
        id: row.id,
        project_id: row.project_id,
        chapter_index: row.chapter_index,
        title: row.title,
        content: row.content,
        status: parse_enum("chapter status", &row.status)?,
        ai_params: parse_json(row.ai_params)?,
        last_modified: parse_timestamp(&row.last_modified)?,
    })
}

pub(crate) fn new_character_row(project_id: i64, character: &NewCharacter) -> NewCharacterRow {
    NewCharacterRow {
        project_id,
        name: character.name.clone(),
        description: character.description.clone(),
        personality: character.personality.clone(),
        appearance: character.appearance.clone(),
        background: character.background.clone(),
        relationships: character.relationships.clone(),
    }
}

pub(crate) fn character_from_row(row: CharacterRow) -> Character {
    Character {
        id: row.id,
        project_id: row.project_id,
        fields: NewCharacter {
            name: row.name,
            description: row.description,
            personality: row.personality,
            appearance: row.appearance,
            background: row.background,
            relationships: row.relationships,
        },
    }
}

pub(crate) fn new_review_row(
    project_id: i64,
    review: &NewReview,
    now: &DateTime<Utc>,
) -> NewReviewRow {
    NewReviewRow {
        project_id,
        review_time: format_timestamp(now),
        review_type: review.review_type.to_string(),
        result: review.result.clone(),
        issues: review.issues.clone(),
        suggestions: review.suggestions.clone(),
        status: review.status.to_string(),
    }
}

pub(crate) fn review_from_row(row: ReviewRow) -> PersistenceResult<Review> {
    Ok(Review {
        id: row.id,
        project_id: row.project_id,
        review_time: parse_timestamp(&row.review_time)?,
        fields: NewReview {
            review_type: parse_enum("review type", &row.review_type)?,
            result: row.result,
            issues: row.issues,
            suggestions: row.suggestions,
            status: parse_enum("review status", &row.status)?,
        },
    })
}
