use quire_error::QuireErrorKind;
use quire_interface::{ChapterStatus, NewChapter, ProjectStatus, ProjectUpdate};
use std::str::FromStr;

#[test]
fn test_update_keeps_known_fields_only() {
    let update = ProjectUpdate::from_fields([
        ("name", "Second Draft"),
        ("theme", "noir"),
        ("unknown_field", "x"),
    ])
    .unwrap();

    assert_eq!(update.name.as_deref(), Some("Second Draft"));
    assert_eq!(update.theme.as_deref(), Some("noir"));
    assert!(update.author.is_none());
    assert!(!update.is_empty());
}

#[test]
fn test_update_with_only_unknown_fields_is_empty() {
    let update = ProjectUpdate::from_fields([("unknown_field", "x")]).unwrap();
    assert!(update.is_empty());
}

#[test]
fn test_update_accepts_model() {
    let update = ProjectUpdate::from_fields([("ai_model", "gpt-4o-mini")]).unwrap();
    assert_eq!(update.ai_model.as_deref(), Some("gpt-4o-mini"));
    assert!(!update.is_empty());
}

#[test]
fn test_update_rejects_unknown_status() {
    let err = ProjectUpdate::from_fields([("status", "abandoned")]).unwrap_err();
    assert!(matches!(err.kind(), QuireErrorKind::Validation(_)));
}

#[test]
fn test_settings_accept_json_or_text() {
    let update = ProjectUpdate::from_fields([("settings", r#"{"pov": "first"}"#)]).unwrap();
    assert_eq!(update.settings.unwrap()["pov"], "first");

    let update = ProjectUpdate::from_fields([("settings", "plain words")]).unwrap();
    assert_eq!(update.settings.unwrap(), "plain words");
}

#[test]
fn test_status_names_match_store_values() {
    assert_eq!(ProjectStatus::InProgress.to_string(), "in_progress");
    assert_eq!(ChapterStatus::from_str("pending_review").unwrap(), ChapterStatus::PendingReview);
    assert_eq!(ChapterStatus::default(), ChapterStatus::NotStarted);
}

#[test]
fn test_new_chapter_builder_defaults() {
    let chapter = NewChapter::builder()
        .project_id(1)
        .chapter_index(2)
        .content("It rained.")
        .build()
        .unwrap();

    assert_eq!(chapter.status, ChapterStatus::NotStarted);
    assert!(chapter.title.is_none());
}
