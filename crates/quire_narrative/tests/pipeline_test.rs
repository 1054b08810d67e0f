use async_trait::async_trait;
use quire_core::{OutlineDocument, OutlineParams, StyleParams};
use quire_database::SqliteArtifactRepository;
use quire_error::{
    PersistenceError, PersistenceErrorKind, PipelineStage, QuireErrorKind, QuireResult,
    ServiceErrorKind, SinkError,
};
use quire_interface::{
    ArtifactRepository, Chapter, ChapterStatus, Character, NewChapter, NewCharacter, NewProject,
    NewReview, OutlineRecord, Project, ProjectUpdate, Review,
};
use quire_models::{MockStep, ScriptedDriver};
use quire_narrative::{
    CancelToken, NarrativePipeline, NoopSink, PipelineConfig, PipelineEvent, PipelineOutcome,
};
use std::sync::Arc;
use std::time::Duration;

const MYSTERY_OUTLINE: &str = r#"Here is the outline you asked for.

```json
{
  "main_storyline": {"summary": "A jade pendant vanishes during a family wake."},
  "chapters": [
    {"title": "The Wake", "summary": "Relatives gather in the rain."},
    {"title": "The Will", "summary": "A lawyer reads a strange clause."},
    {"title": "The Pawnshop", "summary": "A ticket turns up."},
    {"title": "The Confession", "summary": "Aunt Mei lies."},
    {"title": "The Coffin", "summary": "The pendant was never there."}
  ],
  "characters": [{"name": "Detective Lin", "description": "tired, precise"}],
  "worldbuilding": ["a harbor town in 1948"],
  "thematic_elements": ["inheritance", "guilt"],
  "key_points": ["the pendant was pawned before the wake"]
}
```

Let me know if you want changes."#;

fn mystery() -> OutlineParams {
    OutlineParams::new("mystery", "noir", "a missing heirloom")
}

async fn store_with_project() -> (Arc<dyn ArtifactRepository>, i64) {
    let repo = SqliteArtifactRepository::in_memory().unwrap();
    let project = repo
        .create_project(&NewProject::builder().name("The Heirloom").build().unwrap())
        .await
        .unwrap();
    (Arc::new(repo), project.id)
}

fn collecting(sent: &mut Vec<String>) -> impl FnMut(&str) -> Result<(), SinkError> + Send + '_ {
    move |text: &str| -> Result<(), SinkError> {
        sent.push(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_mystery_outline_is_generated_and_stored() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 16);
    let pipeline = NarrativePipeline::new(driver.clone(), repo.clone());

    let mut sent = Vec::new();
    let outcome = pipeline
        .generate_outline(project_id, &mystery(), &mut collecting(&mut sent), &CancelToken::new())
        .await
        .unwrap();

    let record = outcome.completed().unwrap();
    assert_eq!(record.project_id, project_id);
    assert_eq!(record.document.chapters.len(), 5);
    assert_eq!(record.document.chapters[1].title, "The Will");
    assert_eq!(
        record.document.storyline_text(),
        Some("A jade pendant vanishes during a family wake.")
    );

    let latest = repo.get_latest_outline(project_id).await.unwrap().unwrap();
    assert_eq!(latest.id, record.id);
    assert_eq!(latest.document, record.document);

    assert!(!sent.is_empty());
    assert_eq!(sent.concat(), MYSTERY_OUTLINE);
    assert!(driver.stream_released());

    let request = &driver.requests()[0];
    let prompt = &request.messages[1].content;
    assert!(prompt.contains("mystery"));
    assert!(prompt.contains("noir"));
    assert!(prompt.contains("a missing heirloom"));
    assert_eq!(request.max_tokens, Some(1000));

    let project = repo.get_project(project_id).await.unwrap().unwrap();
    assert_eq!(project.ai_model.as_deref(), Some("scripted-model"));
}

#[tokio::test]
async fn test_each_generation_appends_a_new_outline() {
    let (repo, project_id) = store_with_project().await;
    let pipeline = NarrativePipeline::new(ScriptedDriver::from_text(MYSTERY_OUTLINE, 64), repo.clone());

    let first = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();
    let second = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(repo.list_outlines(project_id).await.unwrap().len(), 2);
    let latest = repo.get_latest_outline(project_id).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
}

#[tokio::test]
async fn test_flushes_reassemble_text_for_any_segmentation() {
    for size in [1, 3, 7, 50, 10_000] {
        let (repo, project_id) = store_with_project().await;
        let pipeline =
            NarrativePipeline::new(ScriptedDriver::from_text(MYSTERY_OUTLINE, size), repo);

        let mut sent = Vec::new();
        pipeline
            .generate_outline(project_id, &mystery(), &mut collecting(&mut sent), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(sent.concat(), MYSTERY_OUTLINE, "fragment size {}", size);
        assert!(sent.iter().all(|text| !text.is_empty()));
    }
}

#[tokio::test]
async fn test_prose_response_degrades_to_sections() {
    let prose = "Main storyline: A pendant goes missing at a wake.\n\n\
                 Chapters:\n\
                 1. The Wake\n\
                 2. The Will\n\
                 3. The Pawnshop\n\n\
                 Characters:\n\
                 - Detective Lin: a tired investigator\n";
    let (repo, project_id) = store_with_project().await;
    let pipeline = NarrativePipeline::new(ScriptedDriver::from_text(prose, 10), repo.clone());

    let record = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();

    let titles: Vec<_> = record.document.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["The Wake", "The Will", "The Pawnshop"]);
    assert_eq!(record.document.characters[0].name, "Detective Lin");
    assert!(repo.get_latest_outline(project_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_json_embedded_in_prose_round_trips() {
    let mut doc = OutlineDocument::default();
    doc.main_storyline
        .insert("summary".to_string(), serde_json::json!("A theft at a wake."));
    doc.chapters = vec![quire_core::ChapterOutline::new("The Wake", "Rain.")];
    doc.key_points = vec!["the ticket".to_string()];
    let response = format!(
        "Sure! {} Hope this helps.",
        serde_json::to_string(&doc).unwrap()
    );

    let (repo, project_id) = store_with_project().await;
    let pipeline = NarrativePipeline::new(ScriptedDriver::from_text(&response, 8), repo);
    let record = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(record.document, doc);
}

#[tokio::test]
async fn test_cancel_mid_stream_stores_nothing_and_releases() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(&"Rain fell. ".repeat(40), 11)
        .with_delay(Duration::from_millis(5));
    let pipeline = NarrativePipeline::new(driver.clone(), repo.clone());

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let mut sent = 0;
    let mut sink = |_: &str| -> Result<(), SinkError> {
        sent += 1;
        trigger.cancel();
        Ok(())
    };

    let outcome = pipeline
        .generate_outline(project_id, &mystery(), &mut sink, &cancel)
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(sent, 1);
    assert!(driver.stream_released());
    assert!(repo.list_outlines(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_before_request_sends_nothing() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 16);
    let pipeline = NarrativePipeline::new(driver.clone(), repo);

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &cancel)
        .await
        .unwrap();

    assert_eq!(outcome, PipelineOutcome::Cancelled);
    assert!(driver.requests().is_empty());
}

#[tokio::test]
async fn test_blank_response_fails_parsing_and_releases() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_fragments(["  ", "\n", "\t"]);
    let pipeline = NarrativePipeline::new(driver.clone(), repo.clone());

    let err = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Parsing);
    match err.cause.kind() {
        QuireErrorKind::Parse(parse) => assert_eq!(parse.raw_text, "  \n\t"),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert!(driver.stream_released());
    assert!(repo.list_outlines(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mid_stream_failure_is_a_streaming_error() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_steps([
        MockStep::Text("{\"main_storyline\": ".to_string()),
        MockStep::Fail(ServiceErrorKind::TransientNetwork("connection reset".to_string())),
    ]);
    let pipeline = NarrativePipeline::new(driver.clone(), repo.clone());

    let err = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Streaming);
    assert!(matches!(err.cause.kind(), QuireErrorKind::Service(_)));
    assert!(driver.stream_released());
    assert!(repo.list_outlines(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_refusal_is_a_requesting_error() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::failing(ServiceErrorKind::Authentication("bad key".to_string()));
    let pipeline = NarrativePipeline::new(driver, repo);

    let err = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Requesting);
}

#[tokio::test]
async fn test_store_failure_still_releases_stream() {
    let (inner, project_id) = store_with_project().await;
    let repo: Arc<dyn ArtifactRepository> = Arc::new(RejectingStore { inner });
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 32);
    let pipeline = NarrativePipeline::new(driver.clone(), repo);

    let err = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Persisting);
    assert!(matches!(err.cause.kind(), QuireErrorKind::Persistence(_)));
    assert!(driver.stream_released());
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_service() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 16);
    let pipeline = NarrativePipeline::new(driver.clone(), repo);

    let blank_theme = OutlineParams::new("  ", "noir", "a missing heirloom");
    let err = pipeline
        .generate_outline(project_id, &blank_theme, &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage, PipelineStage::Validating);
    assert!(matches!(err.cause.kind(), QuireErrorKind::Validation(_)));

    let err = pipeline
        .generate_outline(project_id + 100, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage, PipelineStage::Validating);

    let err = pipeline
        .generate_chapter(
            project_id,
            1,
            &StyleParams::default(),
            &mut NoopSink,
            &CancelToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.stage, PipelineStage::Validating);

    assert!(driver.requests().is_empty());
    assert_eq!(driver.streams_opened(), 0);
}

#[tokio::test]
async fn test_chapter_index_outside_outline_is_rejected() {
    let (repo, project_id) = store_with_project().await;
    NarrativePipeline::new(ScriptedDriver::from_text(MYSTERY_OUTLINE, 64), repo.clone())
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap();

    let driver = ScriptedDriver::from_fragments(["Rain."]);
    let pipeline = NarrativePipeline::new(driver.clone(), repo);
    for index in [0, 6, -1] {
        let err = pipeline
            .generate_chapter(
                project_id,
                index,
                &StyleParams::default(),
                &mut NoopSink,
                &CancelToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Validating, "index {}", index);
    }
    assert!(driver.requests().is_empty());
}

#[tokio::test]
async fn test_chapter_is_stored_pending_review() {
    let (repo, project_id) = store_with_project().await;
    NarrativePipeline::new(ScriptedDriver::from_text(MYSTERY_OUTLINE, 64), repo.clone())
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap();

    let response = "```json\n{\"title\": \"\", \"content\": \"Rain hammered the funeral hall.\"}\n```";
    let driver = ScriptedDriver::from_text(response, 9);
    let pipeline = NarrativePipeline::new(driver.clone(), repo.clone());
    let style = StyleParams::new("noir", 1500);

    let chapter = pipeline
        .generate_chapter(project_id, 2, &style, &mut NoopSink, &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(chapter.chapter_index, 2);
    assert_eq!(chapter.title.as_deref(), Some("The Will"));
    assert_eq!(chapter.content, "Rain hammered the funeral hall.");
    assert_eq!(chapter.status, ChapterStatus::PendingReview);

    let params = chapter.ai_params.clone().unwrap();
    assert_eq!(params["model"], "scripted-model");
    assert_eq!(params["temperature"], 0.7);
    assert_eq!(params["max_tokens"], 2000);
    assert_eq!(params["style"], "noir");
    assert_eq!(params["length"], 1500);

    let stored = repo.get_chapter(project_id, 2).await.unwrap().unwrap();
    assert_eq!(stored.id, chapter.id);

    let prompt = &driver.requests()[0].messages[1].content;
    assert!(prompt.contains("The Will"));
    assert!(prompt.contains("A jade pendant vanishes during a family wake."));
}

#[tokio::test]
async fn test_regenerating_a_chapter_keeps_history() {
    let (repo, project_id) = store_with_project().await;
    NarrativePipeline::new(ScriptedDriver::from_text(MYSTERY_OUTLINE, 64), repo.clone())
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap();

    for text in ["First draft.", "Second draft."] {
        NarrativePipeline::new(ScriptedDriver::from_fragments([text]), repo.clone())
            .generate_chapter(project_id, 1, &StyleParams::default(), &mut NoopSink, &CancelToken::new())
            .await
            .unwrap();
    }

    let history = repo.chapter_history(project_id, 1).await.unwrap();
    assert_eq!(history.len(), 2);
    let latest = repo.get_chapter(project_id, 1).await.unwrap().unwrap();
    assert_eq!(latest.content, "Second draft.");
}

#[tokio::test]
async fn test_single_shot_mode_sends_full_text_once() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 4);
    let config = PipelineConfig::builder().streaming(false).build().unwrap();
    let pipeline = NarrativePipeline::new(driver.clone(), repo).with_config(config);

    let mut sent = Vec::new();
    let record = pipeline
        .generate_outline(project_id, &mystery(), &mut collecting(&mut sent), &CancelToken::new())
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(sent, vec![MYSTERY_OUTLINE.to_string()]);
    assert_eq!(record.document.chapters.len(), 5);
    assert_eq!(driver.streams_opened(), 0);
    assert_eq!(driver.requests().len(), 1);
}

#[tokio::test]
async fn test_prompts_are_deterministic() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(MYSTERY_OUTLINE, 64);
    let pipeline = NarrativePipeline::new(driver.clone(), repo);

    for _ in 0..2 {
        pipeline
            .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
            .await
            .unwrap();
    }

    let requests = driver.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn test_background_run_sends_one_terminal_event() {
    let (repo, project_id) = store_with_project().await;
    let pipeline = Arc::new(NarrativePipeline::new(
        ScriptedDriver::from_text(MYSTERY_OUTLINE, 16),
        repo,
    ));

    let mut handle = pipeline.spawn_outline(project_id, mystery());
    let mut partial = String::new();
    let mut terminals = 0;
    while let Some(event) = handle.next_event().await {
        match event {
            PipelineEvent::Partial(text) => {
                assert_eq!(terminals, 0, "partial text after the terminal event");
                partial.push_str(&text);
            }
            PipelineEvent::Completed(record) => {
                terminals += 1;
                assert_eq!(record.document.chapters.len(), 5);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    assert_eq!(terminals, 1);
    assert_eq!(partial, MYSTERY_OUTLINE);
}

#[tokio::test]
async fn test_second_generation_for_a_busy_project_is_rejected() {
    let (repo, project_id) = store_with_project().await;
    let driver = ScriptedDriver::from_text(&"Rain fell. ".repeat(200), 11)
        .with_delay(Duration::from_millis(5));
    let pipeline = Arc::new(NarrativePipeline::new(driver, repo.clone()));

    let mut running = pipeline.spawn_outline(project_id, mystery());
    match running.next_event().await {
        Some(PipelineEvent::Partial(_)) => {}
        other => panic!("expected partial text, got {:?}", other),
    }
    assert!(pipeline.registry().is_active(project_id));

    let err = pipeline
        .generate_outline(project_id, &mystery(), &mut NoopSink, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage, PipelineStage::Validating);

    running.cancel();
    assert!(matches!(running.finish().await, Some(PipelineEvent::Cancelled)));
    assert!(!pipeline.registry().is_active(project_id));
    assert!(repo.list_outlines(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_background_chapter_failure_is_reported_once() {
    let (repo, project_id) = store_with_project().await;
    let pipeline = Arc::new(NarrativePipeline::new(
        ScriptedDriver::from_fragments(["unused"]),
        repo,
    ));

    let handle = pipeline.spawn_chapter(project_id, 1, StyleParams::default());
    match handle.finish().await {
        Some(PipelineEvent::Failed(err)) => assert_eq!(err.stage, PipelineStage::Validating),
        other => panic!("expected a failure, got {:?}", other),
    }
}

/// Delegates to SQLite but refuses to store generated artifacts.
struct RejectingStore {
    inner: Arc<dyn ArtifactRepository>,
}

fn rejected() -> PersistenceError {
    PersistenceError::new(PersistenceErrorKind::Query("disk full".to_string()))
}

#[async_trait]
impl ArtifactRepository for RejectingStore {
    async fn create_project(&self, project: &NewProject) -> QuireResult<Project> {
        self.inner.create_project(project).await
    }

    async fn get_project(&self, id: i64) -> QuireResult<Option<Project>> {
        self.inner.get_project(id).await
    }

    async fn list_projects(&self) -> QuireResult<Vec<Project>> {
        self.inner.list_projects().await
    }

    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> QuireResult<bool> {
        self.inner.update_project(id, update).await
    }

    async fn delete_project(&self, id: i64) -> QuireResult<bool> {
        self.inner.delete_project(id).await
    }

    async fn save_outline(
        &self,
        _project_id: i64,
        _document: &OutlineDocument,
    ) -> QuireResult<OutlineRecord> {
        Err(rejected().into())
    }

    async fn get_latest_outline(&self, project_id: i64) -> QuireResult<Option<OutlineRecord>> {
        self.inner.get_latest_outline(project_id).await
    }

    async fn list_outlines(&self, project_id: i64) -> QuireResult<Vec<OutlineRecord>> {
        self.inner.list_outlines(project_id).await
    }

    async fn save_chapter(&self, _chapter: &NewChapter) -> QuireResult<Chapter> {
        Err(rejected().into())
    }

    async fn get_chapter(
        &self,
        project_id: i64,
        chapter_index: i32,
    ) -> QuireResult<Option<Chapter>> {
        self.inner.get_chapter(project_id, chapter_index).await
    }

    async fn chapter_history(&self, project_id: i64, chapter_index: i32) -> QuireResult<Vec<Chapter>> {
        self.inner.chapter_history(project_id, chapter_index).await
    }

    async fn add_character(
        &self,
        project_id: i64,
        character: &NewCharacter,
    ) -> QuireResult<Character> {
        self.inner.add_character(project_id, character).await
    }

    async fn list_characters(&self, project_id: i64) -> QuireResult<Vec<Character>> {
        self.inner.list_characters(project_id).await
    }

    async fn add_review(&self, project_id: i64, review: &NewReview) -> QuireResult<Review> {
        self.inner.add_review(project_id, review).await
    }

    async fn list_reviews(&self, project_id: i64) -> QuireResult<Vec<Review>> {
        self.inner.list_reviews(project_id).await
    }
}
