//! Generation pipeline orchestration.
//!
//! Each use case is a short state machine:
//! `Validating → Requesting → Streaming → Parsing → Persisting → Done`,
//! with `Cancelled` and `Failed` as the other terminal states. Failures are
//! reported once, as a [`PipelineError`] tagged with the stage that failed.

use crate::{
    AggregateOutcome, CancelToken, InFlightGuard, InFlightRegistry, ProgressSink,
    StreamAggregator, build_prompt, parse_chapter, parse_outline, DEFAULT_FLUSH_INTERVAL,
};
use quire_core::{
    ChapterParams, GenerateRequest, GenerationParams, OutlineParams, StyleParams,
};
use quire_error::{PipelineError, PipelineStage, QuireError, ValidationError};
use quire_interface::{
    ArtifactRepository, Chapter, ChapterStatus, GenerationOutput, NewChapter, OutlineRecord,
    ProjectUpdate, Streaming,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Sampling settings for one generation kind.
#[derive(Debug, Clone, Copy, PartialEq, derive_getters::Getters)]
pub struct GenerationSettings {
    /// Sampling temperature (0.0 to 2.0)
    temperature: f64,
    /// Maximum output tokens requested
    max_tokens: u32,
}

impl GenerationSettings {
    /// Create generation settings.
    pub fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Orchestrator configuration.
///
/// # Examples
///
/// ```
/// use quire_narrative::{GenerationSettings, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .streaming(false)
///     .chapter(GenerationSettings::new(0.9, 3000))
///     .build()
///     .unwrap();
/// assert!(!config.streaming());
/// assert_eq!(*config.outline().max_tokens(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(default)]
pub struct PipelineConfig {
    /// Settings for outline requests
    outline: GenerationSettings,
    /// Settings for chapter requests
    chapter: GenerationSettings,
    /// Stream responses instead of waiting for the full text
    #[getter(skip)]
    streaming: bool,
    /// Upper bound on the time between progress flushes
    flush_interval: Duration,
}

impl PipelineConfig {
    /// Creates a new config builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Whether responses are streamed.
    pub fn streaming(&self) -> bool {
        self.streaming
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outline: GenerationSettings::new(0.7, 1000),
            chapter: GenerationSettings::new(0.7, 2000),
            streaming: true,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// How a pipeline run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome<T> {
    /// The artifact was generated and stored
    Completed(T),
    /// The caller cancelled during the service call; nothing was stored
    Cancelled,
}

impl<T> PipelineOutcome<T> {
    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            PipelineOutcome::Completed(value) => Some(value),
            PipelineOutcome::Cancelled => None,
        }
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineOutcome::Cancelled)
    }
}

/// Composes prompt building, generation, aggregation, parsing and storage.
///
/// Runs that share an [`InFlightRegistry`] never generate for the same
/// project at the same time.
pub struct NarrativePipeline<D: Streaming> {
    driver: D,
    repository: Arc<dyn ArtifactRepository>,
    config: PipelineConfig,
    in_flight: InFlightRegistry,
}

impl<D: Streaming> std::fmt::Debug for NarrativePipeline<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativePipeline")
            .field("provider", &self.driver.provider_name())
            .field("model", &self.driver.model_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: Streaming> NarrativePipeline<D> {
    /// Create a pipeline with default configuration and its own registry.
    pub fn new(driver: D, repository: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            driver,
            repository,
            config: PipelineConfig::default(),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an in-flight registry with other pipelines.
    pub fn with_registry(mut self, registry: InFlightRegistry) -> Self {
        self.in_flight = registry;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The generation driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The in-flight registry.
    pub fn registry(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Generate and store an outline for a project.
    ///
    /// Partial text is forwarded to `sink` as it arrives. Cancellation via
    /// `cancel` during the service call ends the run with
    /// [`PipelineOutcome::Cancelled`] and stores nothing. On success the
    /// project records the model that produced the outline.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the failed stage. Validation
    /// failures happen before any request is sent.
    #[instrument(
        skip(self, params, sink, cancel),
        fields(theme = %params.theme, streaming = self.config.streaming)
    )]
    pub async fn generate_outline(
        &self,
        project_id: i64,
        params: &OutlineParams,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<PipelineOutcome<OutlineRecord>, PipelineError> {
        let _guard = self.begin(project_id)?;
        self.require_project(project_id).await?;

        let request = build_prompt(&GenerationParams::Outline(params.clone()))
            .map_err(|e| failed(PipelineStage::Validating, e))?;
        let request = apply_settings(request, &self.config.outline);

        let Some(text) = self.request_text(&request, sink, cancel).await? else {
            return Ok(PipelineOutcome::Cancelled);
        };

        debug!(stage = %PipelineStage::Parsing, text_len = text.len());
        let document = parse_outline(&text).map_err(|e| failed(PipelineStage::Parsing, e))?;

        debug!(stage = %PipelineStage::Persisting, chapters = document.chapters.len());
        let record = self
            .repository
            .save_outline(project_id, &document)
            .await
            .map_err(|e| failed(PipelineStage::Persisting, e))?;

        let model = request.model.as_deref().unwrap_or(self.driver.model_name());
        let update = ProjectUpdate {
            ai_model: Some(model.to_string()),
            ..ProjectUpdate::default()
        };
        self.repository
            .update_project(project_id, &update)
            .await
            .map_err(|e| failed(PipelineStage::Persisting, e))?;

        info!(
            stage = %PipelineStage::Done,
            outline_id = record.id,
            chapters = record.document.chapters.len(),
            "Outline generated"
        );
        Ok(PipelineOutcome::Completed(record))
    }

    /// Generate and store a chapter against the project's latest outline.
    ///
    /// The chapter is saved as a new revision with status `pending_review`.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the failed stage. A project with
    /// no outline, or an index outside the outline, fails validation.
    #[instrument(
        skip(self, style, sink, cancel),
        fields(streaming = self.config.streaming)
    )]
    pub async fn generate_chapter(
        &self,
        project_id: i64,
        chapter_index: i32,
        style: &StyleParams,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<PipelineOutcome<Chapter>, PipelineError> {
        let _guard = self.begin(project_id)?;
        self.require_project(project_id).await?;

        let outline = self
            .repository
            .get_latest_outline(project_id)
            .await
            .map_err(|e| failed(PipelineStage::Validating, e))?
            .ok_or_else(|| {
                failed(
                    PipelineStage::Validating,
                    ValidationError::new(format!("project {} has no outline", project_id)),
                )
            })?;

        let params = ChapterParams {
            project_id,
            chapter_index,
            outline: outline.document,
            style: style.clone(),
        };
        let request = build_prompt(&GenerationParams::Chapter(params.clone()))
            .map_err(|e| failed(PipelineStage::Validating, e))?;
        let settings = self.config.chapter;
        let request = apply_settings(request, &settings);

        let Some(text) = self.request_text(&request, sink, cancel).await? else {
            return Ok(PipelineOutcome::Cancelled);
        };

        debug!(stage = %PipelineStage::Parsing, text_len = text.len());
        let draft = parse_chapter(&text).map_err(|e| failed(PipelineStage::Parsing, e))?;
        let title = match draft.title.trim() {
            "" => params
                .outline
                .chapter(chapter_index as usize)
                .map(|entry| entry.title.clone())
                .unwrap_or_default(),
            title => title.to_string(),
        };

        debug!(stage = %PipelineStage::Persisting, content_len = draft.content.len());
        let ai_params = json!({
            "model": request.model.as_deref().unwrap_or(self.driver.model_name()),
            "temperature": settings.temperature,
            "max_tokens": settings.max_tokens,
            "style": style.style(),
            "length": style.length(),
        });
        let chapter = NewChapter::builder()
            .project_id(project_id)
            .chapter_index(chapter_index)
            .title(title)
            .content(draft.content)
            .status(ChapterStatus::PendingReview)
            .ai_params(ai_params)
            .build()
            .map_err(|e| failed(PipelineStage::Persisting, ValidationError::new(e.to_string())))?;
        let stored = self
            .repository
            .save_chapter(&chapter)
            .await
            .map_err(|e| failed(PipelineStage::Persisting, e))?;

        info!(
            stage = %PipelineStage::Done,
            chapter_id = stored.id,
            content_len = stored.content.len(),
            "Chapter generated"
        );
        Ok(PipelineOutcome::Completed(stored))
    }

    /// Claim the project for this run.
    fn begin(&self, project_id: i64) -> Result<InFlightGuard, PipelineError> {
        debug!(stage = %PipelineStage::Validating);
        self.in_flight.try_acquire(project_id).ok_or_else(|| {
            failed(
                PipelineStage::Validating,
                ValidationError::new(format!(
                    "a generation for project {} is already running",
                    project_id
                )),
            )
        })
    }

    async fn require_project(&self, project_id: i64) -> Result<(), PipelineError> {
        match self.repository.get_project(project_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(failed(
                PipelineStage::Validating,
                ValidationError::new(format!("project {} does not exist", project_id)),
            )),
            Err(e) => Err(failed(PipelineStage::Validating, e)),
        }
    }

    /// Requesting and Streaming. `None` means the caller cancelled.
    ///
    /// The stream handle is closed before returning on every path.
    async fn request_text(
        &self,
        request: &GenerateRequest,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Option<String>, PipelineError> {
        if cancel.is_cancelled() {
            info!(stage = %PipelineStage::Cancelled, "Cancelled before request");
            return Ok(None);
        }

        debug!(stage = %PipelineStage::Requesting, provider = self.driver.provider_name());
        let output = self
            .driver
            .call(request, self.config.streaming)
            .await
            .map_err(|e| failed(PipelineStage::Requesting, e))?;

        debug!(stage = %PipelineStage::Streaming);
        let outcome = match output {
            GenerationOutput::Complete(response) => {
                if cancel.is_cancelled() {
                    AggregateOutcome::Cancelled(String::new())
                } else {
                    if !response.text.is_empty() {
                        sink.send(&response.text)
                            .map_err(|e| failed(PipelineStage::Streaming, e))?;
                    }
                    AggregateOutcome::Completed(response.text)
                }
            }
            GenerationOutput::Stream(mut stream) => {
                let aggregated = StreamAggregator::new(self.config.flush_interval)
                    .consume(&mut stream, sink, cancel)
                    .await;
                stream.close();
                aggregated.map_err(|e| failed(PipelineStage::Streaming, e))?
            }
        };

        match outcome {
            AggregateOutcome::Completed(text) => Ok(Some(text)),
            AggregateOutcome::Cancelled(partial) => {
                info!(
                    stage = %PipelineStage::Cancelled,
                    discarded_len = partial.len(),
                    "Generation cancelled"
                );
                Ok(None)
            }
        }
    }
}

fn apply_settings(mut request: GenerateRequest, settings: &GenerationSettings) -> GenerateRequest {
    request.temperature = Some(settings.temperature as f32);
    request.max_tokens = Some(settings.max_tokens);
    request
}

#[track_caller]
fn failed(stage: PipelineStage, cause: impl Into<QuireError>) -> PipelineError {
    let err = PipelineError::new(stage, cause);
    error!(stage = %err.stage, error = %err.cause, "Pipeline failed");
    err
}
