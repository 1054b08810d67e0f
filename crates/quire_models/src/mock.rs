//! Scripted generation driver for tests.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use quire_core::{GenerateRequest, GenerateResponse};
use quire_error::{QuireError, QuireResult, ServiceError, ServiceErrorKind};
use quire_interface::{FinishReason, GenerationDriver, GenerationStream, StreamChunk, Streaming};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One step of a scripted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockStep {
    /// Yield a text fragment
    Text(String),
    /// Fail mid-stream
    Fail(ServiceErrorKind),
}

/// A driver that replays a fixed script instead of calling a service.
///
/// It records every request it receives and whether its most recent
/// stream handle has been released.
///
/// # Examples
///
/// ```
/// use quire_models::ScriptedDriver;
///
/// let driver = ScriptedDriver::from_fragments(["Once ", "upon ", "a time."]);
/// assert_eq!(driver.full_text(), "Once upon a time.");
/// assert!(!driver.stream_released());
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    steps: Vec<MockStep>,
    open_error: Option<ServiceErrorKind>,
    delay: Option<Duration>,
    released: Arc<AtomicBool>,
    streams_opened: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedDriver {
    /// Script that yields each fragment in order.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_steps(fragments.into_iter().map(|f| MockStep::Text(f.into())))
    }

    /// Script that yields `text` split into pieces of at most `size` characters.
    pub fn from_text(text: &str, size: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self::from_fragments(
            chars
                .chunks(size.max(1))
                .map(|piece| piece.iter().collect::<String>()),
        )
    }

    /// Script from explicit steps.
    pub fn from_steps(steps: impl IntoIterator<Item = MockStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            open_error: None,
            delay: None,
            released: Arc::new(AtomicBool::new(false)),
            streams_opened: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every call before any output is produced.
    pub fn failing(kind: ServiceErrorKind) -> Self {
        let mut driver = Self::from_steps(Vec::new());
        driver.open_error = Some(kind);
        driver
    }

    /// Pause before each streamed fragment.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Concatenated text of every `Text` step.
    pub fn full_text(&self) -> String {
        self.steps
            .iter()
            .filter_map(|step| match step {
                MockStep::Text(text) => Some(text.as_str()),
                MockStep::Fail(_) => None,
            })
            .collect()
    }

    /// Whether the most recently opened stream handle was released.
    pub fn stream_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of streams opened so far.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn record(&self, req: &GenerateRequest) -> Result<(), ServiceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        match &self.open_error {
            Some(kind) => Err(ServiceError::new(kind.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerationDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> QuireResult<GenerateResponse> {
        self.record(req)?;
        if let Some(MockStep::Fail(kind)) = self.steps.iter().find(|s| matches!(s, MockStep::Fail(_))) {
            return Err(ServiceError::new(kind.clone()).into());
        }
        Ok(GenerateResponse {
            text: self.full_text(),
            finish_reason: Some(FinishReason::Stop.to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[async_trait]
impl Streaming for ScriptedDriver {
    async fn generate_stream(&self, req: &GenerateRequest) -> QuireResult<GenerationStream> {
        self.record(req)?;
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        self.released.store(false, Ordering::SeqCst);

        let delay = self.delay;
        let chunks = stream::iter(self.steps.clone()).then(move |step| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match step {
                MockStep::Text(text) => Ok(StreamChunk::text(text)),
                MockStep::Fail(kind) => Err(QuireError::from(ServiceError::new(kind))),
            }
        });

        let released = self.released.clone();
        Ok(GenerationStream::new(chunks).on_release(move || released.store(true, Ordering::SeqCst)))
    }
}
