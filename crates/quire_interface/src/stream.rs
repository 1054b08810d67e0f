//! Streaming response types.

use futures_util::stream::Stream;
use quire_error::QuireResult;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A single chunk from a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text.
    pub content: String,
    /// Whether this is the final chunk.
    pub is_final: bool,
    /// Optional finish reason if final.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// A non-final text fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: false,
            finish_reason: None,
        }
    }
}

/// Why generation stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

impl FinishReason {
    /// Map a wire-format finish reason.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

type ChunkStream = Pin<Box<dyn Stream<Item = QuireResult<StreamChunk>> + Send>>;
type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Handle to an in-flight streaming response.
///
/// The handle is lazy, finite and cannot be restarted. The underlying
/// connection is released exactly once: by [`GenerationStream::close`], or
/// by `Drop` on any other exit path.
///
/// # Examples
///
/// ```
/// use futures_util::stream;
/// use quire_interface::{GenerationStream, StreamChunk};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let released = Arc::new(AtomicBool::new(false));
/// let flag = released.clone();
/// let handle = GenerationStream::new(stream::iter(vec![Ok(StreamChunk::text("Once"))]))
///     .on_release(move || flag.store(true, Ordering::SeqCst));
///
/// assert!(!handle.is_drained());
/// handle.close();
/// assert!(released.load(Ordering::SeqCst));
/// ```
pub struct GenerationStream {
    inner: Option<ChunkStream>,
    drained: bool,
    on_release: Option<ReleaseHook>,
}

impl GenerationStream {
    /// Wrap a chunk stream.
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = QuireResult<StreamChunk>> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(inner)),
            drained: false,
            on_release: None,
        }
    }

    /// Register a callback that runs when the handle is released.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Release the handle without draining it.
    pub fn close(mut self) {
        self.release();
    }

    /// Whether the producer reported its end.
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            drop(inner);
            if self.drained {
                tracing::trace!("Released drained generation stream");
            } else {
                tracing::debug!("Released generation stream before end of response");
            }
            if let Some(hook) = self.on_release.take() {
                hook();
            }
        }
    }
}

impl Stream for GenerationStream {
    type Item = QuireResult<StreamChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.drained = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for GenerationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationStream")
            .field("open", &self.inner.is_some())
            .field("drained", &self.drained)
            .finish()
    }
}
