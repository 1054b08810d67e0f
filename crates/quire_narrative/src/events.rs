//! Background pipeline runs and per-project exclusion.

use crate::{CancelToken, NarrativePipeline, PipelineOutcome, ProgressSink};
use quire_core::{OutlineParams, StyleParams};
use quire_error::{PipelineError, SinkError};
use quire_interface::{Chapter, OutlineRecord, Streaming};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

/// Set of projects with a generation currently running.
///
/// Clones share the same set.
///
/// # Examples
///
/// ```
/// use quire_narrative::InFlightRegistry;
///
/// let registry = InFlightRegistry::new();
/// let guard = registry.try_acquire(7).unwrap();
/// assert!(registry.try_acquire(7).is_none());
/// drop(guard);
/// assert!(registry.try_acquire(7).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<i64>>>,
}

impl InFlightRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a project. `None` if a run already holds it.
    pub fn try_acquire(&self, project_id: i64) -> Option<InFlightGuard> {
        if self.lock().insert(project_id) {
            Some(InFlightGuard {
                registry: self.clone(),
                project_id,
            })
        } else {
            debug!(project_id, "Project already has a generation in flight");
            None
        }
    }

    /// Whether a run currently holds the project.
    pub fn is_active(&self, project_id: i64) -> bool {
        self.lock().contains(&project_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<i64>> {
        // The set stays consistent even if a holder panicked.
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Releases a project claim when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    project_id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.project_id);
    }
}

/// Progress and termination of a background run.
///
/// A run sends any number of `Partial` events followed by exactly one
/// terminal event.
#[derive(Debug)]
pub enum PipelineEvent<T> {
    /// Flushed partial text, in arrival order
    Partial(String),
    /// The run stored its artifact
    Completed(T),
    /// The run was cancelled
    Cancelled,
    /// The run failed
    Failed(PipelineError),
}

impl<T> PipelineEvent<T> {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Partial(_))
    }
}

/// Handle to a pipeline running on a tokio task.
#[derive(Debug)]
pub struct PipelineHandle<T> {
    events: UnboundedReceiver<PipelineEvent<T>>,
    cancel: CancelToken,
    task: JoinHandle<()>,
}

impl<T> PipelineHandle<T> {
    /// Ask the run to stop at the next chunk boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token the run observes.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the terminal event has been taken.
    pub async fn next_event(&mut self) -> Option<PipelineEvent<T>> {
        self.events.recv().await
    }

    /// Skip partial text and wait for the terminal event.
    pub async fn finish(mut self) -> Option<PipelineEvent<T>> {
        while let Some(event) = self.events.recv().await {
            if event.is_terminal() {
                return Some(event);
            }
        }
        None
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Events as a stream. The run keeps going in the background.
    pub fn into_stream(self) -> UnboundedReceiverStream<PipelineEvent<T>> {
        UnboundedReceiverStream::new(self.events)
    }
}

/// Forwards flushed text as `Partial` events.
struct EventSink<T> {
    tx: UnboundedSender<PipelineEvent<T>>,
}

impl<T: Send> ProgressSink for EventSink<T> {
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        self.tx
            .send(PipelineEvent::Partial(text.to_string()))
            .map_err(|_| SinkError::new("event receiver was dropped"))
    }
}

impl<D: Streaming + 'static> NarrativePipeline<D> {
    /// Run [`generate_outline`](Self::generate_outline) on a background task.
    pub fn spawn_outline(
        self: &Arc<Self>,
        project_id: i64,
        params: OutlineParams,
    ) -> PipelineHandle<OutlineRecord> {
        let pipeline = Arc::clone(self);
        spawn_run(move |mut sink, cancel| async move {
            pipeline
                .generate_outline(project_id, &params, &mut sink, &cancel)
                .await
        })
    }

    /// Run [`generate_chapter`](Self::generate_chapter) on a background task.
    pub fn spawn_chapter(
        self: &Arc<Self>,
        project_id: i64,
        chapter_index: i32,
        style: StyleParams,
    ) -> PipelineHandle<Chapter> {
        let pipeline = Arc::clone(self);
        spawn_run(move |mut sink, cancel| async move {
            pipeline
                .generate_chapter(project_id, chapter_index, &style, &mut sink, &cancel)
                .await
        })
    }
}

fn spawn_run<T, F, Fut>(run: F) -> PipelineHandle<T>
where
    T: Send + 'static,
    F: FnOnce(EventSink<T>, CancelToken) -> Fut,
    Fut: Future<Output = Result<PipelineOutcome<T>, PipelineError>> + Send + 'static,
{
    let (tx, events) = mpsc::unbounded_channel();
    let cancel = CancelToken::new();
    let run = run(EventSink { tx: tx.clone() }, cancel.clone());

    let task = tokio::spawn(async move {
        let terminal = match run.await {
            Ok(PipelineOutcome::Completed(value)) => PipelineEvent::Completed(value),
            Ok(PipelineOutcome::Cancelled) => PipelineEvent::Cancelled,
            Err(e) => PipelineEvent::Failed(e),
        };
        if tx.send(terminal).is_err() {
            debug!("Event receiver dropped before the run ended");
        }
    });

    PipelineHandle {
        events,
        cancel,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_are_per_project() {
        let registry = InFlightRegistry::new();
        let _one = registry.try_acquire(1).unwrap();
        let _two = registry.try_acquire(2).unwrap();
        assert!(registry.is_active(1));
        assert!(registry.try_acquire(1).is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = InFlightRegistry::new();
        let other = registry.clone();
        let guard = registry.try_acquire(3).unwrap();
        assert!(other.is_active(3));
        drop(guard);
        assert!(!other.is_active(3));
    }

    #[test]
    fn test_terminal_events() {
        assert!(!PipelineEvent::<()>::Partial("x".into()).is_terminal());
        assert!(PipelineEvent::<()>::Cancelled.is_terminal());
        assert!(PipelineEvent::Completed(()).is_terminal());
    }
}
