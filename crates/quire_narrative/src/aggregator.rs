//! Streaming aggregation with a flush policy.

use futures_util::{Stream, StreamExt};
use quire_error::{QuireResult, SinkError};
use quire_interface::StreamChunk;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Flush interval used when none is configured.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Characters that force a flush when a fragment contains one.
pub const FLUSH_PUNCTUATION: [char; 9] = ['.', '!', '?', ',', '\n', '。', '！', '？', '，'];

/// Receiver of partial text during streaming.
///
/// Any `FnMut(&str) -> Result<(), SinkError>` closure is a sink.
pub trait ProgressSink: Send {
    /// Forward a run of buffered text.
    fn send(&mut self, text: &str) -> Result<(), SinkError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(&str) -> Result<(), SinkError> + Send,
{
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        self(text)
    }
}

/// Sink that forwards text over an unbounded channel.
///
/// Sending never blocks. A dropped receiver is reported as a [`SinkError`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    /// Wrap the sending half of a channel.
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        self.tx
            .send(text.to_string())
            .map_err(|_| SinkError::new("progress receiver was dropped"))
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn send(&mut self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Cooperative cancellation flag shared between a caller and a pipeline.
///
/// # Examples
///
/// ```
/// use quire_narrative::CancelToken;
///
/// let token = CancelToken::new();
/// let observer = token.clone();
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How an aggregation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateOutcome {
    /// The producer was exhausted; holds the full text.
    Completed(String),
    /// Cancellation was observed; holds the text flushed so far.
    Cancelled(String),
}

/// Drains a chunk stream, forwarding partial text to a sink.
#[derive(Debug, Clone, Copy)]
pub struct StreamAggregator {
    flush_interval: Duration,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_INTERVAL)
    }
}

impl StreamAggregator {
    /// Aggregator that flushes at least every `flush_interval`.
    pub fn new(flush_interval: Duration) -> Self {
        Self { flush_interval }
    }

    /// The configured flush interval.
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Consume `chunks` until it ends, fails or `cancel` is set.
    ///
    /// The buffer is flushed to `sink` when a fragment carries sentence
    /// punctuation or the flush interval has elapsed, and once more when the
    /// producer ends. The concatenation of everything sent to the sink is
    /// exactly the returned text. Cancellation is checked between chunks and
    /// discards the unflushed buffer.
    ///
    /// # Errors
    ///
    /// A producer error is returned as-is; a sink failure aborts the run
    /// with a [`SinkError`].
    #[instrument(skip_all, fields(flush_ms = self.flush_interval.as_millis() as u64))]
    pub async fn consume<S>(
        &self,
        chunks: &mut S,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> QuireResult<AggregateOutcome>
    where
        S: Stream<Item = QuireResult<StreamChunk>> + Unpin + ?Sized,
    {
        let mut full = String::new();
        let mut buffer = String::new();
        let mut last_flush = Instant::now();
        let mut fragments = 0usize;

        loop {
            if cancel.is_cancelled() {
                debug!(fragments, discarded = buffer.len(), "Aggregation cancelled");
                return Ok(AggregateOutcome::Cancelled(full));
            }

            let Some(chunk) = chunks.next().await else {
                break;
            };
            let chunk = chunk?;
            if cancel.is_cancelled() {
                debug!(fragments, discarded = buffer.len(), "Aggregation cancelled");
                return Ok(AggregateOutcome::Cancelled(full));
            }
            if chunk.content.is_empty() {
                continue;
            }

            fragments += 1;
            buffer.push_str(&chunk.content);

            let punctuated = chunk.content.contains(FLUSH_PUNCTUATION);
            if punctuated || last_flush.elapsed() >= self.flush_interval {
                flush(sink, &mut buffer, &mut full)?;
                last_flush = Instant::now();
            }
        }

        if !buffer.is_empty() {
            flush(sink, &mut buffer, &mut full)?;
        }

        debug!(fragments, total_len = full.len(), "Aggregation complete");
        Ok(AggregateOutcome::Completed(full))
    }
}

fn flush(
    sink: &mut dyn ProgressSink,
    buffer: &mut String,
    full: &mut String,
) -> Result<(), SinkError> {
    sink.send(buffer)?;
    full.push_str(buffer);
    buffer.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = QuireResult<StreamChunk>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(StreamChunk::text(*p)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_punctuation_forces_flush() {
        let mut sent = Vec::new();
        let mut sink = |text: &str| -> Result<(), SinkError> {
            sent.push(text.to_string());
            Ok(())
        };
        let aggregator = StreamAggregator::new(Duration::from_secs(3600));

        let outcome = aggregator
            .consume(
                &mut chunks(&["The ", "fog", " lifted.", " Then", " silence"]),
                &mut sink,
                &CancelToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AggregateOutcome::Completed("The fog lifted. Then silence".to_string())
        );
        assert_eq!(sent, vec!["The fog lifted.", " Then silence"]);
    }

    #[tokio::test]
    async fn test_full_width_punctuation_flushes() {
        let mut sent = Vec::new();
        let mut sink = |text: &str| -> Result<(), SinkError> {
            sent.push(text.to_string());
            Ok(())
        };
        StreamAggregator::new(Duration::from_secs(3600))
            .consume(&mut chunks(&["夜色", "很深。", "雨"]), &mut sink, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(sent, vec!["夜色很深。", "雨"]);
    }

    #[tokio::test]
    async fn test_zero_interval_flushes_every_fragment() {
        let mut count = 0;
        let mut sink = |_: &str| -> Result<(), SinkError> {
            count += 1;
            Ok(())
        };
        StreamAggregator::new(Duration::ZERO)
            .consume(&mut chunks(&["a", "b", "c"]), &mut sink, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_cancel_before_start_sends_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut calls = 0;
        let mut sink = |_: &str| -> Result<(), SinkError> {
            calls += 1;
            Ok(())
        };

        let outcome = StreamAggregator::default()
            .consume(&mut chunks(&["Never."]), &mut sink, &token)
            .await
            .unwrap();

        assert_eq!(outcome, AggregateOutcome::Cancelled(String::new()));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_sink_failure_aborts() {
        let mut sink =
            |_: &str| -> Result<(), SinkError> { Err(SinkError::new("window closed")) };
        let err = StreamAggregator::default()
            .consume(&mut chunks(&["One.", "Two."]), &mut sink, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.kind(), quire_error::QuireErrorKind::Sink(_)));
    }

    #[tokio::test]
    async fn test_channel_sink_reports_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        assert!(sink.send("first").is_ok());
        drop(rx);
        assert!(sink.send("second").is_err());
    }
}
