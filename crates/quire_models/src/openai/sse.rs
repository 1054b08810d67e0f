//! Incremental server-sent-event decoding.

use super::convert::chunk_to_stream_chunk;
use super::ChatCompletionChunk;
use futures_util::stream::{self, Stream, StreamExt};
use quire_error::{QuireResult, ServiceError, ServiceErrorKind};
use quire_interface::StreamChunk;
use std::collections::VecDeque;

/// Marker that ends an OpenAI-style event stream.
pub(crate) const DONE_MARKER: &str = "[DONE]";

/// Splits a byte stream into SSE `data` payloads.
///
/// Bytes are buffered until a blank line completes an event, so events and
/// multi-byte characters may be split across network chunks arbitrarily.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes, returning the payloads of every event they complete.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(data) = event_data(&event[..pos]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush an event left unterminated when the body ended.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        event_data(&rest)
    }
}

fn event_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    body_done: bool,
}

/// Decode a chat completion SSE body into text chunks.
///
/// The stream ends at the `[DONE]` marker or at end of body, whichever
/// comes first. Transport failures surface as transient network errors.
pub(crate) fn decode_chunks<S, B, E>(body: S) -> impl Stream<Item = QuireResult<StreamChunk>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        body_done: false,
    };

    stream::try_unfold(state, next_chunk::<S, B, E>)
}

async fn next_chunk<S, B, E>(
    mut state: DecodeState<S>,
) -> QuireResult<Option<(StreamChunk, DecodeState<S>)>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    loop {
        if let Some(data) = state.pending.pop_front() {
            if data.trim() == DONE_MARKER {
                tracing::trace!("Received end-of-stream marker");
                return Ok(None);
            }
            let chunk: ChatCompletionChunk = serde_json::from_str(&data).map_err(|e| {
                tracing::error!("Failed to parse stream chunk: {}", e);
                ServiceError::new(ServiceErrorKind::Unknown(format!(
                    "Failed to parse chunk: {}",
                    e
                )))
            })?;
            if let Some(chunk) = chunk_to_stream_chunk(chunk) {
                return Ok(Some((chunk, state)));
            }
            continue;
        }

        if state.body_done {
            return Ok(None);
        }

        match state.body.next().await {
            Some(Ok(bytes)) => {
                let events = state.decoder.push(bytes.as_ref());
                state.pending.extend(events);
            }
            Some(Err(e)) => {
                tracing::error!("Stream interrupted: {}", e);
                return Err(ServiceError::new(ServiceErrorKind::TransientNetwork(format!(
                    "Stream interrupted: {}",
                    e
                )))
                .into());
            }
            None => {
                state.body_done = true;
                let rest = state.decoder.finish();
                state.pending.extend(rest);
            }
        }
    }
}
