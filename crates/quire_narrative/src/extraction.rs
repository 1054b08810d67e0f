//! Multi-strategy decoding of model responses.
//!
//! Model output is rarely clean JSON. Decoding tries, in order:
//! 1. The first fenced code block (any label, or none). The first JSON value
//!    after the opening fence is read directly, so fences inside strings and
//!    trailing prose do not matter
//! 2. The whole text, then the first balanced `{ ... }` object, when no
//!    fence is present
//! 3. Heuristic section extraction from the prose
//!
//! Each strategy runs only if the previous one failed. Parsing fails only
//! when all three do, which in practice means the response was blank.

use crate::StructuredDocument;
use quire_core::{ChapterDraft, OutlineDocument};
use quire_error::ParseError;
use serde_json::Value;
use tracing::{debug, instrument, warn};

const FENCE: &str = "```";

/// Decode a model response into a validated outline.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the raw text if every strategy fails.
///
/// # Examples
///
/// ```
/// use quire_narrative::parse_outline;
///
/// let response = "Here you go:\n```json\n{\"main_storyline\": {\"summary\": \"A theft.\"}, \
///                 \"chapters\": [\"The Wake\"]}\n```\nEnjoy!";
/// let outline = parse_outline(response).unwrap();
/// assert_eq!(outline.chapters[0].title, "The Wake");
/// assert_eq!(outline.storyline_text(), Some("A theft."));
/// ```
pub fn parse_outline(raw: &str) -> Result<OutlineDocument, ParseError> {
    parse_document(raw)
}

/// Decode a model response into a chapter draft.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the raw text if every strategy fails.
pub fn parse_chapter(raw: &str) -> Result<ChapterDraft, ParseError> {
    parse_document(raw)
}

/// Decode a model response into any [`StructuredDocument`].
#[instrument(skip(raw), fields(document = D::NAME, raw_len = raw.len()))]
pub fn parse_document<D: StructuredDocument>(raw: &str) -> Result<D, ParseError> {
    let mut attempts = Vec::new();

    if let Some(body) = fence_body(raw) {
        match decode_leading::<D>(body) {
            Ok(doc) => {
                debug!(strategy = "fenced_block", "Decoded response");
                return Ok(doc);
            }
            Err(reason) => attempts.push(format!("fenced block: {}", reason)),
        }
    } else {
        match decode::<D>(raw.trim()) {
            Ok(doc) => {
                debug!(strategy = "direct", "Decoded response");
                return Ok(doc);
            }
            Err(reason) => attempts.push(format!("direct decode: {}", reason)),
        }
        if let Some(object) = extract_balanced(raw, '{', '}') {
            match decode::<D>(object) {
                Ok(doc) => {
                    debug!(strategy = "embedded_object", "Decoded response");
                    return Ok(doc);
                }
                Err(reason) => attempts.push(format!("embedded object: {}", reason)),
            }
        }
    }

    match D::from_sections(raw) {
        Some(doc) => {
            warn!(
                attempts = %attempts.join("; "),
                "Structured decode failed, used heuristic section extraction"
            );
            Ok(doc)
        }
        None => {
            attempts.push("heuristic extraction: response is blank".to_string());
            let reason = attempts.join("; ");
            tracing::error!(reason = %reason, "All decode strategies failed");
            Err(ParseError::new(reason, raw))
        }
    }
}

/// Strict decode: the text must be JSON and the JSON must be an object.
fn decode<D: StructuredDocument>(text: &str) -> Result<D, String> {
    decode_value(serde_json::from_str::<Value>(text).map_err(|e| e.to_string())?)
}

/// Decode the first JSON value in `text`, ignoring whatever follows it.
fn decode_leading<D: StructuredDocument>(text: &str) -> Result<D, String> {
    let mut values = serde_json::Deserializer::from_str(text.trim_start()).into_iter::<Value>();
    match values.next() {
        Some(value) => decode_value(value.map_err(|e| e.to_string())?),
        None => Err("fenced block is empty".to_string()),
    }
}

fn decode_value<D: StructuredDocument>(value: Value) -> Result<D, String> {
    match value {
        Value::Object(object) => D::from_object(object),
        other => Err(format!("expected a JSON object, found {}", json_type(&other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Interior of the first fenced code block.
///
/// The fence label (e.g. `json`) is skipped. Only a fence at the start of a
/// line closes the block. An unterminated block, as left by a truncated
/// response, runs to the end of the text.
///
/// # Examples
///
/// ```
/// use quire_narrative::extract_fenced_block;
///
/// assert_eq!(extract_fenced_block("a\n```json\n{}\n```\nb"), Some("{}"));
/// assert_eq!(extract_fenced_block("```\nx = ```y```\n```"), Some("x = ```y```"));
/// assert_eq!(extract_fenced_block("```\n{\"cut\": "), Some("{\"cut\":"));
/// assert_eq!(extract_fenced_block("no fences here"), None);
/// ```
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let body = fence_body(text)?;
    let closing = body
        .match_indices(FENCE)
        .map(|(i, _)| i)
        .find(|&i| body[..i].rsplit('\n').next().is_some_and(|line| line.trim().is_empty()));
    let body = match closing {
        Some(end) => &body[..end],
        None => {
            debug!("Fenced block is unterminated, using the rest of the response");
            body
        }
    };
    Some(body.trim())
}

/// Everything after the opening fence line, or `None` without a fence.
fn fence_body(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let body_start = text[start..]
        .find('\n')
        .map(|n| start + n + 1)
        .unwrap_or(text.len());
    Some(&text[body_start..])
}

/// Content between the first `open` and its matching `close`.
///
/// Delimiters inside JSON strings are ignored.
fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
