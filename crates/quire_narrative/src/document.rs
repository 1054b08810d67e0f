//! Validation and coercion of decoded documents.

use crate::sections::outline_from_sections;
use quire_core::{ChapterDraft, ChapterOutline, CharacterSketch, OutlineDocument};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

/// Chapter headings such as `Chapter 3: The Will` or `第三章 守灵夜`.
static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?(?:chapter\s+\S+|第\S{1,8}章)").expect("valid chapter heading pattern")
});

/// Longest line treated as a heading.
const MAX_HEADING_CHARS: usize = 80;

/// A document the resilient parser can produce.
pub trait StructuredDocument: Sized {
    /// Name used in logs.
    const NAME: &'static str;

    /// Build from a strictly decoded JSON object, coercing loose shapes.
    ///
    /// An error sends the parser on to its next strategy.
    fn from_object(object: Map<String, Value>) -> Result<Self, String>;

    /// Build from unstructured text. `None` means nothing usable was found.
    fn from_sections(text: &str) -> Option<Self>;
}

impl StructuredDocument for OutlineDocument {
    const NAME: &'static str = "outline";

    fn from_object(mut object: Map<String, Value>) -> Result<Self, String> {
        let main_storyline = match object.remove("main_storyline") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!(found = %other, "main_storyline is not a mapping, using an empty one");
                Map::new()
            }
            None => {
                warn!("Outline has no main_storyline, using an empty one");
                Map::new()
            }
        };

        let chapters = match object.remove("chapters") {
            Some(Value::Array(items)) => items.into_iter().map(coerce_chapter).collect(),
            Some(other) => {
                warn!(found = %other, "chapters is not a list, using an empty one");
                Vec::new()
            }
            None => {
                warn!("Outline has no chapters, using an empty list");
                Vec::new()
            }
        };

        Ok(OutlineDocument {
            main_storyline,
            chapters,
            characters: object
                .remove("characters")
                .map(coerce_characters)
                .unwrap_or_default(),
            worldbuilding: object
                .remove("worldbuilding")
                .map(string_list)
                .unwrap_or_default(),
            thematic_elements: object
                .remove("thematic_elements")
                .map(string_list)
                .unwrap_or_default(),
            key_points: object
                .remove("key_points")
                .map(string_list)
                .unwrap_or_default(),
        })
    }

    fn from_sections(text: &str) -> Option<Self> {
        outline_from_sections(text)
    }
}

impl StructuredDocument for ChapterDraft {
    const NAME: &'static str = "chapter";

    fn from_object(object: Map<String, Value>) -> Result<Self, String> {
        let content = first_text(&object, &["content", "text", "body"])
            .ok_or_else(|| "chapter object has no content field".to_string())?;
        let title = first_text(&object, &["title", "chapter_title"]).unwrap_or_default();
        Ok(ChapterDraft { title, content })
    }

    fn from_sections(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(draft) = partial_chapter_object(text) {
            warn!(
                content_len = draft.content.len(),
                "Recovered chapter from an unterminated JSON object"
            );
            return Some(draft);
        }

        let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
        let rest = rest.trim();
        if is_heading(first) && !rest.is_empty() {
            Some(ChapterDraft {
                title: clean_heading(first).to_string(),
                content: rest.to_string(),
            })
        } else {
            Some(ChapterDraft {
                title: String::new(),
                content: text.to_string(),
            })
        }
    }
}

/// Title and content read from a JSON object cut off mid-string.
///
/// `None` unless the text (or its fenced block) opens a JSON object with a
/// non-empty content field.
fn partial_chapter_object(text: &str) -> Option<ChapterDraft> {
    let body = crate::extract_fenced_block(text).unwrap_or(text);
    if !body.starts_with('{') {
        return None;
    }
    let content = ["content", "text", "body"]
        .iter()
        .find_map(|key| partial_string_field(body, key))
        .filter(|content| !content.trim().is_empty())?;
    let title = ["title", "chapter_title"]
        .iter()
        .find_map(|key| partial_string_field(body, key))
        .unwrap_or_default();
    Some(ChapterDraft {
        title: title.trim().to_string(),
        content: content.trim().to_string(),
    })
}

/// Unescaped value of the string field `key`, up to its closing quote or the
/// end of the text.
fn partial_string_field(json: &str, key: &str) -> Option<String> {
    let pattern = format!("\"{}\"", key);
    let after_key = &json[json.find(&pattern)? + pattern.len()..];
    let after_colon = after_key.trim_start().strip_prefix(':')?;
    let value = after_colon.trim_start().strip_prefix('"')?;

    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(decoded) => out.push(decoded),
                        None => out.push(char::REPLACEMENT_CHARACTER),
                    }
                }
                Some(other) => out.push(other),
                None => break,
            },
            other => out.push(other),
        }
    }
    Some(out)
}

fn is_heading(line: &str) -> bool {
    let line = line.trim();
    line.chars().count() <= MAX_HEADING_CHARS
        && (line.starts_with('#') || CHAPTER_HEADING.is_match(line))
}

fn clean_heading(line: &str) -> &str {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(['*', '_'])
        .trim()
}

/// Text of the first present key among `keys`.
fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .map(value_text)
}

/// A JSON value as plain text: strings unquoted, null empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_chapter(value: Value) -> ChapterOutline {
    match value {
        Value::String(title) => ChapterOutline::new(title, ""),
        Value::Object(object) => ChapterOutline::new(
            first_text(&object, &["title", "name"]).unwrap_or_default(),
            first_text(&object, &["summary", "description", "content"]).unwrap_or_default(),
        ),
        other => ChapterOutline::new(other.to_string(), ""),
    }
}

fn coerce_characters(value: Value) -> Vec<CharacterSketch> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => CharacterSketch {
                    name: first_text(&object, &["name", "title"]).unwrap_or_default(),
                    description: first_text(
                        &object,
                        &["description", "summary", "role", "background"],
                    )
                    .unwrap_or_default(),
                },
                other => CharacterSketch {
                    name: value_text(&other),
                    description: String::new(),
                },
            })
            .collect(),
        Value::Object(object) => object
            .into_iter()
            .map(|(name, description)| CharacterSketch {
                name,
                description: value_text(&description),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![CharacterSketch {
            name: value_text(&other),
            description: String::new(),
        }],
    }
}

/// Lenient list of strings.
fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => render_pairs(&object),
                other => value_text(&other),
            })
            .collect(),
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value_text(value)))
            .collect(),
        Value::Null => Vec::new(),
        other => vec![value_text(&other)],
    }
}

fn render_pairs(object: &Map<String, Value>) -> String {
    object
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value_text(value)))
        .collect::<Vec<_>>()
        .join(", ")
}
