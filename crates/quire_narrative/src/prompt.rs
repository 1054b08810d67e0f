//! Prompt construction.
//!
//! Turns generation parameters into a deterministic request payload. Every
//! prompt embeds the JSON shape the parser expects, so a well-behaved model
//! answers in a form the first decode strategy accepts.

use quire_core::{
    ChapterParams, GenerateRequest, GenerationParams, Message, OutlineDocument, OutlineParams,
};
use quire_error::{QuireResult, ValidationError};

/// Role description sent as the system turn of every request.
pub const SYSTEM_PROMPT: &str = "You are a professional novel-writing assistant. \
You plan stories carefully and keep plot, characters and tone consistent.";

/// Minimum number of chapters an outline prompt asks for.
pub const MIN_OUTLINE_CHAPTERS: usize = 5;

const OUTLINE_SCHEMA: &str = r#"{
  "main_storyline": {"summary": "string"},
  "chapters": [{"title": "string", "summary": "string"}],
  "characters": [{"name": "string", "description": "string"}],
  "worldbuilding": ["string"],
  "thematic_elements": ["string"],
  "key_points": ["string"]
}"#;

const CHAPTER_SCHEMA: &str = r#"{
  "title": "string",
  "content": "string"
}"#;

/// Build the request payload for a generation run.
///
/// The result carries only the conversation turns; sampling settings are
/// applied by the caller. Identical parameters always produce an identical
/// request.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a required field is blank, or if the
/// chapter index is not a position in the outline's chapter list.
///
/// # Examples
///
/// ```
/// use quire_core::{GenerationParams, OutlineParams};
/// use quire_narrative::build_prompt;
///
/// let params = GenerationParams::from(OutlineParams::new("mystery", "noir", "missing heirloom"));
/// let first = build_prompt(&params).unwrap();
/// let second = build_prompt(&params).unwrap();
/// assert_eq!(first, second);
/// assert!(first.messages[1].content.contains("\"chapters\""));
/// ```
pub fn build_prompt(params: &GenerationParams) -> QuireResult<GenerateRequest> {
    let task = match params {
        GenerationParams::Outline(outline) => outline_task(outline)?,
        GenerationParams::Chapter(chapter) => chapter_task(chapter)?,
    };

    let request = GenerateRequest::builder()
        .messages(vec![Message::system(SYSTEM_PROMPT), Message::user(task)])
        .build()
        .map_err(|e| ValidationError::new(format!("Failed to build request: {}", e)))?;

    tracing::debug!(
        kind = %params.kind(),
        prompt_len = request.messages[1].content.len(),
        "Built prompt"
    );
    Ok(request)
}

fn require<'a>(field: &str, value: &'a str) -> QuireResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::new(format!("{} must not be empty", field)))?
    }
    Ok(value)
}

fn outline_task(params: &OutlineParams) -> QuireResult<String> {
    let theme = require("theme", &params.theme)?;
    let style = require("style", &params.style)?;
    let topic = require("topic", &params.topic)?;

    Ok(format!(
        "Write a novel outline for the following brief.\n\
         Genre/theme: {theme}\n\
         Style: {style}\n\
         Topic: {topic}\n\
         \n\
         The outline must contain:\n\
         1. The main storyline\n\
         2. A chapter list (at least {MIN_OUTLINE_CHAPTERS} chapters, each with a title and a summary)\n\
         3. The main characters\n\
         4. The key plot points\n\
         \n\
         Reply with a single JSON object inside a ```json fenced block, using exactly this shape:\n\
         {OUTLINE_SCHEMA}"
    ))
}

fn chapter_task(params: &ChapterParams) -> QuireResult<String> {
    if params.chapter_index <= 0 {
        Err(ValidationError::new(format!(
            "chapter index must be positive, got {}",
            params.chapter_index
        )))?
    }
    let entry = params
        .outline
        .chapter(params.chapter_index as usize)
        .ok_or_else(|| {
            ValidationError::new(format!(
                "chapter {} is outside the outline's {} chapters",
                params.chapter_index,
                params.outline.chapters.len()
            ))
        })?;
    let title = require("chapter title", &entry.title)?;
    let style = require("style", params.style.style())?;
    let length = *params.style.length();
    if length == 0 {
        Err(ValidationError::new("target length must be positive"))?
    }

    let mut task = format!(
        "Write chapter {index} of the novel outlined below.\n\
         Main storyline: {storyline}\n\
         Chapter title: {title}\n",
        index = params.chapter_index,
        storyline = storyline_summary(&params.outline),
    );
    if !entry.summary.trim().is_empty() {
        task.push_str(&format!("Chapter summary: {}\n", entry.summary.trim()));
    }
    task.push_str(&format!(
        "Writing style: {style}\n\
         Target length: about {length} characters\n\
         Keep the plot continuous and the characters consistent with the outline.\n\
         \n\
         Reply with a single JSON object inside a ```json fenced block, using exactly this shape:\n\
         {CHAPTER_SCHEMA}"
    ));
    Ok(task)
}

/// Storyline prose for the prompt; falls back to the serialized mapping.
fn storyline_summary(outline: &OutlineDocument) -> String {
    match outline.storyline_text() {
        Some(text) => text.trim().to_string(),
        None if outline.main_storyline.is_empty() => String::from("(not specified)"),
        None => serde_json::Value::Object(outline.main_storyline.clone()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{ChapterOutline, StyleParams};
    use quire_error::QuireErrorKind;

    fn outline() -> OutlineDocument {
        let mut doc = OutlineDocument::default();
        doc.main_storyline.insert(
            "summary".to_string(),
            serde_json::json!("A jade pendant vanishes during a wake."),
        );
        doc.chapters = vec![
            ChapterOutline::new("The Wake", "Relatives gather."),
            ChapterOutline::new("The Will", ""),
        ];
        doc
    }

    fn chapter(index: i32) -> GenerationParams {
        GenerationParams::from(ChapterParams {
            project_id: 1,
            chapter_index: index,
            outline: outline(),
            style: StyleParams::new("noir", 1500),
        })
    }

    fn is_validation(result: QuireResult<GenerateRequest>) -> bool {
        matches!(result.map_err(|e| e.into_kind()), Err(QuireErrorKind::Validation(_)))
    }

    #[test]
    fn test_outline_prompt_embeds_brief_and_schema() {
        let params = OutlineParams::new("mystery", "noir", "missing heirloom");
        let request = build_prompt(&params.into()).unwrap();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        let task = &request.messages[1].content;
        assert!(task.contains("Genre/theme: mystery"));
        assert!(task.contains("at least 5 chapters"));
        assert!(task.contains("\"main_storyline\""));
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_blank_outline_fields_are_rejected() {
        for (theme, style, topic) in [("", "noir", "x"), ("mystery", "  ", "x"), ("a", "b", "\n")] {
            let params = OutlineParams::new(theme, style, topic);
            assert!(is_validation(build_prompt(&params.into())));
        }
    }

    #[test]
    fn test_chapter_prompt_uses_outline_entry() {
        let request = build_prompt(&chapter(1)).unwrap();
        let task = &request.messages[1].content;
        assert!(task.contains("Write chapter 1"));
        assert!(task.contains("Chapter title: The Wake"));
        assert!(task.contains("Chapter summary: Relatives gather."));
        assert!(task.contains("A jade pendant vanishes"));
        assert!(task.contains("about 1500 characters"));

        let task = build_prompt(&chapter(2)).unwrap().messages[1].content.clone();
        assert!(!task.contains("Chapter summary"));
    }

    #[test]
    fn test_chapter_index_must_be_in_range() {
        assert!(is_validation(build_prompt(&chapter(0))));
        assert!(is_validation(build_prompt(&chapter(-2))));
        assert!(is_validation(build_prompt(&chapter(3))));
    }
}
