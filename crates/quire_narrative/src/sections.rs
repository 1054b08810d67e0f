//! Heuristic section extraction for prose outlines.

use quire_core::{ChapterOutline, CharacterSketch, OutlineDocument};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Leading list markers: `-`, `*`, `•`, `1.`, `1)`, `1、`, `一、`.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•+]\s+|\d+[.)、]\s*|[一二三四五六七八九十]+、\s*)")
        .expect("valid list marker pattern")
});

/// Outline sections a label can introduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Storyline,
    Chapters,
    Characters,
    Worldbuilding,
    Themes,
    KeyPoints,
}

// Longer labels precede their prefixes.
const LABELS: &[(&str, Section)] = &[
    ("main storyline", Section::Storyline),
    ("storyline", Section::Storyline),
    ("overview", Section::Storyline),
    ("故事主线", Section::Storyline),
    ("主线", Section::Storyline),
    ("chapter list", Section::Chapters),
    ("chapter outline", Section::Chapters),
    ("chapters", Section::Chapters),
    ("章节划分", Section::Chapters),
    ("章节", Section::Chapters),
    ("main characters", Section::Characters),
    ("characters", Section::Characters),
    ("主要人物设定", Section::Characters),
    ("人物设定", Section::Characters),
    ("人物", Section::Characters),
    ("worldbuilding", Section::Worldbuilding),
    ("setting", Section::Worldbuilding),
    ("世界观", Section::Worldbuilding),
    ("thematic elements", Section::Themes),
    ("themes", Section::Themes),
    ("主题", Section::Themes),
    ("key plot points", Section::KeyPoints),
    ("key points", Section::KeyPoints),
    ("关键情节点", Section::KeyPoints),
];

/// Recognize a section label line.
///
/// Returns the section and any text that follows the label on the same
/// line. Markdown headings, bold markers, numbering, parenthesized notes and
/// a trailing ASCII or full-width colon are tolerated.
pub(crate) fn match_label(line: &str) -> Option<(Section, &str)> {
    let mut text = line.trim().trim_start_matches('#').trim_start();
    text = LIST_MARKER
        .find(text)
        .map(|m| &text[m.end()..])
        .unwrap_or(text);
    text = text.trim_start_matches(['*', '_']).trim_start();

    LABELS.iter().find_map(|(label, section)| {
        let head = text.get(..label.len())?;
        if !head.eq_ignore_ascii_case(label) {
            return None;
        }
        label_rest(&text[label.len()..]).map(|rest| (*section, rest))
    })
}

/// What may follow a label: nothing, a colon, or a parenthesized note.
fn label_rest(rest: &str) -> Option<&str> {
    let rest = rest.trim_start_matches(['*', '_']).trim_start();
    if rest.is_empty() {
        return Some("");
    }
    if let Some(after) = rest.strip_prefix([':', '：']) {
        return Some(after.trim_start_matches(['*', '_']).trim());
    }
    if rest.starts_with(['(', '（']) {
        let close = rest.find([')', '）'])?;
        let closing_len = rest[close..].chars().next()?.len_utf8();
        return label_rest(&rest[close + closing_len..]);
    }
    None
}

/// Strip list markers and emphasis from an item line.
fn clean_item(line: &str) -> &str {
    let line = line.trim();
    let line = LIST_MARKER
        .find(line)
        .map(|m| &line[m.end()..])
        .unwrap_or(line);
    line.trim_matches(['*', '_']).trim()
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !LIST_MARKER.is_match(line.trim_start())
}

/// Split `Name: description` style items.
fn split_pair(item: &str) -> (&str, &str) {
    for separator in ["：", ": ", " - ", " — "] {
        if let Some((head, tail)) = item.split_once(separator) {
            return (head.trim(), tail.trim());
        }
    }
    (item, "")
}

fn append(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Lines grouped by the section they belong to, in text order.
fn labeled_sections(text: &str) -> Vec<(Section, Vec<&str>)> {
    let mut sections: Vec<(Section, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some((section, rest)) = match_label(line) {
            let mut lines = Vec::new();
            if !rest.is_empty() {
                lines.push(rest);
            }
            sections.push((section, lines));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }
    sections
}

/// Blocks separated by blank lines, mapped by position.
fn positional_sections(text: &str) -> Vec<(Section, Vec<&str>)> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let order = [Section::Chapters, Section::Characters, Section::KeyPoints];
    let mut blocks = blocks.into_iter();
    let mut sections = Vec::new();
    if let Some(first) = blocks.next() {
        sections.push((Section::Storyline, first));
    }
    for (section, block) in order.into_iter().zip(blocks) {
        sections.push((section, block.into_iter().skip(1).collect()));
    }
    sections
}

/// Build an outline from unstructured text.
///
/// Returns `None` only for blank input. Sections that cannot be found are
/// left empty.
pub(crate) fn outline_from_sections(text: &str) -> Option<OutlineDocument> {
    if text.trim().is_empty() {
        return None;
    }

    let mut sections = labeled_sections(text);
    if sections.is_empty() {
        tracing::debug!("No section labels found, using positional blocks");
        sections = positional_sections(text);
    }

    let mut doc = OutlineDocument::default();
    let mut storyline = String::new();

    for (section, lines) in sections {
        match section {
            Section::Storyline => {
                for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
                    if !storyline.is_empty() {
                        storyline.push('\n');
                    }
                    storyline.push_str(line);
                }
            }
            Section::Chapters => {
                for line in lines.iter().filter(|l| !l.trim().is_empty()) {
                    match doc.chapters.last_mut() {
                        Some(last) if is_continuation(line) => append(&mut last.summary, line.trim()),
                        _ => doc.chapters.push(ChapterOutline::new(clean_item(line), "")),
                    }
                }
            }
            Section::Characters => {
                for line in lines.iter().filter(|l| !l.trim().is_empty()) {
                    match doc.characters.last_mut() {
                        Some(last) if is_continuation(line) => {
                            append(&mut last.description, line.trim())
                        }
                        _ => {
                            let (name, description) = split_pair(clean_item(line));
                            doc.characters.push(CharacterSketch {
                                name: name.to_string(),
                                description: description.to_string(),
                            });
                        }
                    }
                }
            }
            Section::Worldbuilding => push_items(&mut doc.worldbuilding, &lines),
            Section::Themes => push_items(&mut doc.thematic_elements, &lines),
            Section::KeyPoints => push_items(&mut doc.key_points, &lines),
        }
    }

    if !storyline.is_empty() {
        doc.main_storyline
            .insert("summary".to_string(), Value::String(storyline));
    }
    doc.chapters.retain(|c| !c.title.is_empty());
    doc.characters.retain(|c| !c.name.is_empty());
    Some(doc)
}

fn push_items(items: &mut Vec<String>, lines: &[&str]) {
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        match items.last_mut() {
            Some(last) if is_continuation(line) => append(last, line.trim()),
            _ => {
                let item = clean_item(line);
                if !item.is_empty() {
                    items.push(item.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_variants() {
        assert_eq!(match_label("Main Storyline:"), Some((Section::Storyline, "")));
        assert_eq!(match_label("## Chapters"), Some((Section::Chapters, "")));
        assert_eq!(
            match_label("**Key points:** the pendant"),
            Some((Section::KeyPoints, "the pendant"))
        );
        assert_eq!(match_label("1. 故事主线：玉佩失踪"), Some((Section::Storyline, "玉佩失踪")));
        assert_eq!(match_label("2. 章节划分（至少5章）"), Some((Section::Chapters, "")));
        assert_eq!(match_label("人物设定："), Some((Section::Characters, "")));
    }

    #[test]
    fn test_prose_is_not_a_label() {
        assert_eq!(match_label("Chapters are short in this book."), None);
        assert_eq!(match_label("Settings menu"), None);
        assert_eq!(match_label("The storyline twists."), None);
    }

    #[test]
    fn test_list_markers_are_stripped() {
        assert_eq!(clean_item("- The Wake"), "The Wake");
        assert_eq!(clean_item("3) The Will"), "The Will");
        assert_eq!(clean_item("1、守灵夜"), "守灵夜");
        assert_eq!(clean_item("• **Aunt Mei**"), "Aunt Mei");
    }

    #[test]
    fn test_labeled_outline() {
        let text = "Here is the outline.\n\n\
                    Main storyline: A jade pendant vanishes during a wake.\n\n\
                    Chapters:\n\
                    1. The Wake\n\
                    \x20  Relatives gather.\n\
                    2. The Will\n\n\
                    3. The Pawnshop\n\n\
                    Characters:\n\
                    - Detective Lin: a tired investigator\n\
                    - Aunt Mei\n\n\
                    Key points:\n\
                    - The pendant was never in the coffin";
        let doc = outline_from_sections(text).unwrap();

        assert_eq!(
            doc.storyline_text(),
            Some("A jade pendant vanishes during a wake.")
        );
        let titles: Vec<_> = doc.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["The Wake", "The Will", "The Pawnshop"]);
        assert_eq!(doc.chapters[0].summary, "Relatives gather.");
        assert_eq!(doc.characters[0].name, "Detective Lin");
        assert_eq!(doc.characters[0].description, "a tired investigator");
        assert_eq!(doc.key_points, vec!["The pendant was never in the coffin"]);
    }

    #[test]
    fn test_positional_blocks_without_labels() {
        let text = "A pendant goes missing.\n\n\
                    Parts\nThe Wake\nThe Will\n\n\
                    Cast\nLin\n\n\
                    Beats\nThe coffin was empty";
        let doc = outline_from_sections(text).unwrap();

        assert_eq!(doc.storyline_text(), Some("A pendant goes missing."));
        assert_eq!(doc.chapters.len(), 2);
        assert_eq!(doc.characters[0].name, "Lin");
        assert_eq!(doc.key_points, vec!["The coffin was empty"]);
    }

    #[test]
    fn test_blank_text_is_none() {
        assert!(outline_from_sections(" \n ").is_none());
    }
}
