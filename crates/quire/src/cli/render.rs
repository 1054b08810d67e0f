//! Human-readable and JSON output.

use quire::{
    Chapter, OutlineRecord, PersistenceError, PersistenceErrorKind, Project, QuireResult,
};
use serde::Serialize;

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> QuireResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Serialization(e.to_string()))
    })?;
    println!("{}", json);
    Ok(())
}

pub fn print_project(project: &Project) {
    println!("Project {}: {}", project.id, project.name);
    println!("{:-<80}", "");
    let fields = [
        ("Author", &project.author),
        ("Theme", &project.theme),
        ("Style", &project.style),
        ("Topic", &project.topic),
        ("Model", &project.ai_model),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    println!("  Status: {}", project.status);
    println!("  Created: {}", project.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Modified: {}", project.last_modified.format("%Y-%m-%d %H:%M"));
    if let Some(settings) = &project.settings {
        println!("  Settings: {}", settings);
    }
}

pub fn print_outline(record: &OutlineRecord) {
    let doc = &record.document;
    println!(
        "Outline {} (created {})",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("{:-<80}", "");

    match doc.storyline_text() {
        Some(text) => println!("{}\n", text),
        None if !doc.main_storyline.is_empty() => {
            for (key, value) in &doc.main_storyline {
                println!("{}: {}", key, value);
            }
            println!();
        }
        None => {}
    }

    println!("Chapters:");
    for (i, chapter) in doc.chapters.iter().enumerate() {
        println!("  {}. {}", i + 1, chapter.title);
        if !chapter.summary.is_empty() {
            println!("     {}", chapter.summary);
        }
    }

    if !doc.characters.is_empty() {
        println!("\nCharacters:");
        for character in &doc.characters {
            if character.description.is_empty() {
                println!("  - {}", character.name);
            } else {
                println!("  - {}: {}", character.name, character.description);
            }
        }
    }

    let lists = [
        ("Worldbuilding", &doc.worldbuilding),
        ("Themes", &doc.thematic_elements),
        ("Key points", &doc.key_points),
    ];
    for (label, items) in lists {
        if !items.is_empty() {
            println!("\n{}:", label);
            for item in items {
                println!("  - {}", item);
            }
        }
    }
}

pub fn print_chapter(chapter: &Chapter) {
    println!(
        "Chapter {}{} [{}] (revision {}, {})",
        chapter.chapter_index,
        chapter
            .title
            .as_deref()
            .map(|t| format!(": {}", t))
            .unwrap_or_default(),
        chapter.status,
        chapter.id,
        chapter.last_modified.format("%Y-%m-%d %H:%M")
    );
    println!("{:-<80}", "");
    println!("{}", chapter.content);
}
