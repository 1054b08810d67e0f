//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use quire::ChapterStatus;
use std::path::PathBuf;

/// Quire - AI-assisted novel writing
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(about = "Generate story outlines and chapters with an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (replaces ./quire.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Wait for the full response instead of streaming it
    #[arg(long, global = true)]
    pub no_stream: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management commands
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Outline generation and inspection
    #[command(subcommand)]
    Outline(OutlineCommands),

    /// Chapter generation and inspection
    #[command(subcommand)]
    Chapter(ChapterCommands),
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    Create {
        /// Project name
        #[arg(long)]
        name: String,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Genre or theme
        #[arg(long)]
        theme: Option<String>,

        /// Writing style
        #[arg(long)]
        style: Option<String>,

        /// Subject of the story
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show one project
    Show {
        /// Project ID
        id: i64,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List projects, most recently modified first
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Update project fields
    Update {
        /// Project ID
        id: i64,

        /// Field assignment as field=value (repeatable)
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Delete a project and everything it owns
    Delete {
        /// Project ID
        id: i64,
    },
}

/// Outline subcommands
#[derive(Subcommand, Debug)]
pub enum OutlineCommands {
    /// Generate a new outline for a project
    Generate {
        /// Project ID
        project_id: i64,

        /// Genre or theme (defaults to the project's)
        #[arg(long)]
        theme: Option<String>,

        /// Writing style (defaults to the project's)
        #[arg(long)]
        style: Option<String>,

        /// Subject of the story (defaults to the project's)
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show the latest outline of a project
    Show {
        /// Project ID
        project_id: i64,

        /// Show every stored outline, newest first
        #[arg(long)]
        history: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Store a hand-edited outline as a new outline
    Save {
        /// Project ID
        project_id: i64,

        /// File holding the outline as JSON or labelled prose
        #[arg(long)]
        file: PathBuf,
    },
}

/// Chapter subcommands
#[derive(Subcommand, Debug)]
pub enum ChapterCommands {
    /// Generate a chapter against the latest outline
    Generate {
        /// Project ID
        project_id: i64,

        /// 1-based chapter index
        index: i32,

        /// Writing style (defaults to the project's)
        #[arg(long)]
        style: Option<String>,

        /// Target length in characters
        #[arg(long)]
        length: Option<u32>,
    },

    /// Show the latest revision of a chapter
    Show {
        /// Project ID
        project_id: i64,

        /// 1-based chapter index
        index: i32,

        /// Show every revision, newest first
        #[arg(long)]
        history: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Store a hand-edited chapter as a new revision
    Save {
        /// Project ID
        project_id: i64,

        /// 1-based chapter index
        index: i32,

        /// File holding the chapter prose
        #[arg(long)]
        file: PathBuf,

        /// New title (keeps the current one when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Revision status: completed or pending_review
        #[arg(long, default_value = "completed")]
        status: ChapterStatus,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

/// Parse a `field=value` assignment.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}
