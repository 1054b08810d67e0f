//! Quire CLI binary.
//!
//! This binary provides command-line access to Quire's functionality:
//! - Create and manage novel projects
//! - Generate outlines and chapters, streaming text as it arrives
//! - Inspect stored outlines and chapter revisions

use clap::Parser;
use quire::{QuireConfig, SqliteArtifactRepository, init_tracing};
use std::sync::Arc;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, Session, handle_chapter_command, handle_outline_command,
        handle_project_command,
    };

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(if cli.verbose { "debug" } else { "warn" })?;

    let config = QuireConfig::load(cli.config.as_deref())?;
    let repository = Arc::new(SqliteArtifactRepository::open(&config.database.path)?);
    let session = Session {
        config,
        repository,
        streaming: cli.no_stream.then_some(false),
    };

    // Execute the requested command
    match cli.command {
        Commands::Project(cmd) => handle_project_command(cmd, session.repository.as_ref()).await?,
        Commands::Outline(cmd) => handle_outline_command(cmd, &session).await?,
        Commands::Chapter(cmd) => handle_chapter_command(cmd, &session).await?,
    }

    Ok(())
}
