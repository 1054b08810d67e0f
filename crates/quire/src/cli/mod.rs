//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the quire binary.

mod commands;
mod generate;
mod project;
mod render;

pub use commands::{Cli, Commands};
pub use generate::{Session, handle_chapter_command, handle_outline_command};
pub use project::handle_project_command;
