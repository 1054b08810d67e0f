//! SQLite persistence for Quire.
//!
//! This crate provides the schema, versioned migrations, row models and the
//! [`SqliteArtifactRepository`] implementation of
//! [`ArtifactRepository`](quire_interface::ArtifactRepository).
//!
//! # Example
//!
//! ```rust,ignore
//! use quire_database::SqliteArtifactRepository;
//! use quire_interface::{ArtifactRepository, NewProject};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = SqliteArtifactRepository::open("novel_writer.db")?;
//! let project = repo
//!     .create_project(&NewProject::builder().name("The Heirloom").build()?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod conversions;
mod migrations;
mod models;
mod repository;

// Public modules for external access
pub mod schema;

pub use connection::establish_connection;
pub use migrations::{SCHEMA_VERSION, current_version, run_migrations};
pub use models::{
    ChapterRow, CharacterRow, NewChapterRow, NewCharacterRow, NewOutlineRow, NewProjectRow,
    NewReviewRow, OutlineRow, ProjectChangeset, ProjectRow, ReviewRow,
};
pub use repository::SqliteArtifactRepository;

use quire_error::PersistenceError;

/// Result type for database operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
