//! Error types for the Quire library.
//!
//! This crate provides the error taxonomy shared by every stage of the
//! generation pipeline.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Cancellation is deliberately absent: a cancelled generation is an outcome,
//! not an error, and is modelled by the pipeline's outcome types.
//!
//! # Examples
//!
//! ```
//! use quire_error::{QuireResult, ValidationError};
//!
//! fn check_theme(theme: &str) -> QuireResult<()> {
//!     if theme.trim().is_empty() {
//!         Err(ValidationError::new("theme must not be empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_theme("").is_err());
//! assert!(check_theme("mystery").is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod parse;
mod persistence;
mod pipeline;
mod service;
mod sink;
mod validation;
mod error;

pub use config::ConfigError;
pub use parse::ParseError;
pub use persistence::{PersistenceError, PersistenceErrorKind};
pub use pipeline::{PipelineError, PipelineStage};
pub use service::{RetryableError, ServiceError, ServiceErrorKind};
pub use sink::SinkError;
pub use validation::ValidationError;
pub use error::{QuireError, QuireErrorKind, QuireResult};
