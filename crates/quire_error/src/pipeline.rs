//! Stage-tagged pipeline failures.

use crate::QuireError;

/// States of a generation pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineStage {
    /// Checking parameters and preconditions
    #[display("validating")]
    Validating,
    /// Building the prompt and opening the service call
    #[display("requesting")]
    Requesting,
    /// Draining streamed output into the aggregator
    #[display("streaming")]
    Streaming,
    /// Decoding the response into a structured document
    #[display("parsing")]
    Parsing,
    /// Writing the document to the store
    #[display("persisting")]
    Persisting,
    /// Finished successfully
    #[display("done")]
    Done,
    /// Stopped at the caller's request
    #[display("cancelled")]
    Cancelled,
    /// Stopped by an error
    #[display("failed")]
    Failed,
}

impl PipelineStage {
    /// Whether no further transition can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStage::Done | PipelineStage::Cancelled | PipelineStage::Failed
        )
    }
}

/// The single user-facing report for a failed pipeline run.
///
/// # Examples
///
/// ```
/// use quire_error::{PipelineError, PipelineStage, ValidationError};
///
/// let err = PipelineError::new(PipelineStage::Validating, ValidationError::new("empty theme"));
/// assert_eq!(err.stage, PipelineStage::Validating);
/// assert!(format!("{}", err).contains("validating"));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Pipeline failed while {}: {} at line {} in {}", stage, cause, line, file)]
pub struct PipelineError {
    /// The stage that was running when the failure occurred
    pub stage: PipelineStage,
    /// The underlying error
    #[error(source)]
    pub cause: QuireError,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Tag an error with the stage it occurred in.
    #[track_caller]
    pub fn new(stage: PipelineStage, cause: impl Into<QuireError>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            stage,
            cause: cause.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
