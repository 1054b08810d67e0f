//! Top-level error wrapper types.

use crate::{
    ConfigError, ParseError, PersistenceError, PipelineError, ServiceError, SinkError,
    ValidationError,
};

/// Every error condition the workspace can raise.
///
/// # Examples
///
/// ```
/// use quire_error::{QuireError, QuireErrorKind, SinkError};
///
/// let err: QuireError = SinkError::new("receiver dropped").into();
/// assert!(matches!(err.kind(), QuireErrorKind::Sink(_)));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum QuireErrorKind {
    /// Bad or missing input parameters
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Generation service call failed
    #[from(ServiceError)]
    Service(ServiceError),
    /// Progress sink failed
    #[from(SinkError)]
    Sink(SinkError),
    /// All decode strategies failed
    #[from(ParseError)]
    Parse(ParseError),
    /// Store operation failed
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Stage-tagged pipeline failure
    #[from(PipelineError)]
    Pipeline(PipelineError),
}

/// Quire error with kind discrimination.
///
/// # Examples
///
/// ```
/// use quire_error::{ConfigError, QuireResult};
///
/// fn might_fail() -> QuireResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Quire Error: {}", _0)]
pub struct QuireError(Box<QuireErrorKind>);

impl QuireError {
    /// Create a new error from a kind.
    pub fn new(kind: QuireErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QuireErrorKind {
        &self.0
    }

    /// Consume the error and return its kind.
    pub fn into_kind(self) -> QuireErrorKind {
        *self.0
    }
}

// Generic From implementation for any type that converts to QuireErrorKind
impl<T> From<T> for QuireError
where
    T: Into<QuireErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Quire operations.
pub type QuireResult<T> = std::result::Result<T, QuireError>;
