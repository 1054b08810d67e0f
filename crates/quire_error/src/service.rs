//! Generation service error types and retry classification.

/// Generation service failure categories.
///
/// The category decides whether a caller may retry; nothing in the
/// generation client retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ServiceErrorKind {
    /// The service throttled the request
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Credentials were missing or rejected
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
    /// The service rejected the request shape
    #[display("Malformed request: {}", _0)]
    MalformedRequest(String),
    /// Connection, timeout or server-side failure
    #[display("Transient network error: {}", _0)]
    TransientNetwork(String),
    /// Anything that fits no other category
    #[display("Unknown service error: {}", _0)]
    Unknown(String),
}

impl ServiceErrorKind {
    /// Classify an HTTP status code returned by the service.
    ///
    /// # Examples
    ///
    /// ```
    /// use quire_error::ServiceErrorKind;
    ///
    /// let kind = ServiceErrorKind::from_status(429, "slow down");
    /// assert!(matches!(kind, ServiceErrorKind::RateLimited(_)));
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited(message),
            401 | 403 => Self::Authentication(message),
            400 | 404 | 413 | 422 => Self::MalformedRequest(message),
            408 | 500..=599 => Self::TransientNetwork(message),
            _ => Self::Unknown(message),
        }
    }

    /// Check if this error category may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceErrorKind::RateLimited(_) | ServiceErrorKind::TransientNetwork(_)
        )
    }

    /// Get retry strategy parameters for this error category.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            ServiceErrorKind::RateLimited(_) => (5000, 3, 40),
            ServiceErrorKind::TransientNetwork(_) => (1000, 3, 8),
            _ => (2000, 5, 60),
        }
    }
}

/// Generation service error with source location tracking.
///
/// # Examples
///
/// ```
/// use quire_error::{RetryableError, ServiceError, ServiceErrorKind};
///
/// let err = ServiceError::with_status(503, "overloaded");
/// assert!(err.is_retryable());
/// assert_eq!(err.status, Some(503));
///
/// let err = ServiceError::new(ServiceErrorKind::Authentication("bad key".into()));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Service Error: {} at line {} in {}", kind, line, file)]
pub struct ServiceError {
    /// The kind of error that occurred
    pub kind: ServiceErrorKind,
    /// HTTP status, when the service answered at all
    pub status: Option<u16>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ServiceError {
    /// Create a new ServiceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServiceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            status: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a ServiceError classified from an HTTP status.
    #[track_caller]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind: ServiceErrorKind::from_status(status, message),
            status: Some(status),
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Implementors report whether a failed call may be retried and with what
/// backoff. Callers own the retry loop.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Get retry strategy parameters for this error.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (2000, 5, 60)
    }
}

impl RetryableError for ServiceError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
