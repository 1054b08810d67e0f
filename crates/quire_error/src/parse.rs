//! Structured document decode errors.

/// Every decode strategy was exhausted.
///
/// Carries the raw response text so the caller can inspect or store it.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} at line {} in {}", reason, line, file)]
pub struct ParseError {
    /// Why the final strategy gave up
    pub reason: String,
    /// The complete text that failed to decode
    pub raw_text: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use quire_error::ParseError;
    ///
    /// let err = ParseError::new("response was empty", "   ");
    /// assert_eq!(err.raw_text, "   ");
    /// ```
    #[track_caller]
    pub fn new(reason: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            reason: reason.into(),
            raw_text: raw_text.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
