use quire_error::{
    ParseError, PersistenceError, PersistenceErrorKind, PipelineError, PipelineStage, QuireError,
    QuireErrorKind, RetryableError, ServiceError, ServiceErrorKind, ValidationError,
};

#[test]
fn test_status_classification() {
    let cases = [
        (429, "rate"),
        (401, "auth"),
        (403, "auth"),
        (400, "malformed"),
        (404, "malformed"),
        (422, "malformed"),
        (408, "transient"),
        (500, "transient"),
        (503, "transient"),
        (418, "unknown"),
        (302, "unknown"),
    ];

    for (status, expected) in cases {
        let kind = ServiceErrorKind::from_status(status, "x");
        let actual = match kind {
            ServiceErrorKind::RateLimited(_) => "rate",
            ServiceErrorKind::Authentication(_) => "auth",
            ServiceErrorKind::MalformedRequest(_) => "malformed",
            ServiceErrorKind::TransientNetwork(_) => "transient",
            ServiceErrorKind::Unknown(_) => "unknown",
        };
        assert_eq!(actual, expected, "status {}", status);
    }
}

#[test]
fn test_only_throttling_and_network_errors_are_retryable() {
    assert!(ServiceError::with_status(429, "slow down").is_retryable());
    assert!(ServiceError::with_status(502, "bad gateway").is_retryable());
    assert!(!ServiceError::with_status(401, "no key").is_retryable());
    assert!(!ServiceError::with_status(400, "bad body").is_retryable());
    assert!(!ServiceError::new(ServiceErrorKind::Unknown("?".into())).is_retryable());
}

#[test]
fn test_location_is_captured() {
    let err = ValidationError::new("empty");
    assert!(err.file.ends_with("error_test.rs"));
    assert!(err.line > 0);
}

#[test]
fn test_parse_error_keeps_raw_text() {
    let err: QuireError = ParseError::new("no strategy matched", "garbled output").into();
    match err.kind() {
        QuireErrorKind::Parse(parse) => assert_eq!(parse.raw_text, "garbled output"),
        other => panic!("unexpected kind: {}", other),
    }
}

#[test]
fn test_pipeline_error_reports_stage_and_cause() {
    let err = PipelineError::new(
        PipelineStage::Persisting,
        PersistenceError::new(PersistenceErrorKind::Query("disk full".into())),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("persisting"));
    assert!(rendered.contains("disk full"));
    assert!(matches!(err.cause.kind(), QuireErrorKind::Persistence(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_terminal_stages() {
    assert!(PipelineStage::Done.is_terminal());
    assert!(PipelineStage::Cancelled.is_terminal());
    assert!(PipelineStage::Failed.is_terminal());
    assert!(!PipelineStage::Streaming.is_terminal());
}
