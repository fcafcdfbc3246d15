//! Delivery fault taxonomy.

use thiserror::Error;

/// Classified delivery failures.
///
/// The drain engine's retry decision hinges entirely on this classification:
/// `Transient` is retried with backoff, everything else is terminal and the
/// batch is dropped.
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    /// The service rejected the payload as malformed. Retrying the same
    /// bytes cannot succeed.
    #[error("validation rejected: {message}")]
    Validation { code: String, message: String },

    /// The target walk session does not exist.
    #[error("walk not found: {message}")]
    NotFound { code: String, message: String },

    /// The target walk session was already finalized.
    #[error("walk already finished: {message}")]
    Conflict { code: String, message: String },

    /// Network failure or server-side fault; eligible for retry.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The HTTP client itself could not be constructed or used.
    #[error("http client error: {0}")]
    Client(String),
}

impl IngestError {
    /// Terminal failures must not be retried.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IngestError::Transient(_))
    }
}

/// Map an HTTP status and optional machine-readable error body into the
/// fault taxonomy.
///
/// The body's `code` field wins when recognized; otherwise the status class
/// decides. Timeouts, 408, 429, and all 5xx are transient.
pub fn classify_response(status: u16, code: Option<String>, message: Option<String>) -> IngestError {
    let code = code.unwrap_or_default();
    let message = message.unwrap_or_else(|| format!("HTTP {status}"));

    match code.as_str() {
        "VALIDATION_ERROR" => return IngestError::Validation { code, message },
        "NOT_FOUND" => return IngestError::NotFound { code, message },
        "CONFLICT" => return IngestError::Conflict { code, message },
        _ => {}
    }

    match status {
        404 => IngestError::NotFound { code, message },
        409 => IngestError::Conflict { code, message },
        408 | 429 => IngestError::Transient(message),
        400..=499 => IngestError::Validation { code, message },
        _ => IngestError::Transient(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_wins_over_status() {
        // Some proxies rewrite statuses; the body code is authoritative.
        let err = classify_response(500, Some("CONFLICT".into()), Some("walk finished".into()));
        assert!(matches!(err, IngestError::Conflict { .. }));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_status_classes() {
        assert!(matches!(
            classify_response(404, None, None),
            IngestError::NotFound { .. }
        ));
        assert!(matches!(
            classify_response(409, None, None),
            IngestError::Conflict { .. }
        ));
        assert!(matches!(
            classify_response(400, None, None),
            IngestError::Validation { .. }
        ));
        assert!(matches!(
            classify_response(422, None, None),
            IngestError::Validation { .. }
        ));
    }

    #[test]
    fn test_transient_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            let err = classify_response(status, None, None);
            assert!(!err.is_terminal(), "status {status} should be transient");
        }
    }

    #[test]
    fn test_default_message_includes_status() {
        match classify_response(503, None, None) {
            IngestError::Transient(msg) => assert_eq!(msg, "HTTP 503"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
