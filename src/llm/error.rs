//! Model client error types.
//!
//! Errors carry a classification so callers can decide whether a retry makes
//! sense. The client itself never retries; an auth failure ends the session
//! while rate limits and transport failures are surfaced to the caller.

use std::time::Duration;

/// Error from a model API call.
#[derive(Debug, Clone)]
pub struct LlmError {
    /// The kind of error
    pub kind: LlmErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
    /// Suggested retry delay (from Retry-After header), if any
    pub retry_after: Option<Duration>,
}

impl LlmError {
    /// Create an authentication failure (invalid or rejected credential).
    pub fn auth_failure(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::AuthFailure,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    /// Create a rate limit error.
    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            status_code: Some(429),
            message,
            retry_after,
        }
    }

    /// Create a transport error from an HTTP status.
    pub fn transport_status(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::TransportError,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    /// Create a transport error with no HTTP status (connect failure, timeout).
    pub fn transport(message: String) -> Self {
        Self {
            kind: LlmErrorKind::TransportError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Create a response parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Check if this error is transient and a caller-level retry could succeed.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Classification of model errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Invalid credential (401, 403) - permanent, ends the session
    AuthFailure,
    /// Rate limited (429) - transient, caller may retry after backoff
    RateLimited,
    /// Transport failure (5xx, connection failure, timeout) - transient
    TransportError,
    /// Response body could not be parsed - usually permanent
    ParseError,
}

impl LlmErrorKind {
    /// Check if this error kind is transient (a caller-level retry could succeed).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmErrorKind::RateLimited | LlmErrorKind::TransportError
        )
    }
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::AuthFailure => write!(f, "Authentication failure"),
            LlmErrorKind::RateLimited => write!(f, "Rate limited"),
            LlmErrorKind::TransportError => write!(f, "Transport error"),
            LlmErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Classify an HTTP status code into an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        401 | 403 => LlmErrorKind::AuthFailure,
        429 => LlmErrorKind::RateLimited,
        _ => LlmErrorKind::TransportError,
    }
}
