//! Error types for the Groq client.

use std::fmt;

use thiserror::Error;

/// Result type for Groq client operations.
pub type Result<T> = std::result::Result<T, GroqError>;

/// Which quota window the backend reported as exhausted, when it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// Daily request/token budget exhausted.
    Daily,
    /// Requests-per-minute window exhausted.
    PerMinute,
    /// Rate limited without a recognizable window in the payload.
    Unknown,
}

impl fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaScope::Daily => write!(f, "daily"),
            QuotaScope::PerMinute => write!(f, "per-minute"),
            QuotaScope::Unknown => write!(f, "unknown window"),
        }
    }
}

/// Classified Groq API failures.
///
/// This is a closed taxonomy: every failure of a chat-completion round trip
/// maps to exactly one variant, so callers can branch without string matching.
#[derive(Debug, Clone, Error)]
pub enum GroqError {
    /// No API key configured; the client cannot make real requests.
    #[error("Groq API key is not configured")]
    NoApiKey,

    /// Rate limit / quota exhausted (HTTP 429 or a quota-signaling payload).
    #[error("Groq rate limit exceeded ({scope}): {detail}")]
    QuotaExceeded { scope: QuotaScope, detail: String },

    /// The API key was rejected (HTTP 401/403).
    #[error("Groq rejected the API key: {detail}")]
    AuthInvalid { detail: String },

    /// Backend-side failure (HTTP 5xx or an unclassified error payload).
    #[error("Groq service unavailable: {detail}")]
    BackendUnavailable { detail: String },

    /// A 2xx response with no usable content (no choices, empty message,
    /// or a body that does not parse as a completion).
    #[error("Groq returned an empty response")]
    EmptyResponse,

    /// Transport-level failure (connect, TLS, timeout).
    #[error("network error talking to Groq: {detail}")]
    Network { detail: String },
}

impl GroqError {
    /// Stable machine-readable code for logs and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            GroqError::NoApiKey => "NO_API_KEY",
            GroqError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            GroqError::AuthInvalid { .. } => "AUTH_INVALID",
            GroqError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            GroqError::EmptyResponse => "EMPTY_RESPONSE",
            GroqError::Network { .. } => "NETWORK_ERROR",
        }
    }

    /// True when the failure signals the backend will refuse more work for
    /// a while (used by callers to back off rather than retry immediately).
    pub fn is_unavailability(&self) -> bool {
        matches!(
            self,
            GroqError::QuotaExceeded { .. } | GroqError::BackendUnavailable { .. }
        )
    }
}
