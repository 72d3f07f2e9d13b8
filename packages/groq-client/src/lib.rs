//! Pure Groq REST API client
//!
//! A minimal client for the Groq chat-completion API with no domain-specific
//! logic. Failures are classified into a closed taxonomy ([`GroqError`]) so
//! callers never have to pattern-match on transport error strings.
//!
//! # Example
//!
//! ```rust,ignore
//! use groq_client::{ChatRequest, GroqClient, Message, LLAMA_70B};
//!
//! let client = GroqClient::from_env();
//!
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new(LLAMA_70B)
//!             .message(Message::system("You are a helpful assistant."))
//!             .message(Message::user("Hello!"))
//!             .max_tokens(512),
//!     )
//!     .await?;
//! ```
//!
//! # Availability probe
//!
//! [`GroqClient::check_available`] hits the models endpoint, which consumes
//! no tokens, and reports whether the backend would currently accept real
//! work. Any non-success outcome reports unavailable.

pub mod error;
pub mod types;

pub use error::{GroqError, QuotaScope, Result};
pub use types::{ChatRequest, ChatResponse, Message};

use tracing::{debug, warn};

use crate::types::{ChatResponseRaw, ErrorBody};

/// Default Groq model for long-form generation.
pub const LLAMA_70B: &str = "llama-3.3-70b-versatile";

/// Pure Groq API client.
///
/// The API key is optional: a keyless client classifies every call as
/// [`GroqError::NoApiKey`] and always probes as unavailable, so callers can
/// construct it unconditionally and let the error taxonomy drive fallback.
#[derive(Clone)]
pub struct GroqClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GroqClient {
    /// Create a new Groq client with the given API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: "https://api.groq.com/openai/v1".to_string(),
        }
    }

    /// Create from the `GROQ_API_KEY` environment variable (if set).
    pub fn from_env() -> Self {
        Self::new(std::env::var("GROQ_API_KEY").ok())
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Chat completion.
    ///
    /// One round trip to `/chat/completions`. Every failure mode maps to a
    /// [`GroqError`] variant; this method never panics.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let api_key = self.api_key.as_deref().ok_or(GroqError::NoApiKey)?;
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Groq request failed");
                GroqError::Network {
                    detail: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Groq API error");
            return Err(classify_error(status.as_u16(), &body));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|_| GroqError::EmptyResponse)?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GroqError::EmptyResponse);
        }

        debug!(
            model = %request.model,
            response_length = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Groq chat completion"
        );

        Ok(ChatResponse { content })
    }

    /// Probe whether the API would currently accept real work.
    ///
    /// Uses the models endpoint, which is cheap and consumes no tokens.
    /// Fail-closed: a missing key, rate limit, backend error, or transport
    /// failure all report `false`. A `true` result is advisory only: a
    /// following real call can still fail and must be handled on its own.
    pub async fn check_available(&self) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Groq availability check: no API key configured");
            return false;
        };

        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                debug!("Groq availability check: available");
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(
                    status = %status,
                    code = classify_error(status.as_u16(), &body).code(),
                    "Groq availability check: unavailable"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Groq availability check failed");
                false
            }
        }
    }
}

/// Map a non-success HTTP response to a [`GroqError`].
///
/// 429 and quota-signaling payloads become `QuotaExceeded`, 401/403 become
/// `AuthInvalid`, 5xx become `BackendUnavailable`; anything else falls back
/// to `BackendUnavailable` with the raw body as detail.
fn classify_error(status: u16, body: &str) -> GroqError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let detail = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    let quota_signaled = parsed
        .as_ref()
        .map(|b| b.error.code == "rate_limit_exceeded" || b.error.kind == "tokens")
        .unwrap_or(false);

    if status == 429 || quota_signaled {
        return GroqError::QuotaExceeded {
            scope: quota_scope(&detail),
            detail,
        };
    }

    match status {
        401 | 403 => GroqError::AuthInvalid { detail },
        500..=599 => GroqError::BackendUnavailable { detail },
        _ => GroqError::BackendUnavailable { detail },
    }
}

/// Extract the quota window from a rate-limit message, when the backend
/// names one ("... per day ...", "... per minute ...").
fn quota_scope(detail: &str) -> QuotaScope {
    let lower = detail.to_lowercase();
    if lower.contains("per day") || lower.contains("daily") {
        QuotaScope::Daily
    } else if lower.contains("per minute") || lower.contains("rpm") {
        QuotaScope::PerMinute
    } else {
        QuotaScope::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client =
            GroqClient::new(Some("gsk-test".into())).with_base_url("https://custom.api.com");

        assert!(client.has_api_key());
        assert_eq!(client.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_empty_key_counts_as_missing() {
        let client = GroqClient::new(Some(String::new()));
        assert!(!client.has_api_key());
    }

    #[test]
    fn test_classify_429_with_daily_window() {
        let body = r#"{"error":{"message":"Rate limit reached: 14400 requests per day","type":"requests","code":"rate_limit_exceeded"}}"#;
        match classify_error(429, body) {
            GroqError::QuotaExceeded { scope, .. } => assert_eq!(scope, QuotaScope::Daily),
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_quota_signaled_without_429() {
        let body = r#"{"error":{"message":"tokens exhausted","type":"tokens","code":""}}"#;
        assert!(matches!(
            classify_error(400, body),
            GroqError::QuotaExceeded { .. }
        ));
    }

    #[test]
    fn test_classify_auth() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert!(matches!(
            classify_error(401, body),
            GroqError::AuthInvalid { .. }
        ));
    }

    #[test]
    fn test_classify_5xx() {
        assert!(matches!(
            classify_error(503, "Service Unavailable"),
            GroqError::BackendUnavailable { .. }
        ));
    }

    #[test]
    fn test_classify_non_json_body_keeps_raw_detail() {
        match classify_error(500, "<html>oops</html>") {
            GroqError::BackendUnavailable { detail } => assert!(detail.contains("oops")),
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_per_minute_scope() {
        assert_eq!(
            quota_scope("Rate limit reached: 30 requests per minute"),
            QuotaScope::PerMinute
        );
        assert_eq!(quota_scope("slow down"), QuotaScope::Unknown);
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_chat_completion() {
        let client = GroqClient::from_env();

        let response = client
            .chat_completion(
                ChatRequest::new(LLAMA_70B)
                    .message(Message::user("Say 'Hello, World!' and nothing else."))
                    .max_tokens(32),
            )
            .await
            .expect("chat completion should succeed");

        assert!(response.content.contains("Hello"));
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_check_available() {
        let client = GroqClient::from_env();
        assert!(client.check_available().await);
    }
}
