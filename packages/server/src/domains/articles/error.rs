// Error taxonomy for the article domain
//
// Generation failures never escape the adapter boundary as raw transport
// errors; they arrive here already classified. ImmutableArticle and NotFound
// are surfaced to rewrite callers as explicit, user-displayable failures
// with stable codes.

use chrono::NaiveDate;
use thiserror::Error;

pub use groq_client::QuotaScope;

/// Classified outcome of one generation attempt.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("no API key configured for the generation backend")]
    NoApiKey,

    #[error("generation quota exhausted ({scope}): {detail}")]
    QuotaExceeded { scope: QuotaScope, detail: String },

    #[error("generation backend rejected credentials: {detail}")]
    AuthInvalid { detail: String },

    #[error("generation backend unavailable: {detail}")]
    BackendUnavailable { detail: String },

    #[error("generation backend returned no content")]
    EmptyResponse,

    #[error("network error reaching generation backend: {detail}")]
    Network { detail: String },
}

impl GenerateError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GenerateError::NoApiKey => "NO_API_KEY",
            GenerateError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            GenerateError::AuthInvalid { .. } => "AUTH_INVALID",
            GenerateError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            GenerateError::EmptyResponse => "EMPTY_RESPONSE",
            GenerateError::Network { .. } => "NETWORK_ERROR",
        }
    }
}

impl From<groq_client::GroqError> for GenerateError {
    fn from(err: groq_client::GroqError) -> Self {
        use groq_client::GroqError;
        match err {
            GroqError::NoApiKey => GenerateError::NoApiKey,
            GroqError::QuotaExceeded { scope, detail } => {
                GenerateError::QuotaExceeded { scope, detail }
            }
            GroqError::AuthInvalid { detail } => GenerateError::AuthInvalid { detail },
            GroqError::BackendUnavailable { detail } => {
                GenerateError::BackendUnavailable { detail }
            }
            GroqError::EmptyResponse => GenerateError::EmptyResponse,
            GroqError::Network { detail } => GenerateError::Network { detail },
        }
    }
}

/// Failures surfaced by the article service.
#[derive(Debug, Error)]
pub enum ArticleError {
    /// The article for this date was AI-generated and is immutable.
    #[error("article for {date} is AI-generated and cannot be rewritten")]
    ImmutableArticle { date: NaiveDate },

    /// No article exists for this date.
    #[error("no article exists for {date}")]
    NotFound { date: NaiveDate },

    #[error(transparent)]
    Generation(#[from] GenerateError),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

impl ArticleError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ArticleError::ImmutableArticle { .. } => "IMMUTABLE_ARTICLE",
            ArticleError::NotFound { .. } => "NOT_FOUND",
            ArticleError::Generation(e) => e.code(),
            ArticleError::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_error_mapping_is_total() {
        let cases: Vec<(groq_client::GroqError, &str)> = vec![
            (groq_client::GroqError::NoApiKey, "NO_API_KEY"),
            (
                groq_client::GroqError::QuotaExceeded {
                    scope: QuotaScope::Daily,
                    detail: "limit".into(),
                },
                "QUOTA_EXCEEDED",
            ),
            (
                groq_client::GroqError::AuthInvalid {
                    detail: "bad key".into(),
                },
                "AUTH_INVALID",
            ),
            (
                groq_client::GroqError::BackendUnavailable {
                    detail: "503".into(),
                },
                "BACKEND_UNAVAILABLE",
            ),
            (groq_client::GroqError::EmptyResponse, "EMPTY_RESPONSE"),
            (
                groq_client::GroqError::Network {
                    detail: "refused".into(),
                },
                "NETWORK_ERROR",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(GenerateError::from(err).code(), code);
        }
    }

    #[test]
    fn test_article_error_codes() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            ArticleError::ImmutableArticle { date }.code(),
            "IMMUTABLE_ARTICLE"
        );
        assert_eq!(ArticleError::NotFound { date }.code(), "NOT_FOUND");
        assert_eq!(
            ArticleError::Generation(GenerateError::EmptyResponse).code(),
            "EMPTY_RESPONSE"
        );
    }
}
