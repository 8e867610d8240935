//! Error taxonomy and retry policy for upstream model calls.

use std::time::Duration;

/// Broad failure classes for an upstream call. The class decides whether
/// a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// 429 from the provider.
    RateLimited,
    /// 5xx from the provider.
    ServerError,
    /// Non-retryable 4xx (bad request, auth, unknown model).
    ClientError,
    /// Connection/transport failure before a status was received.
    NetworkError,
    /// Response arrived but could not be decoded.
    ParseError,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ServerError => write!(f, "server_error"),
            Self::ClientError => write!(f, "client_error"),
            Self::NetworkError => write!(f, "network_error"),
            Self::ParseError => write!(f, "parse_error"),
        }
    }
}

/// A failed upstream call, carrying enough context to pick a retry delay.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// HTTP status, when one was received.
    pub status: Option<u16>,
    /// Provider-suggested wait from a Retry-After header.
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            message,
            status: Some(429),
            retry_after,
        }
    }

    pub fn server_error(status: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ServerError,
            message,
            status: Some(status),
            retry_after: None,
        }
    }

    pub fn client_error(status: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ClientError,
            message,
            status: Some(status),
            retry_after: None,
        }
    }

    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            message,
            status: None,
            retry_after: None,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            message,
            status: None,
            retry_after: None,
        }
    }

    /// Delay before retry attempt `attempt` (0-based): the provider's
    /// Retry-After when given, otherwise exponential backoff with jitter.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }
        let base_ms = 500u64.saturating_mul(1 << attempt.min(6));
        let jitter_ms = rand::random::<u64>() % 250;
        Duration::from_millis(base_ms + jitter_ms).min(Duration::from_secs(30))
    }
}

/// Map an HTTP status to an error class.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

/// Retry policy for transient upstream failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Wall-clock budget across all attempts.
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_retry_duration: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Whether this class of error is worth retrying at all.
    pub fn should_retry(&self, error: &LlmError) -> bool {
        matches!(
            error.kind,
            LlmErrorKind::RateLimited | LlmErrorKind::ServerError | LlmErrorKind::NetworkError
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(400), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(401), LlmErrorKind::ClientError);
    }

    #[test]
    fn test_retry_policy_by_kind() {
        let config = RetryConfig::default();
        assert!(config.should_retry(&LlmError::rate_limited("slow down".into(), None)));
        assert!(config.should_retry(&LlmError::server_error(502, "bad gateway".into())));
        assert!(config.should_retry(&LlmError::network_error("reset".into())));
        assert!(!config.should_retry(&LlmError::client_error(401, "bad key".into())));
        assert!(!config.should_retry(&LlmError::parse_error("truncated".into())));
    }

    #[test]
    fn test_retry_after_wins_over_backoff() {
        let error = LlmError::rate_limited("slow down".into(), Some(Duration::from_secs(7)));
        assert_eq!(error.suggested_delay(0), Duration::from_secs(7));
    }

    #[test]
    fn test_backoff_grows_with_attempts() {
        let error = LlmError::server_error(500, "boom".into());
        // Jitter is < 250ms, so attempt windows never overlap.
        let first = error.suggested_delay(0);
        let third = error.suggested_delay(2);
        assert!(first < Duration::from_millis(750));
        assert!(third >= Duration::from_millis(2000));
        assert!(third < Duration::from_millis(2250));
    }
}
