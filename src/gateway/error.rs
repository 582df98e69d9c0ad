use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    InvalidRequest,
    Authentication,
    RateLimited,
    Timeout,
    BackendTransient,
    BackendPermanent,
    ProtocolViolation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    pub retryable: bool,
    pub http_status: Option<u16>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                GatewayErrorKind::RateLimited
                    | GatewayErrorKind::Timeout
                    | GatewayErrorKind::BackendTransient
            ),
            http_status: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (http_status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Maps a non-success HTTP status from the completion endpoint onto the
/// error taxonomy. Auth failures and other 4xx are permanent; 408/429 are
/// retryable; 5xx are transient.
pub fn map_http_error(status: u16, body: &str) -> GatewayError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 401 || status == 403 {
        GatewayError::new(GatewayErrorKind::Authentication, "authentication failed")
            .with_retryable(false)
    } else if status == 408 || status == 429 {
        GatewayError::new(
            GatewayErrorKind::RateLimited,
            format!("backend returned status {}", status),
        )
        .with_retryable(true)
    } else if (400..500).contains(&status) {
        GatewayError::new(
            GatewayErrorKind::InvalidRequest,
            format!("backend returned status {}", status),
        )
        .with_retryable(false)
    } else {
        GatewayError::new(
            GatewayErrorKind::BackendTransient,
            format!("backend returned status {}", status),
        )
        .with_retryable(true)
    };

    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err.with_http_status(status)
}

#[cfg(test)]
mod tests {
    use super::{GatewayErrorKind, map_http_error};

    #[test]
    fn status_classes_map_to_expected_kinds() {
        assert_eq!(map_http_error(401, "").kind, GatewayErrorKind::Authentication);
        assert_eq!(map_http_error(429, "").kind, GatewayErrorKind::RateLimited);
        assert_eq!(map_http_error(404, "").kind, GatewayErrorKind::InvalidRequest);
        assert_eq!(map_http_error(503, "").kind, GatewayErrorKind::BackendTransient);
    }

    #[test]
    fn transient_errors_are_retryable_permanent_are_not() {
        assert!(map_http_error(500, "").retryable);
        assert!(map_http_error(429, "").retryable);
        assert!(!map_http_error(400, "").retryable);
        assert!(!map_http_error(403, "").retryable);
    }

    #[test]
    fn body_snippet_is_truncated_into_message() {
        let body = "x".repeat(1000);
        let err = map_http_error(500, &body);
        assert!(err.message.len() < 300);
        assert_eq!(err.http_status, Some(500));
    }
}
