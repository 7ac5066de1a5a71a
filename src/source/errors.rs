//! Parameter Source Error Types
//!
//! Failures a parameter source can report for a fetch.
//! Variants drive retry decisions and the error code surfaced to callers.

/// Parameter source error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Parameter store unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Throttled by parameter store")]
    Throttled,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Parameter store error: {0}")]
    Remote(String),
}

impl FetchError {
    /// Whether this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Unavailable(_) | FetchError::Timeout | FetchError::Throttled
        )
    }

    /// Map a service error code to a FetchError
    ///
    /// Codes follow the AWS JSON protocol naming (`ThrottlingException`,
    /// `AccessDeniedException`, ...).
    pub fn from_code(code: Option<&str>, message: &str) -> Self {
        match code {
            Some("ThrottlingException") | Some("TooManyUpdates") => FetchError::Throttled,
            Some("AccessDeniedException")
            | Some("UnrecognizedClientException")
            | Some("InvalidSignatureException")
            | Some("ExpiredTokenException")
            | Some("InvalidKeyId") => FetchError::Forbidden(message.to_string()),
            Some("ServiceUnavailable") | Some("ServiceUnavailableException") => {
                FetchError::Unavailable(message.to_string())
            }
            Some("RequestTimeout") | Some("RequestTimeoutException") => FetchError::Timeout,
            Some(code) => FetchError::Remote(format!("{}: {}", code, message)),
            None => FetchError::Remote(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_classification() {
        assert_eq!(
            FetchError::from_code(Some("ThrottlingException"), "Rate exceeded"),
            FetchError::Throttled
        );
        assert_eq!(
            FetchError::from_code(Some("AccessDeniedException"), "no ssm:GetParametersByPath"),
            FetchError::Forbidden("no ssm:GetParametersByPath".to_string())
        );
        assert_eq!(
            FetchError::from_code(Some("InternalServerError"), "boom"),
            FetchError::Remote("InternalServerError: boom".to_string())
        );
        assert_eq!(
            FetchError::from_code(None, "connection reset"),
            FetchError::Remote("connection reset".to_string())
        );
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::Throttled.is_retryable());
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Unavailable("dns".to_string()).is_retryable());
        assert!(!FetchError::Forbidden("denied".to_string()).is_retryable());
        assert!(!FetchError::Remote("bad filter".to_string()).is_retryable());
    }
}
