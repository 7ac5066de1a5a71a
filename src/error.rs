//! Resolver error taxonomy

use std::ffi::OsString;

use crate::source::FetchError;

/// Errors returned by path normalization, resolution and lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("No parameter path given and no default path configured")]
    PathUndefined,

    #[error("Parameter path is not valid unicode: {0:?}")]
    InvalidPath(OsString),

    #[error("Parameter name is not valid unicode: {0:?}")]
    InvalidName(OsString),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{name} secret not found")]
    EntryNotFound { name: String },
}

impl ResolveError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::PathUndefined => "PATH_UNDEFINED",
            ResolveError::InvalidPath(_) => "INVALID_PATH",
            ResolveError::InvalidName(_) => "INVALID_NAME",
            ResolveError::Fetch(e) if e.is_retryable() => "REMOTE_UNAVAILABLE",
            ResolveError::Fetch(_) => "REMOTE_ERROR",
            ResolveError::EntryNotFound { .. } => "SECRET_NOT_FOUND",
        }
    }

    /// Whether this is a lookup miss on an otherwise successful resolution
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::EntryNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ResolveError::PathUndefined.code(), "PATH_UNDEFINED");
        assert_eq!(
            ResolveError::EntryNotFound { name: "X".to_string() }.code(),
            "SECRET_NOT_FOUND"
        );
        assert_eq!(
            ResolveError::from(FetchError::Throttled).code(),
            "REMOTE_UNAVAILABLE"
        );
        assert_eq!(
            ResolveError::from(FetchError::Forbidden("denied".to_string())).code(),
            "REMOTE_ERROR"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::EntryNotFound { name: "API_KEY".to_string() };
        assert_eq!(err.to_string(), "API_KEY secret not found");
        assert!(err.is_not_found());
        assert!(!ResolveError::PathUndefined.is_not_found());
    }
}
