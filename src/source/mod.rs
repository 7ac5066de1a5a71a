//! Parameter sources
//!
//! A source fetches every entry stored under a path. The resolver cache
//! only ever talks to this trait; the SSM backend is one implementation.

pub mod errors;
#[cfg(feature = "ssm")]
pub mod ssm;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

pub use errors::FetchError;
#[cfg(feature = "ssm")]
pub use ssm::SsmSource;

/// A single entry as returned by the store, keyed by its full name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Full name including the path, e.g. `/service/prod/API_KEY`
    pub name: String,
    /// Plaintext value
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Fetches all parameters located under a path
///
/// Implementations must drain any pagination and return the complete set
/// in one call. Retrying transient failures is up to the implementation.
#[async_trait]
pub trait ParameterSource: Send + Sync {
    async fn fetch_by_path(&self, path: &str) -> Result<Vec<Parameter>, FetchError>;
}

#[async_trait]
impl<T> ParameterSource for Arc<T>
where
    T: ParameterSource + ?Sized,
{
    async fn fetch_by_path(&self, path: &str) -> Result<Vec<Parameter>, FetchError> {
        (**self).fetch_by_path(path).await
    }
}

/// Adapter turning an async closure into a [`ParameterSource`]
pub struct FnSource<F>(F);

impl<F, Fut> FnSource<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Parameter>, FetchError>> + Send,
{
    pub fn new(fetch: F) -> Self {
        Self(fetch)
    }
}

#[async_trait]
impl<F, Fut> ParameterSource for FnSource<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Parameter>, FetchError>> + Send,
{
    async fn fetch_by_path(&self, path: &str) -> Result<Vec<Parameter>, FetchError> {
        (self.0)(path.to_string()).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_source() {
        let source = FnSource::new(|path: String| async move {
            Ok::<_, FetchError>(vec![Parameter::new(format!("{}KEY", path), "value")])
        });

        let params = source.fetch_by_path("/a/").await.unwrap();
        assert_eq!(params, vec![Parameter::new("/a/KEY", "value")]);
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let mock = testing::MockSource::with_fixtures();
        let source: Arc<dyn ParameterSource> = mock.clone();

        let params = source.fetch_by_path("/custom-path/").await.unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(mock.calls(), 1);

        let err = source.fetch_by_path("/unknown/").await.unwrap_err();
        assert!(matches!(err, FetchError::Remote(_)));
    }
}
