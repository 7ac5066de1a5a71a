//! Path-scoped parameter resolution with an in-memory read-through cache
//!
//! Fetches every entry stored under a path in a hierarchical parameter
//! store (AWS SSM Parameter Store by default), strips the path from each
//! name, and serves lookups by short name. Concurrent requests for the same
//! path share one fetch; results are kept forever or for a configured TTL.
//!
//! ```no_run
//! use ssm_param_resolve::{ResolverCache, ResolverConfig, SsmConfig, SsmSource};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = SsmSource::connect(&SsmConfig::from_env()?).await;
//! let cache = ResolverCache::new(source, ResolverConfig::new().with_default_path("/service/prod"));
//!
//! let api_key = cache.resolve_one("API_KEY").await?;
//! let shared = cache.resolve_path("/service/shared").await?;
//! let region = shared.find("REGION").unwrap_or("eu-west-1");
//! # let _ = (api_key, region);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod parameters;
pub mod path;
pub mod source;

pub use cache::{CacheStats, ResolverCache};
pub use config::{ConfigError, ResolverConfig, SsmConfig};
pub use error::ResolveError;
pub use parameters::{EmptyValues, Parameters};
pub use path::{normalize, CanonicalPath};
pub use source::{FetchError, FnSource, Parameter, ParameterSource};
#[cfg(feature = "ssm")]
pub use source::SsmSource;
