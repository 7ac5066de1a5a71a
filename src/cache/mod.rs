//! Parameter caching layer
//!
//! Caches resolved parameter paths in memory using Moka, with single-flight
//! fetching and optional TTL-based refresh.

pub mod resolver;

pub use resolver::{CacheStats, ResolverCache};
