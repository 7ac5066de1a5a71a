//! Resolved parameter sets and lookup by short name
//!
//! Short names are the full names with the fetched path removed. A name a
//! source returns that does not start with that path is dropped (with a
//! warning) rather than truncated, so custom sources must return full names.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::error::ResolveError;
use crate::path::CanonicalPath;
use crate::source::Parameter;

/// How strict lookups treat a name whose stored value is the empty string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValues {
    /// An empty value is a present value
    #[default]
    Allow,
    /// An empty value is reported as `EntryNotFound`
    Reject,
}

/// Read-only view of every parameter found under one path
///
/// Names have the path stripped. Cloning is cheap and every clone shares
/// the same underlying map; nothing handed out can write back into the cache.
#[derive(Debug, Clone)]
pub struct Parameters {
    path: CanonicalPath,
    values: Arc<BTreeMap<String, String>>,
    empty_values: EmptyValues,
}

impl Parameters {
    /// Build the short-name map from the entries a source returned for `path`
    ///
    /// Entries whose full name is not under `path` are skipped and logged,
    /// see [`CanonicalPath::strip`].
    pub fn from_fetched(
        path: CanonicalPath,
        fetched: Vec<Parameter>,
        empty_values: EmptyValues,
    ) -> Self {
        let mut values = BTreeMap::new();
        for parameter in fetched {
            match path.strip(&parameter.name) {
                Some(name) => {
                    values.insert(name.to_string(), parameter.value);
                }
                None => {
                    warn!(path = %path, name = %parameter.name, "Skipping parameter outside of path");
                }
            }
        }

        Self {
            path,
            values: Arc::new(values),
            empty_values,
        }
    }

    /// Look up a value, failing with `EntryNotFound` on a miss
    pub fn get(&self, name: &str) -> Result<&str, ResolveError> {
        match self.values.get(name) {
            Some(value) if !(value.is_empty() && self.empty_values == EmptyValues::Reject) => {
                Ok(value.as_str())
            }
            _ => Err(ResolveError::EntryNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Look up a value, leaving the miss for the caller to handle
    pub fn find(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The canonical path these parameters were fetched from
    pub fn path(&self) -> &CanonicalPath {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.values.iter(),
        }
    }

    /// Copy the values out into an owned map
    pub fn to_map(&self) -> BTreeMap<String, String> {
        (*self.values).clone()
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.values == other.values
    }
}

impl Eq for Parameters {}

/// Iterator over `(name, value)` pairs in name order
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
