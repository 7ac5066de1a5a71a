//! Parameter path normalization
//!
//! Turns a caller-supplied path (or the configured default) into the
//! canonical form used as the cache key: a unicode string ending in `/`.

use std::ffi::OsStr;
use std::fmt;

use crate::error::ResolveError;

/// Hierarchy separator used by the parameter store
pub const SEPARATOR: char = '/';

/// A parameter path in canonical form (always ends with `/`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip this path from the front of a full parameter name
    ///
    /// Returns None if `full_name` is not located under this path. Names
    /// are matched on the whole prefix, not sliced by length, so a source
    /// returning names from elsewhere never yields a mangled short name.
    pub fn strip<'a>(&self, full_name: &'a str) -> Option<&'a str> {
        full_name.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a path argument into its canonical form
///
/// An absent or empty `path` falls back to `default_path`. Fails with
/// `PathUndefined` when neither is available and with `InvalidPath` when
/// the argument is not valid unicode.
pub fn normalize(
    path: Option<&OsStr>,
    default_path: Option<&str>,
) -> Result<CanonicalPath, ResolveError> {
    let path = match path.filter(|p| !p.is_empty()) {
        Some(p) => p
            .to_str()
            .ok_or_else(|| ResolveError::InvalidPath(p.to_os_string()))?,
        None => default_path
            .filter(|p| !p.is_empty())
            .ok_or(ResolveError::PathUndefined)?,
    };

    let mut canonical = path.to_string();
    if !canonical.ends_with(SEPARATOR) {
        canonical.push(SEPARATOR);
    }
    Ok(CanonicalPath(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(path: Option<&str>, default_path: Option<&str>) -> Result<CanonicalPath, ResolveError> {
        normalize(path.map(OsStr::new), default_path)
    }

    #[test]
    fn test_appends_trailing_separator() {
        assert_eq!(norm(Some("/a"), None).unwrap().as_str(), "/a/");
        assert_eq!(norm(Some("/a/"), None).unwrap().as_str(), "/a/");
        assert_eq!(norm(Some("/a"), None), norm(Some("/a/"), None));
    }

    #[test]
    fn test_keeps_other_formatting() {
        // Only the trailing separator rule applies
        assert_eq!(norm(Some(" /a "), None).unwrap().as_str(), " /a /");
        assert_eq!(norm(Some("/a//"), None).unwrap().as_str(), "/a//");
        assert_eq!(norm(Some("/"), None).unwrap().as_str(), "/");
    }

    #[test]
    fn test_default_path_fallback() {
        assert_eq!(
            norm(None, Some("/default-path")).unwrap().as_str(),
            "/default-path/"
        );
        assert_eq!(
            norm(Some(""), Some("/default-path/")).unwrap().as_str(),
            "/default-path/"
        );
        // Explicit argument wins over the default
        assert_eq!(
            norm(Some("/custom-path"), Some("/default-path/")).unwrap().as_str(),
            "/custom-path/"
        );
    }

    #[test]
    fn test_path_undefined() {
        assert_eq!(norm(None, None), Err(ResolveError::PathUndefined));
        assert_eq!(norm(Some(""), Some("")), Err(ResolveError::PathUndefined));
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_path() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/a/\xff");
        let err = normalize(Some(raw), Some("/default-path/")).unwrap_err();
        assert_eq!(err, ResolveError::InvalidPath(raw.to_os_string()));
    }

    #[test]
    fn test_strip() {
        let path = norm(Some("/a"), None).unwrap();
        assert_eq!(path.strip("/a/FOO"), Some("FOO"));
        assert_eq!(path.strip("/a/nested/BAR"), Some("nested/BAR"));
        assert_eq!(path.strip("/b/FOO"), None);
        // Prefix must match whole, not by length
        assert_eq!(path.strip("/ab/FOO"), None);
    }
}
