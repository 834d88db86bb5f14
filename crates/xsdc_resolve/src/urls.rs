//! Scheme-aware location resolution.
//!
//! Schema locations are usually resolved with plain RFC 3986 joining, but
//! two families need help: `jar:`/`zip:` wrapper URLs (where the entry
//! path after `!` is what a relative reference resolves against) and
//! bare relative locations for the initial document set (resolved against
//! a configured base URI).

use url::Url;

/// Errors from location resolution.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    /// The location (or its base) could not be parsed as a URL.
    #[error("malformed URL '{url}': {source}")]
    Malformed {
        /// The offending URL text.
        url: String,
        /// The underlying parse error.
        source: url::ParseError,
    },

    /// A relative location was given with no base to resolve against.
    #[error("relative location '{0}' with no base URI")]
    NoBase(String),

    /// A `jar:`/`zip:` wrapper URL is missing its `!` entry separator.
    #[error("wrapper URL '{0}' has no '!' entry separator")]
    BadWrapper(String),
}

/// Returns the scheme of a URL-shaped string, if it has one.
pub fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    if !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
    {
        Some(scheme)
    } else {
        None
    }
}

/// Resolves `location` to an absolute URL string.
///
/// Absolute locations are returned normalized. Relative locations are
/// joined against `base` (the referencing document's source URL, or the
/// configured base URI). When the base is a `jar:` or `zip:` wrapper, the
/// join is applied to the entry path after `!` and the wrapper is
/// reassembled around the result.
pub fn resolve_location(base: Option<&str>, location: &str) -> Result<String, UrlError> {
    if let Ok(absolute) = Url::parse(location) {
        return Ok(absolute.to_string());
    }

    let base = base.ok_or_else(|| UrlError::NoBase(location.to_string()))?;

    for wrapper in ["jar", "zip"] {
        let prefix = format!("{wrapper}:");
        if let Some(inner) = base.strip_prefix(&prefix) {
            let (archive, entry) = inner
                .split_once('!')
                .ok_or_else(|| UrlError::BadWrapper(base.to_string()))?;
            let resolved_entry = join_entry_path(entry, location, base)?;
            return Ok(format!("{prefix}{archive}!{resolved_entry}"));
        }
    }

    let base_url = Url::parse(base).map_err(|source| UrlError::Malformed {
        url: base.to_string(),
        source,
    })?;
    let joined = base_url.join(location).map_err(|source| UrlError::Malformed {
        url: location.to_string(),
        source,
    })?;
    Ok(joined.to_string())
}

/// Joins a relative location against an archive entry path, using a dummy
/// authority so the standard-library join semantics apply to the entry.
fn join_entry_path(entry: &str, location: &str, original: &str) -> Result<String, UrlError> {
    let dummy = format!("file://entry{}", if entry.starts_with('/') { "" } else { "/" });
    let base = Url::parse(&format!("{dummy}{entry}")).map_err(|source| UrlError::Malformed {
        url: original.to_string(),
        source,
    })?;
    let joined = base.join(location).map_err(|source| UrlError::Malformed {
        url: location.to_string(),
        source,
    })?;
    Ok(joined.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_location_wins() {
        let r = resolve_location(Some("file:///base/a.xsd"), "http://example.org/b.xsd").unwrap();
        assert_eq!(r, "http://example.org/b.xsd");
    }

    #[test]
    fn relative_against_file_base() {
        let r = resolve_location(Some("file:///schemas/a.xsd"), "sub/b.xsd").unwrap();
        assert_eq!(r, "file:///schemas/sub/b.xsd");
    }

    #[test]
    fn dot_dot_normalizes() {
        let r = resolve_location(Some("file:///schemas/nested/a.xsd"), "../b.xsd").unwrap();
        assert_eq!(r, "file:///schemas/b.xsd");
    }

    #[test]
    fn relative_with_no_base_fails() {
        assert!(matches!(
            resolve_location(None, "b.xsd"),
            Err(UrlError::NoBase(_))
        ));
    }

    #[test]
    fn jar_wrapper_resolves_entry_path() {
        let base = "jar:file:///lib/schemas.jar!/xsd/a.xsd";
        let r = resolve_location(Some(base), "b.xsd").unwrap();
        assert_eq!(r, "jar:file:///lib/schemas.jar!/xsd/b.xsd");
    }

    #[test]
    fn jar_wrapper_handles_parent_traversal() {
        let base = "zip:file:///lib/schemas.zip!/xsd/deep/a.xsd";
        let r = resolve_location(Some(base), "../b.xsd").unwrap();
        assert_eq!(r, "zip:file:///lib/schemas.zip!/xsd/b.xsd");
    }

    #[test]
    fn wrapper_without_separator_fails() {
        let base = "jar:file:///lib/schemas.jar";
        assert!(matches!(
            resolve_location(Some(base), "b.xsd"),
            Err(UrlError::BadWrapper(_))
        ));
    }

    #[test]
    fn scheme_detection() {
        assert_eq!(scheme_of("file:///a"), Some("file"));
        assert_eq!(scheme_of("jar:file:///a!/b"), Some("jar"));
        assert_eq!(scheme_of("relative/path.xsd"), None);
        assert_eq!(scheme_of("no-colon"), None);
    }
}
