// ABOUTME: URL normalization for extracted links against a source's base URL.
// ABOUTME: Handles protocol-relative, relative and absolute inputs without ever panicking.

use url::{ParseError, Url};

/// Why a non-empty URL could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid base URL `{base}`: {source}")]
    InvalidBase { base: String, source: ParseError },
    #[error("malformed URL `{raw}`: {source}")]
    Malformed { raw: String, source: ParseError },
}

/// Resolves `raw` against `base`.
///
/// - `None`, empty or whitespace-only input is absent, not an error.
/// - `//host/path` gets an `https:` prefix.
/// - Relative input is joined against `base` (RFC 3986 `..`/`.` semantics).
/// - Absolute input is returned unchanged apart from trimming.
pub fn try_resolve(raw: Option<&str>, base: &str) -> Result<Option<String>, ResolveError> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(None),
    };

    if raw.starts_with("//") {
        let candidate = format!("https:{}", raw);
        return match Url::parse(&candidate) {
            Ok(_) => Ok(Some(candidate)),
            Err(source) => Err(ResolveError::Malformed {
                raw: raw.to_string(),
                source,
            }),
        };
    }

    match Url::parse(raw) {
        Ok(_) => Ok(Some(raw.to_string())),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base_url = Url::parse(base).map_err(|source| ResolveError::InvalidBase {
                base: base.to_string(),
                source,
            })?;
            base_url
                .join(raw)
                .map(|u| Some(u.to_string()))
                .map_err(|source| ResolveError::Malformed {
                    raw: raw.to_string(),
                    source,
                })
        }
        Err(source) => Err(ResolveError::Malformed {
            raw: raw.to_string(),
            source,
        }),
    }
}

/// Like [`try_resolve`], but folds every failure into `None`.
pub fn resolve(raw: Option<&str>, base: &str) -> Option<String> {
    try_resolve(raw, base).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_empty_are_absent() {
        assert_eq!(resolve(None, "https://a.b"), None);
        assert_eq!(resolve(Some(""), "https://a.b"), None);
        assert_eq!(resolve(Some("   "), "https://a.b"), None);
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            resolve(Some("//x/y"), "https://a.b"),
            Some("https://x/y".to_string())
        );
        assert_eq!(
            resolve(Some("//cdn.bdjobs.com/logo.png"), "http://other.example/"),
            Some("https://cdn.bdjobs.com/logo.png".to_string())
        );
    }

    #[test]
    fn root_relative_replaces_path() {
        assert_eq!(
            resolve(Some("/p"), "https://a.b/c/"),
            Some("https://a.b/p".to_string())
        );
    }

    #[test]
    fn relative_resolves_dot_segments() {
        assert_eq!(
            resolve(Some("../tender/42"), "https://a.b/h/list/"),
            Some("https://a.b/h/tender/42".to_string())
        );
        assert_eq!(
            resolve(Some("./x?id=1"), "https://a.b/h/"),
            Some("https://a.b/h/x?id=1".to_string())
        );
    }

    #[test]
    fn absolute_is_unchanged() {
        assert_eq!(
            resolve(Some("https://z"), "https://a.b"),
            Some("https://z".to_string())
        );
        assert_eq!(
            resolve(Some("  http://z/q?a=1  "), "https://a.b"),
            Some("http://z/q?a=1".to_string())
        );
    }

    #[test]
    fn malformed_input_is_none_and_reported() {
        assert_eq!(resolve(Some("http://[::1"), "https://a.b"), None);
        assert!(matches!(
            try_resolve(Some("http://[::1"), "https://a.b"),
            Err(ResolveError::Malformed { .. })
        ));
    }

    #[test]
    fn relative_against_bad_base_is_reported() {
        assert!(matches!(
            try_resolve(Some("/p"), "not a url"),
            Err(ResolveError::InvalidBase { .. })
        ));
    }
}
