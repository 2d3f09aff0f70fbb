/// Request path utilities for validation, normalization and splitting
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

pub mod hierarchy;
pub use hierarchy::StemHierarchy;

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use pagemap_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/blog/today"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about"));
/// assert!(!is_valid_path("/about/"));
/// assert!(!is_valid_path("/about//page"));
/// assert!(!is_valid_path("/about\\page"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalizes a path to canonical form
///
/// Returns `Cow::Borrowed` when the input is already valid and
/// `Cow::Owned` when normalization was needed.
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
///
/// ```
/// use pagemap_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
/// assert_eq!(normalize_path("/blog//today/"), "/blog/today");
/// assert_eq!(normalize_path("\\users\\123"), "/users/123");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Strips the query string and fragment from a request target
pub fn strip_query(request: &str) -> &str {
    request
        .split_once(['?', '#'])
        .map_or(request, |(path, _)| path)
}

/// Splits a request target into decoded path components
///
/// Query and fragment are dropped, the path is normalized, and each
/// component is percent-decoded. A component whose escapes do not decode
/// to UTF-8 is kept verbatim.
///
/// ```
/// use pagemap_router::path::request_components;
///
/// assert_eq!(request_components("/blog/today/?x=1"), vec!["blog", "today"]);
/// assert_eq!(request_components("/users/j%C3%BCrgen"), vec!["users", "jürgen"]);
/// assert!(request_components("/").is_empty());
/// ```
pub fn request_components(request: &str) -> Vec<String> {
    let path = strip_query(request);
    normalize_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|component| {
            urlencoding::decode(component)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| component.to_string())
        })
        .collect()
}
