/// Path utilities for cleaning, resolving and splitting navigation paths
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static REPEATED_SLASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:\s*/)+").expect("static slash pattern is valid"));

/// Collapses runs of separators (`//`, `/ /`) into a single `/`
///
/// Returns `Cow::Borrowed` when the path is already clean (zero allocations).
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::clean_path;
///
/// assert_eq!(clean_path("/a//b"), "/a/b");
/// assert_eq!(clean_path("/a/ /b"), "/a/b");
/// assert_eq!(clean_path("/a/b"), "/a/b");
/// ```
pub fn clean_path(path: &str) -> Cow<'_, str> {
    REPEATED_SLASHES.replace_all(path, "/")
}

/// Resolves `relative` against `base`
///
/// - Absolute paths (`/x`) are returned unchanged
/// - `?query` and `#hash` only targets are appended to `base`
/// - Otherwise segments are applied one by one, honoring `.` and `..`
///
/// With `append = false` the last segment of `base` is replaced, like a
/// relative link in a document. With `append = true` the relative path is
/// appended below `base`.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::resolve_path;
///
/// assert_eq!(resolve_path("/abs", "/a/b", false), "/abs");
/// assert_eq!(resolve_path("c", "/a/b", false), "/a/c");
/// assert_eq!(resolve_path("c", "/a/b", true), "/a/b/c");
/// assert_eq!(resolve_path("../c", "/a/b", true), "/a/c");
/// assert_eq!(resolve_path("?x=1", "/a/b", false), "/a/b?x=1");
/// ```
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?') | Some('#') => return format!("{}{}", base, relative),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();

    // remove trailing segment if:
    // - not appending
    // - appending to trailing slash (last segment is empty)
    if !append || stack.last().map_or(false, |last| last.is_empty()) {
        stack.pop();
    }

    let relative = relative.strip_prefix('/').unwrap_or(relative);
    for segment in relative.split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            _ => stack.push(segment),
        }
    }

    // ensure leading slash
    if stack.first().map_or(true, |first| !first.is_empty()) {
        stack.insert(0, "");
    }

    stack.join("/")
}

/// A path split into its path, query and hash parts (without `?` / `#`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPath<'a> {
    pub path: &'a str,
    pub query: &'a str,
    pub hash: &'a str,
}

/// Splits `path?query#hash` into its parts (zero-copy)
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::parse_path;
///
/// let parsed = parse_path("/users?page=2#top");
/// assert_eq!(parsed.path, "/users");
/// assert_eq!(parsed.query, "page=2");
/// assert_eq!(parsed.hash, "top");
/// ```
pub fn parse_path(path: &str) -> ParsedPath<'_> {
    let (rest, hash) = path.split_once('#').unwrap_or((path, ""));
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

    ParsedPath { path, query, hash }
}

/// Normalizes an application base path
///
/// Adds the leading slash and strips the trailing one, so that `base + full_path`
/// never doubles a separator. The root base normalizes to the empty string.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::normalize_base;
///
/// assert_eq!(normalize_base("app/"), "/app");
/// assert_eq!(normalize_base("/"), "");
/// assert_eq!(normalize_base(""), "");
/// ```
pub fn normalize_base(base: &str) -> String {
    let base = if base.starts_with('/') {
        Cow::Borrowed(base)
    } else {
        Cow::Owned(format!("/{}", base))
    };

    base.strip_suffix('/').unwrap_or(&base).to_string()
}

/// Removes `base` from the front of `url` (case-insensitive), falling back to `/`
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::strip_base;
///
/// assert_eq!(strip_base("/app/users?x=1", "/app"), "/users?x=1");
/// assert_eq!(strip_base("/APP", "/app"), "/");
/// assert_eq!(strip_base("/other", "/app"), "/other");
/// ```
pub fn strip_base<'a>(url: &'a str, base: &str) -> Cow<'a, str> {
    let has_base = !base.is_empty()
        && url.len() >= base.len()
        && url.is_char_boundary(base.len())
        && url[..base.len()].eq_ignore_ascii_case(base);

    if !has_base {
        return Cow::Borrowed(url);
    }

    let rest = &url[base.len()..];
    match rest.chars().next() {
        None | Some('?') | Some('#') => Cow::Owned(format!("/{}", rest)),
        Some('/') => Cow::Borrowed(rest),
        // `/application` does not live under `/app`
        Some(_) => Cow::Borrowed(url),
    }
}
