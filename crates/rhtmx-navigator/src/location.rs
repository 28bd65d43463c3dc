/// Navigation targets and their normalization
///
/// A [`Location`] is what callers hand to `push`/`replace`: a path string,
/// a path with query/hash, a named route with params, or params alone
/// (relative to the current route). [`normalize_location`] turns any of these
/// into a canonical form carrying either a resolved path or a name.

use crate::path::{parse_path, resolve_path};
use crate::pattern::Params;
use crate::query::{resolve_query, Query, QueryParser, QueryValue};
use crate::route::Route;

/// A raw or normalized navigation target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: Option<String>,
    pub name: Option<String>,
    pub params: Option<Params>,
    pub query: Option<Query>,
    /// Fragment, with or without the leading `#`
    pub hash: Option<String>,
    /// Resolve a relative path below the current one instead of beside it
    pub append: bool,
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    pub(crate) normalized: bool,
}

impl Location {
    /// Target by path (may contain `?query` and `#hash`)
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Target by route name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Target that only changes params of the current route
    pub fn relative(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Whether this location already went through [`normalize_location`]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) fn mark_normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Location::path(path)
    }
}

impl From<String> for Location {
    fn from(path: String) -> Self {
        Location::path(path)
    }
}

impl From<&String> for Location {
    fn from(path: &String) -> Self {
        Location::path(path.as_str())
    }
}

/// Normalizes a navigation target against the current route
///
/// - normalized input is returned unchanged
/// - named input is returned as is
/// - params-only input merges into the current route's params
/// - path input is resolved against the current path, with query and hash split out
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::location::{normalize_location, Location};
/// use rhtmx_navigator::route::Route;
///
/// let current = Route::start();
/// let next = normalize_location(&Location::from("users?page=2#top"), Some(&current), false, None);
/// assert_eq!(next.path.as_deref(), Some("/users"));
/// assert_eq!(next.hash.as_deref(), Some("#top"));
/// assert!(next.is_normalized());
/// ```
pub fn normalize_location(
    raw: &Location,
    current: Option<&Route>,
    append: bool,
    parser: Option<&QueryParser>,
) -> Location {
    if raw.normalized || raw.name.is_some() {
        return raw.clone();
    }

    if let (None, Some(params), Some(current)) = (&raw.path, &raw.params, current) {
        return normalize_relative_params(raw, params, current);
    }

    let path = raw.path.as_deref().unwrap_or_default();
    let parsed = parse_path(path);
    let base_path = current.map_or("/", |route| route.path.as_str());

    let path = if parsed.path.is_empty() {
        base_path.to_string()
    } else {
        resolve_path(parsed.path, base_path, append || raw.append)
    };

    let query = resolve_query(parsed.query, raw.query.as_ref(), parser);

    let hash = raw
        .hash
        .as_deref()
        .filter(|hash| !hash.is_empty())
        .unwrap_or(parsed.hash);
    let hash = match hash {
        "" => None,
        h if h.starts_with('#') => Some(h.to_string()),
        h => Some(format!("#{}", h)),
    };

    Location {
        path: Some(path),
        query: Some(query),
        hash,
        replace: raw.replace,
        ..Default::default()
    }
    .mark_normalized()
}

fn normalize_relative_params(raw: &Location, params: &Params, current: &Route) -> Location {
    let mut next = raw.clone().mark_normalized();

    let mut merged = current.params.clone();
    merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

    if let Some(name) = &current.name {
        next.name = Some(name.clone());
        next.params = Some(merged);
    } else if let Some(record) = current.matched.last() {
        next.path = Some(match record.pattern().fill(&merged) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(path = %current.path, error = %err, "Could not fill params for relative navigation");
                String::new()
            }
        });
    } else {
        tracing::warn!(
            path = %current.path,
            "Relative params navigation requires a current route"
        );
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn route_at(path: &str) -> Route {
        let mut route = Route::start();
        route.path = path.to_string();
        route
    }

    #[rstest]
    #[case("/abs", "/a/b", false, "/abs")]
    #[case("c", "/a/b", false, "/a/c")]
    #[case("c", "/a/b", true, "/a/b/c")]
    #[case("", "/a/b", false, "/a/b")]
    #[case("?x=1", "/a/b", false, "/a/b")]
    fn test_normalize_paths(
        #[case] target: &str,
        #[case] current: &str,
        #[case] append: bool,
        #[case] expected: &str,
    ) {
        let current = route_at(current);
        let next = normalize_location(&Location::from(target), Some(&current), append, None);
        assert_eq!(next.path.as_deref(), Some(expected));
    }

    #[test]
    fn test_normalized_passes_through() {
        let once = normalize_location(&Location::from("/x?a=1"), None, false, None);
        let twice = normalize_location(&once, Some(&route_at("/other")), true, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_explicit_query_wins() {
        let raw = Location::from("/list?page=1&sort=asc").with_query("page", "2");
        let next = normalize_location(&raw, None, false, None);
        let query = next.query.unwrap();
        assert_eq!(query["page"], QueryValue::from("2"));
        assert_eq!(query["sort"], QueryValue::from("asc"));
    }

    #[test]
    fn test_explicit_hash_gets_prefix() {
        let raw = Location::from("/doc#ignored").with_hash("intro");
        let next = normalize_location(&raw, None, false, None);
        assert_eq!(next.hash.as_deref(), Some("#intro"));
    }

    #[test]
    fn test_named_is_untouched() {
        let raw = Location::named("user").with_param("id", "1");
        let next = normalize_location(&raw, Some(&route_at("/")), false, None);
        assert_eq!(next, raw);
        assert!(!next.is_normalized());
    }

    #[test]
    fn test_relative_params_keep_current_name() {
        let mut current = route_at("/user/1");
        current.name = Some("user".to_string());
        current.params.insert("id".into(), "1".into());
        current.params.insert("tab".into(), "info".into());

        let raw = Location::default().with_param("id", "2");
        let next = normalize_location(&raw, Some(&current), false, None);

        assert_eq!(next.name.as_deref(), Some("user"));
        let params = next.params.as_ref().unwrap();
        assert_eq!(params["id"], "2");
        assert_eq!(params["tab"], "info");
        assert!(next.is_normalized());
    }

    #[test]
    fn test_relative_params_without_current_resolves_root() {
        let raw = Location::default().with_param("id", "2");
        let next = normalize_location(&raw, None, false, None);
        assert_eq!(next.path.as_deref(), Some("/"));
    }
}
