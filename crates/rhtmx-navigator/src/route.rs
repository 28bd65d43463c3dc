/// Resolved routes
///
/// A [`Route`] is the immutable result of matching a location against the
/// route table. It is created fresh for every navigation and becomes the
/// navigator's current route only when the navigation commits.

use std::sync::Arc;

use crate::location::Location;
use crate::pattern::Params;
use crate::query::{stringify_query, Query, QueryStringifier};
use crate::record::{Meta, RouteRecord};

/// A resolved navigation target
#[derive(Debug, Clone)]
pub struct Route {
    pub name: Option<String>,
    pub path: String,
    /// Fragment including the leading `#`, or empty
    pub hash: String,
    pub query: Query,
    pub params: Params,
    /// `path` + serialized query + `hash`
    pub full_path: String,
    /// Matched records, outermost first
    pub matched: Vec<Arc<RouteRecord>>,
    pub meta: Meta,
    /// Full path of the location that redirected here
    pub redirected_from: Option<String>,
    start: bool,
}

impl Route {
    /// The "nowhere" route the navigator starts on
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::route::Route;
    ///
    /// let start = Route::start();
    /// assert_eq!(start.full_path, "/");
    /// assert!(start.is_start());
    /// assert!(start.matched.is_empty());
    /// ```
    pub fn start() -> Self {
        Self {
            start: true,
            ..Route::create(None, &Location::path("/"), None, None)
        }
    }

    /// Builds a route from a matched record (or none) and a normalized location
    pub fn create(
        record: Option<&Arc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
        stringify: Option<&QueryStringifier>,
    ) -> Self {
        let path = match location.path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => "/".to_string(),
        };

        Self {
            name: location
                .name
                .clone()
                .or_else(|| record.and_then(|r| r.name().map(str::to_string))),
            hash: location.hash.clone().unwrap_or_default(),
            query: location.query.clone().unwrap_or_default(),
            params: location.params.clone().unwrap_or_default(),
            full_path: get_full_path(location, stringify),
            matched: record.map(format_match).unwrap_or_default(),
            meta: record.map(|r| r.meta().clone()).unwrap_or_default(),
            redirected_from: redirected_from.map(|from| get_full_path(from, stringify)),
            path,
            start: false,
        }
    }

    /// Whether this is the pre-navigation sentinel
    pub fn is_start(&self) -> bool {
        self.start
    }

    /// The innermost matched record
    pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
        self.matched.last()
    }

    /// Compares two routes by location
    ///
    /// Paths are compared ignoring one trailing slash; query and hash must be
    /// equal too. Routes without a path fall back to name + params. The start
    /// route is only the same as itself.
    pub fn is_same_route(&self, other: &Route) -> bool {
        self.same_location(other, false)
    }

    /// Like [`Route::is_same_route`] but ignoring query and hash
    pub fn is_same_path(&self, other: &Route) -> bool {
        self.same_location(other, true)
    }

    fn same_location(&self, other: &Route, only_path: bool) -> bool {
        if other.start || self.start {
            return self.start && other.start;
        }

        let extras_equal = || self.hash == other.hash && self.query == other.query;

        if !self.path.is_empty() && !other.path.is_empty() {
            trim_trailing_slash(&self.path) == trim_trailing_slash(&other.path)
                && (only_path || extras_equal())
        } else if let (Some(a), Some(b)) = (&self.name, &other.name) {
            a == b && (only_path || (extras_equal() && self.params == other.params))
        } else {
            false
        }
    }
}

/// Serializes a location as `path?query#hash`
pub fn get_full_path(location: &Location, stringify: Option<&QueryStringifier>) -> String {
    let path = match location.path.as_deref() {
        Some(path) if !path.is_empty() => path,
        _ => "/",
    };
    let query = match (&location.query, stringify) {
        (Some(query), Some(stringify)) => stringify(query),
        (Some(query), None) => stringify_query(query),
        (None, _) => String::new(),
    };

    format!("{}{}{}", path, query, location.hash.as_deref().unwrap_or_default())
}

/// Walks the parent chain of `record`, returning records outermost first
pub fn format_match(record: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
    let mut matched = vec![Arc::clone(record)];
    let mut cursor = record.parent();
    while let Some(parent) = cursor {
        cursor = parent.parent();
        matched.push(parent);
    }
    matched.reverse();
    matched
}

fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryValue;

    fn route(path: &str) -> Route {
        Route::create(None, &Location::path(path), None, None)
    }

    #[test]
    fn test_full_path_serializes_query_and_hash() {
        let location = Location::path("/search")
            .with_query("q", "rust lang")
            .with_hash("#results");
        let route = Route::create(None, &location, None, None);
        assert_eq!(route.full_path, "/search?q=rust%20lang#results");
    }

    #[test]
    fn test_same_route_ignores_trailing_slash() {
        assert!(route("/a/").is_same_route(&route("/a")));
        assert!(!route("/a").is_same_route(&route("/b")));
    }

    #[test]
    fn test_same_route_compares_query() {
        let mut a = route("/a");
        let b = route("/a");
        a.query.insert("x".into(), QueryValue::from("1"));
        assert!(!a.is_same_route(&b));
        assert!(a.is_same_path(&b));
    }

    #[test]
    fn test_start_is_only_same_as_start() {
        assert!(Route::start().is_same_route(&Route::start()));
        assert!(!route("/").is_same_route(&Route::start()));
        assert!(!Route::start().is_same_route(&route("/")));
    }

    #[test]
    fn test_redirected_from_is_full_path() {
        let from = Location::path("/old").with_query("a", "1");
        let route = Route::create(None, &Location::path("/new"), Some(&from), None);
        assert_eq!(route.redirected_from.as_deref(), Some("/old?a=1"));
    }
}
