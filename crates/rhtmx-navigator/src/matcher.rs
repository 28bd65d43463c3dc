/// Route matcher
///
/// Resolves a location against the route table into a [`Route`]:
///
/// 1. normalize the location (relative paths, params-only targets)
/// 2. named targets: look up the name, fill the path from params
/// 3. path targets: scan `path_list` in order, first match wins
/// 4. records with `redirect` re-match the redirect target
/// 5. alias records re-match their canonical path so `matched` holds
///    canonical records

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use crate::config::RouteConfig;
use crate::error::{MatchError, TableError};
use crate::location::{normalize_location, Location};
use crate::path::resolve_path;
use crate::pattern::{CompiledPattern, Params, PatternOptions};
use crate::query::{QueryParser, QueryStringifier};
use crate::record::RouteRecord;
use crate::route::Route;
use crate::table::{RouteTable, TableOptions};

/// Longest chain of config redirects followed before giving up
pub const MAX_REDIRECTS: usize = 16;

/// Route table plus the matching algorithm
pub struct Matcher {
    table: RwLock<RouteTable>,
    options: TableOptions,
    parse_query: Option<QueryParser>,
    stringify_query: Option<QueryStringifier>,
}

impl Matcher {
    pub fn new(table: RouteTable, options: TableOptions) -> Self {
        Self {
            table: RwLock::new(table),
            options,
            parse_query: None,
            stringify_query: None,
        }
    }

    /// Builds the table and the matcher in one go
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::config::RouteConfig;
    /// use rhtmx_navigator::matcher::Matcher;
    /// use rhtmx_navigator::table::TableOptions;
    ///
    /// let matcher = Matcher::from_routes(
    ///     vec![RouteConfig::new("/user/:id").with_name("user")],
    ///     TableOptions::default(),
    /// ).unwrap();
    /// let route = matcher.match_location(&"/user/42?tab=posts".into(), None, None).unwrap();
    /// assert_eq!(route.name.as_deref(), Some("user"));
    /// assert_eq!(route.params["id"], "42");
    /// assert_eq!(route.full_path, "/user/42?tab=posts");
    /// ```
    pub fn from_routes(routes: Vec<RouteConfig>, options: TableOptions) -> Result<Self, TableError> {
        Ok(Self::new(RouteTable::build(routes, &options)?, options))
    }

    pub fn with_query_parser(mut self, parser: QueryParser) -> Self {
        self.parse_query = Some(parser);
        self
    }

    pub fn with_query_stringifier(mut self, stringifier: QueryStringifier) -> Self {
        self.stringify_query = Some(stringifier);
        self
    }

    pub(crate) fn query_parser(&self) -> Option<&QueryParser> {
        self.parse_query.as_ref()
    }

    pub(crate) fn query_stringifier(&self) -> Option<&QueryStringifier> {
        self.stringify_query.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends top-level routes
    pub fn add_routes(&self, routes: Vec<RouteConfig>) -> Result<(), TableError> {
        self.write().add_routes(routes, None, &self.options)
    }

    /// Appends a route as a child of the route named `parent`
    pub fn add_route_to(&self, parent: &str, route: RouteConfig) -> Result<(), TableError> {
        let mut table = self.write();
        let parent_record = table
            .record_for_name(parent)
            .cloned()
            .ok_or_else(|| TableError::UnknownParent(parent.to_string()))?;
        table.add_routes(vec![route], Some(&parent_record), &self.options)
    }

    /// Registered records in match priority order
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.read().records()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.read().record_for_name(name).is_some()
    }

    /// Resolves `raw` (relative to `current`) into a route
    pub fn match_location(
        &self,
        raw: &Location,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Result<Route, MatchError> {
        let table = self.read();
        self.match_in(&table, raw, current, redirected_from, 0)
    }

    fn match_in(
        &self,
        table: &RouteTable,
        raw: &Location,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let mut location = normalize_location(raw, current, false, self.query_parser());

        if let Some(name) = location.name.clone() {
            let Some(record) = table.record_for_name(&name) else {
                tracing::warn!(name = %name, "Route with name does not exist");
                return Ok(self.create_route(None, &location, None));
            };

            let mut params = location.params.take().unwrap_or_default();
            if let Some(current) = current {
                for key in record.pattern().keys().iter().filter(|key| !key.optional) {
                    if !params.contains_key(&key.name) {
                        if let Some(value) = current.params.get(&key.name) {
                            params.insert(key.name.clone(), value.clone());
                        }
                    }
                }
            }

            let path = record
                .pattern()
                .fill(&params)
                .map_err(|source| MatchError::MissingParam {
                    route: format!("named route \"{}\"", name),
                    source,
                })?;
            location.path = Some(path);
            location.params = Some(params);

            let record = Arc::clone(record);
            return self.resolve_record(table, Some(&record), location, redirected_from, depth);
        }

        if let Some(path) = location.path.as_deref().filter(|path| !path.is_empty()) {
            let found = table.path_list().iter().find_map(|candidate| {
                let record = table.record_for_path(candidate)?;
                record.pattern().captures(path).map(|params| (record, params))
            });

            if let Some((record, params)) = found {
                location.params = Some(params);
                let record = Arc::clone(record);
                return self.resolve_record(table, Some(&record), location, redirected_from, depth);
            }
            location.params = Some(Params::new());
        }

        Ok(self.create_route(None, &location, None))
    }

    fn resolve_record(
        &self,
        table: &RouteTable,
        record: Option<&Arc<RouteRecord>>,
        location: Location,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let Some(record) = record else {
            return Ok(self.create_route(None, &location, redirected_from));
        };

        if record.redirect().is_some() {
            return self.redirect(table, record, location, redirected_from, depth);
        }
        if let Some(match_as) = record.match_as() {
            return self.alias(table, record, match_as, location, redirected_from, depth);
        }

        Ok(self.create_route(Some(record), &location, redirected_from))
    }

    fn redirect(
        &self,
        table: &RouteTable,
        record: &Arc<RouteRecord>,
        location: Location,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let origin = redirected_from.cloned().unwrap_or_else(|| location.clone());

        if depth >= MAX_REDIRECTS {
            return Err(MatchError::RedirectLoop {
                path: origin.path.clone().unwrap_or_default(),
                limit: MAX_REDIRECTS,
            });
        }

        let Some(redirect) = record.redirect() else {
            return Ok(self.create_route(Some(record), &location, redirected_from));
        };
        let target = redirect.evaluate(&self.create_route(Some(record), &location, None));

        let query = target.query.clone().or_else(|| location.query.clone());
        let hash = target.hash.clone().or_else(|| location.hash.clone());
        let params = target.params.clone().or_else(|| location.params.clone());

        if let Some(name) = target.name.as_deref() {
            if table.record_for_name(name).is_none() {
                return Err(MatchError::InvalidRedirect {
                    path: record.path().to_string(),
                    reason: format!("named route \"{}\" not found", name),
                });
            }
            let next = Location {
                name: Some(name.to_string()),
                params,
                query,
                hash,
                ..Default::default()
            }
            .mark_normalized();
            return self.match_in(table, &next, None, Some(&origin), depth + 1);
        }

        if let Some(path) = target.path.as_deref() {
            let parent_path = record.parent().map(|p| p.path().to_string());
            let raw_path = resolve_path(path, parent_path.as_deref().unwrap_or("/"), true);
            let filled = CompiledPattern::compile(&raw_path, PatternOptions::default())
                .map_err(|err| MatchError::InvalidRedirect {
                    path: record.path().to_string(),
                    reason: err.to_string(),
                })?
                .fill(&params.unwrap_or_default())
                .map_err(|source| MatchError::MissingParam {
                    route: format!("redirect route with path \"{}\"", raw_path),
                    source,
                })?;

            let next = Location {
                path: Some(filled),
                query,
                hash,
                ..Default::default()
            }
            .mark_normalized();
            return self.match_in(table, &next, None, Some(&origin), depth + 1);
        }

        tracing::warn!(path = record.path(), redirect = ?target, "Invalid redirect target");
        Ok(self.create_route(None, &location, None))
    }

    fn alias(
        &self,
        table: &RouteTable,
        record: &Arc<RouteRecord>,
        match_as: &str,
        mut location: Location,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let params = location.params.clone().unwrap_or_default();
        let aliased_path = CompiledPattern::compile(match_as, PatternOptions::default())
            .and_then(|pattern| pattern.fill(&params))
            .map_err(|source| MatchError::MissingParam {
                route: format!("aliased route with path \"{}\"", record.path()),
                source,
            })?;

        let aliased = self.match_in(
            table,
            &Location::path(aliased_path).mark_normalized(),
            None,
            None,
            depth,
        )?;

        match aliased.matched.last() {
            Some(canonical) => {
                location.params = Some(aliased.params.clone());
                let canonical = Arc::clone(canonical);
                self.resolve_record(table, Some(&canonical), location, redirected_from, depth)
            }
            None => Ok(self.create_route(None, &location, redirected_from)),
        }
    }

    fn create_route(
        &self,
        record: Option<&Arc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
    ) -> Route {
        Route::create(record, location, redirected_from, self.query_stringifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryValue;
    use crate::record::Redirect;
    use pretty_assertions::assert_eq;

    fn matcher(routes: Vec<RouteConfig>) -> Matcher {
        Matcher::from_routes(routes, TableOptions::default()).unwrap()
    }

    fn matched_paths(route: &Route) -> Vec<String> {
        route.matched.iter().map(|r| r.path().to_string()).collect()
    }

    #[test]
    fn test_first_match_wins() {
        let m = matcher(vec![
            RouteConfig::new("/users/new").with_name("new-user"),
            RouteConfig::new("/users/:id").with_name("user"),
        ]);
        let route = m.match_location(&"/users/new".into(), None, None).unwrap();
        assert_eq!(route.name.as_deref(), Some("new-user"));
        assert!(route.params.is_empty());
    }

    #[test]
    fn test_unmatched_path_has_no_records() {
        let m = matcher(vec![RouteConfig::new("/a")]);
        let route = m.match_location(&"/nope#x".into(), None, None).unwrap();
        assert!(route.matched.is_empty());
        assert_eq!(route.full_path, "/nope#x");
    }

    #[test]
    fn test_wildcard_captures_path_match() {
        let m = matcher(vec![RouteConfig::new("/a"), RouteConfig::new("*").with_name("404")]);
        let route = m.match_location(&"/missing/page".into(), None, None).unwrap();
        assert_eq!(route.name.as_deref(), Some("404"));
        assert_eq!(route.params["pathMatch"], "/missing/page");
    }

    #[test]
    fn test_named_fills_params_from_current() {
        let m = matcher(vec![
            RouteConfig::new("/user/:id/:tab?").with_name("user"),
            RouteConfig::new("/user/:id/settings").with_name("settings"),
        ]);
        let current = m.match_location(&"/user/5/posts".into(), None, None).unwrap();

        let route = m
            .match_location(&Location::named("settings"), Some(&current), None)
            .unwrap();
        assert_eq!(route.path, "/user/5/settings");

        // optional params are not carried over
        let route = m
            .match_location(&Location::named("user").with_param("id", "6"), Some(&current), None)
            .unwrap();
        assert_eq!(route.path, "/user/6");
    }

    #[test]
    fn test_named_missing_param_is_error() {
        let m = matcher(vec![RouteConfig::new("/user/:id").with_name("user")]);
        let err = m.match_location(&Location::named("user"), None, None).unwrap_err();
        assert!(matches!(err, MatchError::MissingParam { .. }));
    }

    #[test]
    fn test_unknown_name_resolves_empty() {
        let m = matcher(vec![]);
        let route = m.match_location(&Location::named("ghost"), None, None).unwrap();
        assert!(route.matched.is_empty());
        assert_eq!(route.name.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_alias_matches_canonical_records() {
        let m = matcher(vec![RouteConfig::new("/a")
            .with_alias("/c")
            .with_child(RouteConfig::new("b"))]);

        let route = m.match_location(&"/c/b".into(), None, None).unwrap();
        assert_eq!(route.path, "/c/b");
        assert_eq!(matched_paths(&route), vec!["/a", "/a/b"]);
    }

    #[test]
    fn test_alias_with_params() {
        let m = matcher(vec![RouteConfig::new("/users/:id").with_alias("/u/:id")]);
        let route = m.match_location(&"/u/9".into(), None, None).unwrap();
        assert_eq!(route.params["id"], "9");
        assert_eq!(matched_paths(&route), vec!["/users/:id"]);
    }

    #[test]
    fn test_static_redirect_keeps_query() {
        let m = matcher(vec![
            RouteConfig::new("/old").with_redirect("/new"),
            RouteConfig::new("/new").with_name("new"),
        ]);
        let route = m.match_location(&"/old?x=1".into(), None, None).unwrap();
        assert_eq!(route.name.as_deref(), Some("new"));
        assert_eq!(route.full_path, "/new?x=1");
        assert_eq!(route.redirected_from.as_deref(), Some("/old?x=1"));
    }

    #[test]
    fn test_relative_redirect_fills_params() {
        let m = matcher(vec![RouteConfig::new("/users/:id")
            .with_child(RouteConfig::new("profile").with_redirect("details"))
            .with_child(RouteConfig::new("details").with_name("details"))]);

        let route = m.match_location(&"/users/3/profile".into(), None, None).unwrap();
        assert_eq!(route.name.as_deref(), Some("details"));
        assert_eq!(route.path, "/users/3/details");
        assert_eq!(route.params["id"], "3");
    }

    #[test]
    fn test_named_and_dynamic_redirects() {
        let m = matcher(vec![
            RouteConfig::new("/home").with_name("home"),
            RouteConfig::new("/start").with_redirect(Location::named("home")),
            RouteConfig::new("/search/:q").with_redirect(Redirect::dynamic(|route| {
                Location::path("/home").with_query("q", route.params["q"].clone())
            })),
        ]);

        let route = m.match_location(&"/start".into(), None, None).unwrap();
        assert_eq!(route.path, "/home");

        let route = m.match_location(&"/search/rust".into(), None, None).unwrap();
        assert_eq!(route.path, "/home");
        assert_eq!(route.query["q"], QueryValue::from("rust"));
    }

    #[test]
    fn test_redirect_loop_is_error() {
        let m = matcher(vec![
            RouteConfig::new("/ping").with_redirect("/pong"),
            RouteConfig::new("/pong").with_redirect("/ping"),
        ]);
        let err = m.match_location(&"/ping".into(), None, None).unwrap_err();
        assert_eq!(
            err,
            MatchError::RedirectLoop {
                path: "/ping".to_string(),
                limit: MAX_REDIRECTS
            }
        );
    }

    #[test]
    fn test_redirect_to_unknown_name_is_error() {
        let m = matcher(vec![RouteConfig::new("/x").with_redirect(Location::named("nope"))]);
        let err = m.match_location(&"/x".into(), None, None).unwrap_err();
        assert!(matches!(err, MatchError::InvalidRedirect { .. }));
    }

    #[test]
    fn test_add_route_to_named_parent() {
        let m = matcher(vec![RouteConfig::new("/admin").with_name("admin")]);
        m.add_route_to("admin", RouteConfig::new("users").with_name("admin-users"))
            .unwrap();
        assert!(m.has_route("admin-users"));

        let route = m.match_location(&"/admin/users".into(), None, None).unwrap();
        assert_eq!(matched_paths(&route), vec!["/admin", "/admin/users"]);

        assert!(matches!(
            m.add_route_to("missing", RouteConfig::new("x")),
            Err(TableError::UnknownParent(_))
        ));
    }

    #[test]
    fn test_custom_query_stringifier() {
        let m = matcher(vec![RouteConfig::new("/q")])
            .with_query_stringifier(Arc::new(|query: &crate::query::Query| format!("?n={}", query.len())));
        let route = m.match_location(&"/q?a=1&b=2".into(), None, None).unwrap();
        assert_eq!(route.full_path, "/q?n=2");
    }
}
