/// Route table builder
///
/// Flattens nested [`RouteConfig`]s into:
/// - `path_list`: record paths in match priority order (children before their
///   parent, `*` last)
/// - `path_map`: path → record (first registration wins)
/// - `name_map`: name → record (first registration wins)
///
/// ```text
/// /a (alias /c)                 path_list
///   └─ b              ──→       /a/b, /a, /c/b, /c
///                               /c/b matches as /a/b, /c matches as /a
/// ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::component::ViewSlots;
use crate::config::RouteConfig;
use crate::error::TableError;
use crate::path::clean_path;
use crate::pattern::{CompiledPattern, PatternOptions};
use crate::record::{RecordParts, RouteRecord};

/// Build-wide switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Fail on configuration mistakes instead of skipping the route
    pub debug: bool,
    /// Default case sensitivity for routes that do not set it
    pub case_sensitive: bool,
    /// Default trailing-slash strictness for routes that do not set it
    pub strict: bool,
}

/// A non-fatal configuration problem found while building
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableWarning {
    DuplicateParams { path: String, params: Vec<String> },
    DuplicateName { name: String, path: String },
    SelfAlias { path: String },
    DefaultChildOfNamedRoute { name: String },
    MissingLeadingSlash { path: String },
    NonAsciiPath { path: String },
}

impl fmt::Display for TableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableWarning::DuplicateParams { path, params } => write!(
                f,
                "Duplicate param keys in route with path \"{}\": {}",
                path,
                params.join(", ")
            ),
            TableWarning::DuplicateName { name, path } => write!(
                f,
                "Duplicate named routes definition: {{ name: \"{}\", path: \"{}\" }}",
                name, path
            ),
            TableWarning::SelfAlias { path } => write!(
                f,
                "Found an alias with the same value as the path: \"{}\"",
                path
            ),
            TableWarning::DefaultChildOfNamedRoute { name } => write!(
                f,
                "Named Route '{}' has a default child route. Navigating to it by name will not render the default child",
                name
            ),
            TableWarning::MissingLeadingSlash { path } => write!(
                f,
                "Non-nested routes must include a leading slash character: \"{}\"",
                path
            ),
            TableWarning::NonAsciiPath { path } => write!(
                f,
                "Route with path \"{}\" contains unencoded characters, make sure your path is correctly encoded",
                path
            ),
        }
    }
}

/// Flattened, priority-ordered route lookup table
#[derive(Debug, Default)]
pub struct RouteTable {
    path_list: Vec<String>,
    path_map: HashMap<String, Arc<RouteRecord>>,
    name_map: HashMap<String, Arc<RouteRecord>>,
    /// Every record ever created; keeps weak parent links alive
    records: Vec<Arc<RouteRecord>>,
    warnings: Vec<TableWarning>,
}

impl RouteTable {
    /// Builds a table from route definitions
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::config::RouteConfig;
    /// use rhtmx_navigator::table::{RouteTable, TableOptions};
    ///
    /// let table = RouteTable::build(
    ///     vec![
    ///         RouteConfig::new("*"),
    ///         RouteConfig::new("/a").with_child(RouteConfig::new("b")),
    ///     ],
    ///     &TableOptions::default(),
    /// ).unwrap();
    /// assert_eq!(table.path_list(), &["/a/b", "/a", "*"]);
    /// ```
    pub fn build(configs: Vec<RouteConfig>, options: &TableOptions) -> Result<Self, TableError> {
        let mut table = Self::default();
        table.add_routes(configs, None, options)?;
        Ok(table)
    }

    /// Appends routes, optionally as children of `parent`
    ///
    /// When `parent` has aliases, the routes are also registered below each
    /// alias so they are reachable through it.
    pub fn add_routes(
        &mut self,
        configs: Vec<RouteConfig>,
        parent: Option<&Arc<RouteRecord>>,
        options: &TableOptions,
    ) -> Result<(), TableError> {
        let alias_parents: Vec<Arc<RouteRecord>> = parent
            .map(|parent| self.alias_records_of(parent))
            .unwrap_or_default();

        for config in &configs {
            self.add_record(config, parent, None, None, options)?;

            for alias_parent in &alias_parents {
                let match_as = alias_parent
                    .match_as()
                    .map(|base| child_match_as(base, config));
                self.add_record(config, Some(alias_parent), match_as, None, options)?;
            }
        }

        self.finish();
        Ok(())
    }

    /// Record paths in match priority order
    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    pub fn record_for_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
        self.path_map.get(path)
    }

    pub fn record_for_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.name_map.get(name)
    }

    /// Registered records in match priority order
    pub fn records(&self) -> Vec<Arc<RouteRecord>> {
        self.path_list
            .iter()
            .filter_map(|path| self.path_map.get(path).cloned())
            .collect()
    }

    pub fn warnings(&self) -> &[TableWarning] {
        &self.warnings
    }

    fn warn(&mut self, warning: TableWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Records created for `parent`'s aliases (same parent, matching as `parent`)
    fn alias_records_of(&self, parent: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
        let canonical = canonical_match_as(parent.path());
        self.records
            .iter()
            .filter(|record| {
                record.match_as() == Some(canonical.as_str())
                    && parent.alias().iter().any(|alias| {
                        alias_path_matches(record.path(), alias, parent.parent().as_ref())
                    })
            })
            .cloned()
            .collect()
    }

    fn add_record(
        &mut self,
        config: &RouteConfig,
        parent: Option<&Arc<RouteRecord>>,
        match_as: Option<String>,
        shared_components: Option<Arc<ViewSlots>>,
        options: &TableOptions,
    ) -> Result<(), TableError> {
        let Some(raw_path) = config.path.as_deref() else {
            if options.debug {
                return Err(TableError::MissingPath);
            }
            tracing::debug!(name = ?config.name, "Skipping route without a path");
            return Ok(());
        };

        if !raw_path.is_ascii() {
            self.warn(TableWarning::NonAsciiPath {
                path: raw_path.to_string(),
            });
        }

        let pattern_options = PatternOptions {
            sensitive: config.case_sensitive.unwrap_or(options.case_sensitive),
            strict: config.strict.unwrap_or(options.strict),
        };
        let path = normalize_path(raw_path, parent.map(|p| p.path()), pattern_options.strict);
        let pattern = CompiledPattern::compile(&path, pattern_options)?;

        let duplicates = pattern.duplicate_keys();
        if !duplicates.is_empty() {
            let params = duplicates.into_iter().map(str::to_string).collect();
            self.warn(TableWarning::DuplicateParams {
                path: path.clone(),
                params,
            });
        }

        let components = shared_components
            .unwrap_or_else(|| Arc::new(ViewSlots::new(config.components.clone())));

        let record = RouteRecord::new(RecordParts {
            path: path.clone(),
            pattern,
            components: Arc::clone(&components),
            alias: config.alias.clone(),
            name: config.name.clone(),
            parent: parent.map(Arc::downgrade),
            match_as: match_as.clone(),
            redirect: config.redirect.clone(),
            before_enter: config.before_enter.clone(),
            meta: config.meta.clone(),
            props: config.props.clone(),
        });
        self.records.push(Arc::clone(&record));

        if !config.children.is_empty() {
            if let (Some(name), None) = (&config.name, &config.redirect) {
                let has_default_child = config
                    .children
                    .iter()
                    .any(|child| matches!(child.path.as_deref(), Some("") | Some("/")));
                if has_default_child {
                    self.warn(TableWarning::DefaultChildOfNamedRoute { name: name.clone() });
                }
            }

            for child in &config.children {
                let child_match_as = match_as.as_deref().map(|base| child_match_as(base, child));
                self.add_record(child, Some(&record), child_match_as, None, options)?;
            }
        }

        if !self.path_map.contains_key(path.as_str()) {
            self.path_list.push(path.clone());
            self.path_map.insert(path.clone(), Arc::clone(&record));
        }

        for alias in &config.alias {
            if alias == raw_path {
                self.warn(TableWarning::SelfAlias { path: raw_path.to_string() });
                continue;
            }

            let alias_config = RouteConfig {
                path: Some(alias.clone()),
                children: config.children.clone(),
                case_sensitive: config.case_sensitive,
                strict: config.strict,
                ..Default::default()
            };
            self.add_record(
                &alias_config,
                parent,
                Some(canonical_match_as(&path)),
                Some(Arc::clone(&components)),
                options,
            )?;
        }

        if let Some(name) = &config.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), Arc::clone(&record));
            } else if match_as.is_none() {
                self.warn(TableWarning::DuplicateName {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }

        Ok(())
    }

    /// Moves wildcards to the end and checks for relative top-level paths
    fn finish(&mut self) {
        let (mut ordered, wildcards): (Vec<String>, Vec<String>) =
            std::mem::take(&mut self.path_list)
                .into_iter()
                .partition(|path| path != "*");
        ordered.extend(wildcards);
        self.path_list = ordered;

        let relative: Vec<String> = self
            .path_list
            .iter()
            .filter(|path| !path.is_empty() && !path.starts_with('*') && !path.starts_with('/'))
            .cloned()
            .collect();
        for path in relative {
            let warning = TableWarning::MissingLeadingSlash { path };
            if !self.warnings.contains(&warning) {
                self.warn(warning);
            }
        }
    }
}

/// Absolute record path for `path` below `parent`
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::table::normalize_path;
///
/// assert_eq!(normalize_path("b/", Some("/a"), false), "/a/b");
/// assert_eq!(normalize_path("/x", Some("/a"), false), "/x");
/// assert_eq!(normalize_path("/", None, false), "");
/// assert_eq!(normalize_path("/", None, true), "/");
/// ```
pub fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };

    match parent {
        _ if path.starts_with('/') => path.to_string(),
        None => path.to_string(),
        Some(parent) => clean_path(&format!("{}/{}", parent, path)).into_owned(),
    }
}

/// `match_as` target of an alias of the record at `path`
fn canonical_match_as(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn child_match_as(base: &str, child: &RouteConfig) -> String {
    let child_path = child.path.as_deref().unwrap_or_default();
    clean_path(&format!("{}/{}", base, child_path)).into_owned()
}

fn alias_path_matches(record_path: &str, alias: &str, grand_parent: Option<&Arc<RouteRecord>>) -> bool {
    normalize_path(alias, grand_parent.map(|p| p.path()), false) == record_path
        || normalize_path(alias, grand_parent.map(|p| p.path()), true) == record_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(configs: Vec<RouteConfig>) -> RouteTable {
        RouteTable::build(configs, &TableOptions::default()).unwrap()
    }

    #[test]
    fn test_children_registered_before_parent() {
        let table = build(vec![RouteConfig::new("/a")
            .with_child(RouteConfig::new("b"))
            .with_child(RouteConfig::new("/abs"))]);
        assert_eq!(table.path_list(), &["/a/b", "/abs", "/a"]);

        let child = table.record_for_path("/a/b").unwrap();
        assert_eq!(child.parent().unwrap().path(), "/a");
    }

    #[test]
    fn test_first_registration_wins() {
        let table = build(vec![
            RouteConfig::new("/dup").with_meta("order", "first"),
            RouteConfig::new("/dup/").with_meta("order", "second"),
        ]);
        assert_eq!(table.path_list(), &["/dup"]);
        assert_eq!(table.record_for_path("/dup").unwrap().meta()["order"], "first");
    }

    #[test]
    fn test_wildcards_move_to_end_stably() {
        let table = build(vec![
            RouteConfig::new("*").with_name("catch-all"),
            RouteConfig::new("/a"),
            RouteConfig::new("/b/*"),
            RouteConfig::new("/c"),
        ]);
        assert_eq!(table.path_list(), &["/a", "/b/*", "/c", "*"]);
    }

    #[test]
    fn test_alias_records() {
        let table = build(vec![RouteConfig::new("/a")
            .with_alias("/c")
            .with_child(RouteConfig::new("b"))]);

        assert_eq!(table.path_list(), &["/a/b", "/a", "/c/b", "/c"]);
        assert_eq!(table.record_for_path("/c").unwrap().match_as(), Some("/a"));
        assert_eq!(table.record_for_path("/c/b").unwrap().match_as(), Some("/a/b"));
        assert!(Arc::ptr_eq(
            table.record_for_path("/c").unwrap().components(),
            table.record_for_path("/a").unwrap().components()
        ));
    }

    #[test]
    fn test_self_alias_warns() {
        let table = build(vec![RouteConfig::new("/a").with_alias("/a")]);
        assert_eq!(table.path_list(), &["/a"]);
        assert_eq!(
            table.warnings(),
            &[TableWarning::SelfAlias { path: "/a".to_string() }]
        );
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let table = build(vec![
            RouteConfig::new("/one").with_name("page"),
            RouteConfig::new("/two").with_name("page"),
        ]);
        assert_eq!(table.record_for_name("page").unwrap().path(), "/one");
        assert_eq!(
            table.warnings(),
            &[TableWarning::DuplicateName {
                name: "page".to_string(),
                path: "/two".to_string()
            }]
        );
    }

    #[test]
    fn test_named_alias_does_not_warn_duplicate() {
        let table = build(vec![RouteConfig::new("/a").with_name("a").with_alias("/b")]);
        assert!(table.warnings().is_empty());
        assert_eq!(table.record_for_name("a").unwrap().path(), "/a");
    }

    #[test]
    fn test_missing_path() {
        let configs = vec![RouteConfig::default(), RouteConfig::new("/ok")];
        let table = RouteTable::build(configs.clone(), &TableOptions::default()).unwrap();
        assert_eq!(table.path_list(), &["/ok"]);

        let strict = TableOptions {
            debug: true,
            ..Default::default()
        };
        assert!(matches!(
            RouteTable::build(configs, &strict),
            Err(TableError::MissingPath)
        ));
    }

    #[test]
    fn test_configuration_warnings() {
        let table = build(vec![
            RouteConfig::new("relative"),
            RouteConfig::new("/café"),
            RouteConfig::new("/:id/x/:id"),
            RouteConfig::new("/parent")
                .with_name("parent")
                .with_child(RouteConfig::new("")),
        ]);

        let warnings = table.warnings();
        assert!(warnings.contains(&TableWarning::MissingLeadingSlash {
            path: "relative".to_string()
        }));
        assert!(warnings.contains(&TableWarning::NonAsciiPath {
            path: "/café".to_string()
        }));
        assert!(warnings.contains(&TableWarning::DuplicateParams {
            path: "/:id/x/:id".to_string(),
            params: vec!["id".to_string()]
        }));
        assert!(warnings.contains(&TableWarning::DefaultChildOfNamedRoute {
            name: "parent".to_string()
        }));
    }

    #[test]
    fn test_add_routes_under_parent_and_its_alias() {
        let mut table = build(vec![RouteConfig::new("/a").with_name("a").with_alias("/c")]);
        let parent = table.record_for_name("a").cloned().unwrap();

        table
            .add_routes(vec![RouteConfig::new("new")], Some(&parent), &TableOptions::default())
            .unwrap();

        let child = table.record_for_path("/a/new").unwrap();
        assert_eq!(child.parent().unwrap().id(), parent.id());
        let aliased = table.record_for_path("/c/new").unwrap();
        assert_eq!(aliased.match_as(), Some("/a/new"));
    }

    #[test]
    fn test_root_path_normalizes_to_empty() {
        let table = build(vec![RouteConfig::new("/")]);
        assert_eq!(table.path_list(), &[""]);
        assert!(table.record_for_path("").unwrap().pattern().is_match("/"));
    }
}
