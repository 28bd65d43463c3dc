//! Integration tests for route tables and matching
//!
//! Covers:
//! - Path list ordering and uniqueness
//! - Nested, aliased and wildcard routes
//! - Params, queries and hashes through the matcher
//! - Config redirects

use pretty_assertions::assert_eq;
use rhtmx_navigator::matcher::Matcher;
use rhtmx_navigator::table::{RouteTable, TableOptions};
use rhtmx_navigator::*;
use rstest::rstest;

fn app_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("*").with_name("not-found"),
        RouteConfig::new("/").with_name("home"),
        RouteConfig::new("/docs/*"),
        RouteConfig::new("/users")
            .with_name("users")
            .with_alias("/people")
            .with_child(RouteConfig::new(":id").with_name("user"))
            .with_child(RouteConfig::new(":id/posts/:post(\\d+)").with_name("post")),
        RouteConfig::new("/files/:path+"),
        RouteConfig::new("/search/:term?"),
        RouteConfig::new("/users").with_name("shadowed"),
    ]
}

fn matcher() -> Matcher {
    Matcher::from_routes(app_routes(), TableOptions::default()).unwrap()
}

fn resolve(matcher: &Matcher, to: impl Into<Location>) -> Route {
    matcher.match_location(&to.into(), None, None).unwrap()
}

// ============================================================================
// Route table
// ============================================================================

#[test]
fn test_path_list_has_no_duplicates() {
    let table = RouteTable::build(app_routes(), &TableOptions::default()).unwrap();
    let mut seen = std::collections::HashSet::new();
    for path in table.path_list() {
        assert!(seen.insert(path.clone()), "duplicate path {}", path);
    }
    assert_eq!(table.record_for_path("/users").unwrap().name(), Some("users"));
}

#[test]
fn test_wildcard_sorts_last() {
    let table = RouteTable::build(app_routes(), &TableOptions::default()).unwrap();
    let paths = table.path_list();
    assert_eq!(paths.last().map(String::as_str), Some("*"));
    assert_eq!(paths.iter().filter(|p| p.as_str() == "*").count(), 1);

    // children precede their parent
    let child = paths.iter().position(|p| p == "/users/:id").unwrap();
    let parent = paths.iter().position(|p| p == "/users").unwrap();
    assert!(child < parent);
}

#[test]
fn test_alias_records_mirror_children() {
    let table = RouteTable::build(app_routes(), &TableOptions::default()).unwrap();
    let alias = table.record_for_path("/people/:id").unwrap();
    assert_eq!(alias.match_as(), Some("/users/:id"));
    assert!(table.record_for_path("/people").is_some());
}

// ============================================================================
// Matching
// ============================================================================

#[rstest]
#[case("/", Some("home"), vec![""])]
#[case("/users", Some("users"), vec!["/users"])]
#[case("/users/7", Some("user"), vec!["/users", "/users/:id"])]
#[case("/users/7/posts/3", Some("post"), vec!["/users", "/users/:id/posts/:post(\\d+)"])]
#[case("/users/7/posts/abc", Some("not-found"), vec!["*"])]
#[case("/nowhere", Some("not-found"), vec!["*"])]
fn test_match_records(
    #[case] path: &str,
    #[case] name: Option<&str>,
    #[case] matched: Vec<&str>,
) {
    let route = resolve(&matcher(), path);
    assert_eq!(route.name.as_deref(), name);
    let paths: Vec<&str> = route.matched.iter().map(|r| r.path()).collect();
    assert_eq!(paths, matched);
}

#[test]
fn test_params_are_extracted() {
    let matcher = matcher();

    let route = resolve(&matcher, "/files/a/b/c.txt");
    assert_eq!(route.params["path"], "a/b/c.txt");

    let route = resolve(&matcher, "/search");
    assert!(route.params.get("term").map_or(true, |t| t.is_empty()));

    let route = resolve(&matcher, "/docs/guide/intro");
    assert_eq!(route.params["pathMatch"], "guide/intro");

    let route = resolve(&matcher, "/nowhere/else");
    assert_eq!(route.params["pathMatch"], "/nowhere/else");
}

#[test]
fn test_query_and_hash_survive_matching() {
    let route = resolve(&matcher(), "/users/7?tab=posts&tag=a&tag=b#latest");
    assert_eq!(route.path, "/users/7");
    assert_eq!(route.hash, "#latest");
    assert_eq!(route.query["tab"], QueryValue::from("posts"));
    assert_eq!(
        route.query["tag"],
        QueryValue::List(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(route.full_path, "/users/7?tab=posts&tag=a&tag=b#latest");
}

#[test]
fn test_alias_resolves_to_canonical_records() {
    let route = resolve(&matcher(), "/people/42");
    assert_eq!(route.path, "/people/42");
    assert_eq!(route.name.as_deref(), Some("user"));
    assert_eq!(route.params["id"], "42");
    let paths: Vec<&str> = route.matched.iter().map(|r| r.path()).collect();
    assert_eq!(paths, vec!["/users", "/users/:id"]);
}

#[test]
fn test_named_location_builds_path() {
    let route = resolve(
        &matcher(),
        Location::named("post")
            .with_param("id", "9")
            .with_param("post", "12")
            .with_query("draft", QueryValue::Null),
    );
    assert_eq!(route.full_path, "/users/9/posts/12?draft");
}

#[test]
fn test_named_location_rejects_invalid_param() {
    let err = matcher()
        .match_location(
            &Location::named("post").with_param("id", "9").with_param("post", "twelve"),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, MatchError::MissingParam { .. }));
}

#[test]
fn test_relative_params_resolve_against_current() {
    let matcher = Matcher::from_routes(vec![RouteConfig::new("/item/:id")], TableOptions::default()).unwrap();
    let current = resolve(&matcher, "/item/1");

    let next = matcher
        .match_location(&Location::default().with_param("id", "2"), Some(&current), None)
        .unwrap();
    assert_eq!(next.path, "/item/2");
}

#[test]
fn test_redirect_chain() {
    let matcher = Matcher::from_routes(
        vec![
            RouteConfig::new("/v1/:id").with_redirect("/v2/:id"),
            RouteConfig::new("/v2/:id").with_redirect(Location::named("v3")),
            RouteConfig::new("/v3/:id").with_name("v3"),
        ],
        TableOptions::default(),
    )
    .unwrap();

    let route = resolve(&matcher, "/v1/8#top");
    assert_eq!(route.full_path, "/v3/8#top");
    assert_eq!(route.redirected_from.as_deref(), Some("/v1/8#top"));
}

#[test]
fn test_case_and_strict_options() {
    let matcher = Matcher::from_routes(
        vec![
            RouteConfig::new("/Exact").with_case_sensitive(true).with_strict(true),
            RouteConfig::new("/loose"),
        ],
        TableOptions::default(),
    )
    .unwrap();

    assert_eq!(resolve(&matcher, "/Exact").matched.len(), 1);
    assert!(resolve(&matcher, "/exact").matched.is_empty());
    assert!(resolve(&matcher, "/Exact/").matched.is_empty());
    assert_eq!(resolve(&matcher, "/LOOSE/").matched.len(), 1);
}
