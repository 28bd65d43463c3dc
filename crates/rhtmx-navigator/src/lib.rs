//! # RHTMX Navigator
//!
//! A client-side navigation engine with support for:
//! - Nested routes (`/users/:id` → `posts`)
//! - Dynamic parameters (`/users/:id`, `/files/:path+`, `/posts/:id?`)
//! - Custom parameter patterns (`/order/:id(\\d+)`)
//! - Catch-all routes (`*`, `/docs/*`)
//! - Aliases, named routes and config redirects
//! - Async, cancellable navigation guards
//!
//! ## Navigation Pipeline
//!
//! Every navigation runs the same sequence of guards, each one awaited before
//! the next:
//! - leave guards of the views being left (innermost first)
//! - global `before_each` hooks
//! - update guards of views that stay (outermost first)
//! - `before_enter` of entered routes, then lazy component loading
//! - enter guards of entered views, then global `before_resolve` hooks
//!
//! A guard can proceed, abort, redirect or fail. Starting a new navigation
//! cancels the one in flight at its next guard boundary.
//!
//! ## Failures vs Errors
//!
//! - **Failures** (`Duplicated`, `Cancelled`, `Aborted`, `Redirected`) are
//!   returned to the caller only
//! - **Errors** (guard errors, unknown params, lazy load failures) also go to
//!   every `on_error` callback, or to `tracing::error!` when there is none
//!
//! ## Example
//!
//! ```
//! use rhtmx_navigator::{guard_fn, Navigator, Next, RouteConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let navigator = Navigator::builder()
//!     .route(RouteConfig::new("/").with_name("home"))
//!     .route(RouteConfig::new("/login").with_name("login"))
//!     .route(RouteConfig::new("/admin").with_meta("auth", "required"))
//!     .build()
//!     .unwrap();
//!
//! navigator.before_each(guard_fn(|to, _from| async move {
//!     if to.meta.get("auth").map(String::as_str) == Some("required") {
//!         Next::redirect("/login")
//!     } else {
//!         Next::Proceed
//!     }
//! }));
//!
//! navigator.start().await.unwrap();
//! let result = navigator.push("/admin").await;
//! assert!(result.is_err());
//! assert_eq!(navigator.current().path, "/login");
//! # });
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod component;
pub mod config;
pub mod error;
pub mod guard;
pub mod history;
pub mod location;
pub mod matcher;
pub mod navigator;
pub mod path;
pub mod pattern;
pub mod query;
pub mod queue;
pub mod record;
pub mod route;
pub mod table;

// Re-export public types
pub use component::{Component, ComponentDef, LazyComponent, View, ViewComponent, ViewInstance, DEFAULT_VIEW};
pub use config::{NavigatorConfig, RouteConfig};
pub use error::{FailureKind, MatchError, NavigationError, NavigationFailure, TableError};
pub use guard::{guard_fn, instance_guard_fn, InstanceGuard, NavigationGuard, Next};
pub use history::{HistoryBackend, MemoryHistory};
pub use location::Location;
pub use navigator::{HookId, NavigationKind, Navigator, NavigatorBuilder, Resolved};
pub use pattern::Params;
pub use query::{Query, QueryValue};
pub use record::{PropsConfig, Redirect, RecordId, RouteRecord};
pub use route::Route;
