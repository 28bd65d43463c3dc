/// Transition engine
///
/// Drives a navigation from request to commit:
///
/// ```text
/// push("/b")
///   → match              (Matcher)
///   → duplicate check
///   → resolve_queue      (updated / activated / deactivated records)
///   → leave guards → before hooks → update guards → before_enter → lazy components
///   → enter guards → resolve hooks
///   → commit             (current route, URL, after hooks, ready callbacks)
/// ```
///
/// Only one navigation is pending at a time. Starting a new one supersedes
/// the previous: it notices at its next guard boundary and settles as
/// `Cancelled`.

use std::any::Any;
use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::{NavigatorConfig, RouteConfig};
use crate::error::{FailureKind, NavigationError, NavigationFailure, TableError};
use crate::guard::{
    extract_enter_guards, extract_leave_guards, extract_update_guards, NavigationGuard, Next,
    ResolveComponents,
};
use crate::history::{HistoryBackend, MemoryHistory};
use crate::location::{normalize_location, Location};
use crate::matcher::Matcher;
use crate::path::{clean_path, strip_base};
use crate::query::{QueryParser, QueryStringifier};
use crate::queue::run_queue;
use crate::record::{lock, RouteRecord};
use crate::route::Route;
use crate::table::TableOptions;

type ReadyCallback = Box<dyn FnOnce(&Route) + Send>;
type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError) + Send>;
type ErrorCallback = Arc<dyn Fn(&NavigationError) + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Route, &Route) + Send + Sync>;
type Listener = Arc<dyn Fn(&Route) + Send + Sync>;

/// How a navigation writes the URL on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// New history entry
    Push,
    /// Overwrite the current entry
    Replace,
    /// The backend already moved (back/forward)
    Pop,
    /// First navigation from the backend's location
    Initial,
}

/// Handle returned by hook registration, used to remove the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Result of [`Navigator::resolve`]
#[derive(Debug, Clone)]
pub struct Resolved {
    pub location: Location,
    pub route: Route,
    /// URL including the base path
    pub href: String,
}

/// Records partitioned by a navigation
#[derive(Debug, Clone)]
pub struct QueueDiff {
    /// Shared prefix, reused by the next route
    pub updated: Vec<Arc<RouteRecord>>,
    /// Entered by the next route
    pub activated: Vec<Arc<RouteRecord>>,
    /// Left by the current route
    pub deactivated: Vec<Arc<RouteRecord>>,
}

/// Splits two matched chains at their longest common identity prefix
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::config::RouteConfig;
/// use rhtmx_navigator::navigator::resolve_queue;
/// use rhtmx_navigator::route::format_match;
/// use rhtmx_navigator::table::{RouteTable, TableOptions};
///
/// let table = RouteTable::build(
///     vec![RouteConfig::new("/a")
///         .with_child(RouteConfig::new("b"))
///         .with_child(RouteConfig::new("c"))],
///     &TableOptions::default(),
/// ).unwrap();
/// let from = format_match(table.record_for_path("/a/b").unwrap());
/// let to = format_match(table.record_for_path("/a/c").unwrap());
///
/// let diff = resolve_queue(&from, &to);
/// assert_eq!(diff.updated.len(), 1);
/// assert_eq!(diff.activated[0].path(), "/a/c");
/// assert_eq!(diff.deactivated[0].path(), "/a/b");
/// ```
pub fn resolve_queue(current: &[Arc<RouteRecord>], next: &[Arc<RouteRecord>]) -> QueueDiff {
    let shared = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| a.id() == b.id())
        .count();

    QueueDiff {
        updated: next[..shared].to_vec(),
        activated: next[shared..].to_vec(),
        deactivated: current[shared..].to_vec(),
    }
}

/// Why a confirmation stopped
struct Abort {
    error: NavigationError,
    /// Follow-up navigation requested by a guard
    redirect: Option<Location>,
}

impl Abort {
    fn failure(failure: NavigationFailure) -> Self {
        Self {
            error: failure.into(),
            redirect: None,
        }
    }
}

struct Hooks<T> {
    entries: Vec<(HookId, T)>,
}

impl<T: Clone> Hooks<T> {
    fn snapshot(&self) -> Vec<T> {
        self.entries.iter().map(|(_, hook)| hook.clone()).collect()
    }

    fn remove(&mut self, id: HookId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }
}

struct State {
    current: Route,
    /// Ticket and target of the navigation in flight
    pending: Option<(u64, Route)>,
    ready: bool,
    ready_cbs: Vec<ReadyCallback>,
    ready_error_cbs: Vec<ReadyErrorCallback>,
    listener: Option<Listener>,
    error_cbs: Hooks<ErrorCallback>,
    before_hooks: Hooks<Arc<dyn NavigationGuard>>,
    resolve_hooks: Hooks<Arc<dyn NavigationGuard>>,
    after_hooks: Hooks<AfterHook>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            current: Route::start(),
            pending: None,
            ready: false,
            ready_cbs: Vec::new(),
            ready_error_cbs: Vec::new(),
            listener: None,
            error_cbs: Hooks { entries: Vec::new() },
            before_hooks: Hooks { entries: Vec::new() },
            resolve_hooks: Hooks { entries: Vec::new() },
            after_hooks: Hooks { entries: Vec::new() },
        }
    }
}

struct Inner {
    matcher: Matcher,
    backend: Arc<dyn HistoryBackend>,
    config: NavigatorConfig,
    base: String,
    state: Mutex<State>,
    next_ticket: AtomicU64,
    next_hook: AtomicU64,
}

/// Builder for [`Navigator`]
#[derive(Default)]
pub struct NavigatorBuilder {
    routes: Vec<RouteConfig>,
    config: NavigatorConfig,
    backend: Option<Arc<dyn HistoryBackend>>,
    parse_query: Option<QueryParser>,
    stringify_query: Option<QueryStringifier>,
}

impl NavigatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    pub fn config(mut self, config: NavigatorConfig) -> Self {
        self.config = config;
        self
    }

    /// History backend (defaults to a [`MemoryHistory`] at the base path)
    pub fn backend(mut self, backend: Arc<dyn HistoryBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn query_parser(mut self, parser: QueryParser) -> Self {
        self.parse_query = Some(parser);
        self
    }

    pub fn query_stringifier(mut self, stringifier: QueryStringifier) -> Self {
        self.stringify_query = Some(stringifier);
        self
    }

    pub fn build(self) -> Result<Navigator, TableError> {
        let options = TableOptions {
            debug: self.config.debug,
            case_sensitive: self.config.case_sensitive,
            strict: self.config.strict,
        };

        let mut matcher = Matcher::from_routes(self.routes, options)?;
        if let Some(parser) = self.parse_query {
            matcher = matcher.with_query_parser(parser);
        }
        if let Some(stringifier) = self.stringify_query {
            matcher = matcher.with_query_stringifier(stringifier);
        }

        let base = self.config.normalized_base();
        let backend = self.backend.unwrap_or_else(|| {
            let initial = if base.is_empty() { "/".to_string() } else { base.clone() };
            Arc::new(MemoryHistory::new(initial))
        });

        Ok(Navigator {
            inner: Arc::new(Inner {
                matcher,
                backend,
                config: self.config,
                base,
                state: Mutex::new(State::default()),
                next_ticket: AtomicU64::new(1),
                next_hook: AtomicU64::new(1),
            }),
        })
    }
}

/// The navigation engine
///
/// Cheap to clone; clones share one engine.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{Navigator, RouteConfig};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let navigator = Navigator::builder()
///     .route(RouteConfig::new("/").with_name("home"))
///     .route(RouteConfig::new("/users/:id").with_name("user"))
///     .build()
///     .unwrap();
///
/// navigator.start().await.unwrap();
/// let route = navigator.push("/users/7").await.unwrap();
/// assert_eq!(route.params["id"], "7");
/// assert_eq!(navigator.current().full_path, "/users/7");
/// # });
/// ```
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Inner>,
}

impl Navigator {
    pub fn builder() -> NavigatorBuilder {
        NavigatorBuilder::new()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.inner.state)
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &Arc<dyn HistoryBackend> {
        &self.inner.backend
    }

    pub fn current(&self) -> Route {
        self.state().current.clone()
    }

    /// Target of the navigation in flight
    pub fn pending(&self) -> Option<Route> {
        self.state().pending.as_ref().map(|(_, route)| route.clone())
    }

    /// Whether the initial navigation has settled
    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigates to the backend's current location and sets up its listeners
    pub async fn start(&self) -> Result<Route, NavigationError> {
        let location = self.backend_location();
        let result = self
            .transition_to(Location::path(location), NavigationKind::Initial)
            .await;
        self.inner.backend.setup_listeners();
        result
    }

    /// Navigates to `to`, adding a history entry
    pub async fn push(&self, to: impl Into<Location>) -> Result<Route, NavigationError> {
        self.transition_to(to.into(), NavigationKind::Push).await
    }

    /// Navigates to `to`, replacing the current history entry
    pub async fn replace(&self, to: impl Into<Location>) -> Result<Route, NavigationError> {
        self.transition_to(to.into(), NavigationKind::Replace).await
    }

    /// Moves `n` entries through the history and navigates there
    ///
    /// Out-of-range moves do nothing and return the current route.
    pub async fn go(&self, n: isize) -> Result<Route, NavigationError> {
        match self.inner.backend.go(n) {
            Some(url) => self.handle_pop(&url).await,
            None => Ok(self.current()),
        }
    }

    pub async fn back(&self) -> Result<Route, NavigationError> {
        self.go(-1).await
    }

    pub async fn forward(&self) -> Result<Route, NavigationError> {
        self.go(1).await
    }

    /// Navigates after the backend changed the URL on its own (back/forward)
    pub async fn handle_pop(&self, url: &str) -> Result<Route, NavigationError> {
        let location = strip_base(url, &self.inner.base).into_owned();
        self.transition_to(Location::path(location), NavigationKind::Pop)
            .await
    }

    /// Resolves `to` without navigating
    ///
    /// `href` includes the base path and points at the requested location when
    /// the target was redirected by the route configuration.
    pub fn resolve(
        &self,
        to: impl Into<Location>,
        current: Option<&Route>,
        append: bool,
    ) -> Result<Resolved, NavigationError> {
        let current = current.cloned().unwrap_or_else(|| self.current());
        let location = normalize_location(
            &to.into(),
            Some(&current),
            append,
            self.inner.matcher.query_parser(),
        );
        let route = self
            .inner
            .matcher
            .match_location(&location, Some(&current), None)?;
        let full_path = route
            .redirected_from
            .clone()
            .unwrap_or_else(|| route.full_path.clone());

        Ok(Resolved {
            href: self.href(&full_path),
            location,
            route,
        })
    }

    /// Runs a navigation to `location`
    ///
    /// Settles with the committed route, or with the reason it did not commit.
    /// When a guard redirects, the follow-up navigation runs to completion
    /// before this one settles with [`NavigationFailure::Redirected`].
    pub fn transition_to(
        &self,
        location: Location,
        kind: NavigationKind,
    ) -> BoxFuture<'_, Result<Route, NavigationError>> {
        async move {
            let prev = self.current();

            let route = match self
                .inner
                .matcher
                .match_location(&location, Some(&prev), None)
            {
                Ok(route) => route,
                Err(err) => {
                    let err = NavigationError::Match(err);
                    self.notify_error(&err);
                    return Err(err);
                }
            };

            tracing::debug!(from = %prev.full_path, to = %route.full_path, kind = ?kind, "Navigation started");

            match self.confirm_transition(route, &prev).await {
                Ok(route) => {
                    self.commit(&route, &prev, kind);

                    // entered views mount after the commit
                    tokio::task::yield_now().await;
                    for record in &route.matched {
                        record.flush_all_entered();
                    }
                    Ok(route)
                }
                Err(Abort { error, redirect }) => {
                    self.drain_ready_errors(&error, &prev);

                    if let Some(target) = redirect {
                        let kind = if target.replace {
                            NavigationKind::Replace
                        } else {
                            NavigationKind::Push
                        };
                        if let Err(err) = self.transition_to(target, kind).await {
                            tracing::debug!(error = %err, "Redirect navigation did not complete");
                        }
                    }
                    Err(error)
                }
            }
        }
        .boxed()
    }

    async fn confirm_transition(&self, route: Route, current: &Route) -> Result<Route, Abort> {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.state().pending = Some((ticket, route.clone()));

        let same_leaf = route.leaf().map(|r| r.id()) == current.leaf().map(|r| r.id());
        if route.is_same_route(current) && route.matched.len() == current.matched.len() && same_leaf {
            self.ensure_url(false);
            if !route.hash.is_empty() {
                self.inner.backend.handle_scroll(&route, current, false);
            }
            return Err(self.abort(
                ticket,
                Abort::failure(NavigationFailure::Duplicated {
                    from: current.full_path.clone(),
                    to: route.full_path.clone(),
                }),
            ));
        }

        let diff = resolve_queue(&current.matched, &route.matched);
        let (before_hooks, resolve_hooks) = {
            let state = self.state();
            (state.before_hooks.snapshot(), state.resolve_hooks.snapshot())
        };

        let mut queue: Vec<Option<Arc<dyn NavigationGuard>>> = Vec::new();
        queue.extend(extract_leave_guards(&diff.deactivated).into_iter().map(Some));
        queue.extend(before_hooks.into_iter().map(Some));
        queue.extend(extract_update_guards(&diff.updated).into_iter().map(Some));
        queue.extend(diff.activated.iter().map(|record| record.before_enter().cloned()));
        queue.push(Some(Arc::new(ResolveComponents::new(&diff.activated))));

        let step = |guard| self.step(ticket, guard, &route, current);
        if let ControlFlow::Break(abort) = run_queue(queue, step).await {
            return Err(self.abort(ticket, abort));
        }

        let mut queue: Vec<Option<Arc<dyn NavigationGuard>>> = Vec::new();
        queue.extend(extract_enter_guards(&diff.activated).into_iter().map(Some));
        queue.extend(resolve_hooks.into_iter().map(Some));

        let step = |guard| self.step(ticket, guard, &route, current);
        if let ControlFlow::Break(abort) = run_queue(queue, step).await {
            return Err(self.abort(ticket, abort));
        }

        {
            let mut state = self.state();
            if state.pending.as_ref().map(|(id, _)| *id) == Some(ticket) {
                state.pending = None;
            } else {
                drop(state);
                return Err(self.abort(ticket, self.cancelled(current, &route)));
            }
        }

        Ok(route)
    }

    /// Runs one queued guard on behalf of navigation `ticket`
    async fn step(
        &self,
        ticket: u64,
        guard: Arc<dyn NavigationGuard>,
        to: &Route,
        from: &Route,
    ) -> ControlFlow<Abort> {
        if !self.is_pending(ticket) {
            return ControlFlow::Break(self.cancelled(from, to));
        }

        match self.run_guard(&guard, to, from).await {
            Next::Proceed | Next::Enter(_) => ControlFlow::Continue(()),
            Next::Abort => {
                self.ensure_url(true);
                ControlFlow::Break(Abort::failure(NavigationFailure::Aborted {
                    from: from.full_path.clone(),
                    to: to.full_path.clone(),
                }))
            }
            Next::Error(err) => {
                self.ensure_url(true);
                ControlFlow::Break(Abort {
                    error: NavigationError::Guard(err),
                    redirect: None,
                })
            }
            Next::Redirect(target) => ControlFlow::Break(Abort {
                error: NavigationFailure::Redirected {
                    from: from.full_path.clone(),
                    to: to.full_path.clone(),
                }
                .into(),
                redirect: Some(target),
            }),
        }
    }

    async fn run_guard(&self, guard: &Arc<dyn NavigationGuard>, to: &Route, from: &Route) -> Next {
        let checked = AssertUnwindSafe(guard.check(to, from)).catch_unwind();

        let outcome = match self.inner.config.guard_timeout_ms {
            None => checked.await,
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), checked).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Next::Error(anyhow::anyhow!(
                        "navigation guard did not settle within {}ms",
                        ms
                    ))
                }
            },
        };

        outcome.unwrap_or_else(|payload| {
            Next::Error(anyhow::anyhow!(
                "navigation guard panicked: {}",
                panic_message(payload.as_ref())
            ))
        })
    }

    fn is_pending(&self, ticket: u64) -> bool {
        self.state().pending.as_ref().map(|(id, _)| *id) == Some(ticket)
    }

    fn cancelled(&self, from: &Route, to: &Route) -> Abort {
        Abort::failure(NavigationFailure::Cancelled {
            from: from.full_path.clone(),
            to: to.full_path.clone(),
        })
    }

    /// Reports an aborted confirmation and releases the pending slot
    fn abort(&self, ticket: u64, abort: Abort) -> Abort {
        {
            let mut state = self.state();
            if state.pending.as_ref().map(|(id, _)| *id) == Some(ticket) {
                state.pending = None;
            }
        }

        match abort.error.failure() {
            Some(failure) => {
                tracing::debug!(kind = ?failure.kind(), from = failure.from(), to = failure.to(), "Navigation failed")
            }
            None => self.notify_error(&abort.error),
        }
        abort
    }

    fn commit(&self, route: &Route, prev: &Route, kind: NavigationKind) {
        self.update_route(route);

        let url = self.href(&route.full_path);
        let backend = &self.inner.backend;
        match kind {
            NavigationKind::Push => {
                backend.push_url(&url);
                backend.handle_scroll(route, prev, false);
            }
            NavigationKind::Replace => {
                backend.replace_url(&url);
                backend.handle_scroll(route, prev, false);
            }
            NavigationKind::Pop => backend.handle_scroll(route, prev, true),
            NavigationKind::Initial => {}
        }
        self.ensure_url(false);

        let after_hooks = self.state().after_hooks.snapshot();
        for hook in after_hooks {
            hook(route, prev);
        }

        let ready_cbs = {
            let mut state = self.state();
            if state.ready {
                Vec::new()
            } else {
                state.ready = true;
                state.ready_error_cbs.clear();
                std::mem::take(&mut state.ready_cbs)
            }
        };
        for callback in ready_cbs {
            callback(route);
        }

        tracing::debug!(from = %prev.full_path, to = %route.full_path, "Navigation committed");
    }

    fn update_route(&self, route: &Route) {
        let listener = {
            let mut state = self.state();
            state.current = route.clone();
            state.listener.clone()
        };
        if let Some(listener) = listener {
            listener(route);
        }
    }

    fn drain_ready_errors(&self, error: &NavigationError, prev: &Route) {
        if error.is_failure(Some(FailureKind::Redirected)) && prev.is_start() {
            return;
        }

        let callbacks = {
            let mut state = self.state();
            if state.ready {
                return;
            }
            state.ready = true;
            std::mem::take(&mut state.ready_error_cbs)
        };
        for callback in callbacks {
            callback(error);
        }
    }

    fn notify_error(&self, error: &NavigationError) {
        let callbacks = self.state().error_cbs.snapshot();
        if callbacks.is_empty() {
            tracing::error!(error = %error, "Uncaught error during route navigation");
            return;
        }
        for callback in callbacks {
            callback(error);
        }
    }

    // ========================================================================
    // URL helpers
    // ========================================================================

    /// URL for `full_path`, including the base path
    pub fn href(&self, full_path: &str) -> String {
        clean_path(&format!("{}{}", self.inner.base, full_path)).into_owned()
    }

    fn backend_location(&self) -> String {
        strip_base(&self.inner.backend.current_location(), &self.inner.base).into_owned()
    }

    fn ensure_url(&self, push: bool) {
        let current = self.state().current.full_path.clone();
        self.inner.backend.ensure_url(&self.href(&current), push);
    }

    // ========================================================================
    // Callbacks and hooks
    // ========================================================================

    fn next_hook_id(&self) -> HookId {
        HookId(self.inner.next_hook.fetch_add(1, Ordering::Relaxed))
    }

    /// Runs `callback` once the initial navigation commits (immediately if it has)
    pub fn on_ready(&self, callback: impl FnOnce(&Route) + Send + 'static) {
        let current = {
            let mut state = self.state();
            if !state.ready {
                state.ready_cbs.push(Box::new(callback));
                return;
            }
            state.current.clone()
        };
        callback(&current);
    }

    /// Runs `callback` if the initial navigation fails
    pub fn on_ready_error(&self, callback: impl FnOnce(&NavigationError) + Send + 'static) {
        let mut state = self.state();
        if !state.ready {
            state.ready_error_cbs.push(Box::new(callback));
        }
    }

    /// Registers a callback for genuine navigation errors
    pub fn on_error(&self, callback: impl Fn(&NavigationError) + Send + Sync + 'static) -> HookId {
        let id = self.next_hook_id();
        self.state().error_cbs.entries.push((id, Arc::new(callback)));
        id
    }

    /// Sets the callback invoked whenever the current route changes
    pub fn listen(&self, listener: impl Fn(&Route) + Send + Sync + 'static) {
        self.state().listener = Some(Arc::new(listener));
    }

    /// Guard run before every navigation, after leave guards
    pub fn before_each(&self, guard: Arc<dyn NavigationGuard>) -> HookId {
        let id = self.next_hook_id();
        self.state().before_hooks.entries.push((id, guard));
        id
    }

    /// Guard run after enter guards, right before commit
    pub fn before_resolve(&self, guard: Arc<dyn NavigationGuard>) -> HookId {
        let id = self.next_hook_id();
        self.state().resolve_hooks.entries.push((id, guard));
        id
    }

    /// Hook run after every committed navigation with `(to, from)`
    pub fn after_each(&self, hook: impl Fn(&Route, &Route) + Send + Sync + 'static) -> HookId {
        let id = self.next_hook_id();
        self.state().after_hooks.entries.push((id, Arc::new(hook)));
        id
    }

    /// Removes a hook or error callback; returns whether it was registered
    pub fn remove_hook(&self, id: HookId) -> bool {
        let mut state = self.state();
        state.before_hooks.remove(id)
            | state.resolve_hooks.remove(id)
            | state.after_hooks.remove(id)
            | state.error_cbs.remove(id)
    }

    // ========================================================================
    // Routes
    // ========================================================================

    pub fn add_routes(&self, routes: Vec<RouteConfig>) -> Result<(), TableError> {
        self.inner.matcher.add_routes(routes)
    }

    /// Adds `route` as a child of the route named `parent`
    pub fn add_route_to(&self, parent: &str, route: RouteConfig) -> Result<(), TableError> {
        self.inner.matcher.add_route_to(parent, route)
    }

    /// Registered records in match priority order
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.inner.matcher.routes()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.inner.matcher.has_route(name)
    }

    /// Detaches from the backend and resets to the start route
    pub fn teardown(&self) {
        self.inner.backend.teardown_listeners();
        let mut state = self.state();
        state.current = Route::start();
        state.pending = None;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RouteTable;

    #[test]
    fn test_resolve_queue_partitions() {
        let table = RouteTable::build(
            vec![
                RouteConfig::new("/a").with_child(RouteConfig::new("b").with_child(RouteConfig::new("c"))),
                RouteConfig::new("/x"),
            ],
            &TableOptions::default(),
        )
        .unwrap();
        let chain = |path: &str| crate::route::format_match(table.record_for_path(path).unwrap());

        let current = chain("/a/b/c");
        let next = chain("/a/b");
        let diff = resolve_queue(&current, &next);
        assert_eq!(diff.updated.len(), 2);
        assert!(diff.activated.is_empty());
        assert_eq!(diff.deactivated.len(), 1);

        let next = chain("/x");
        let diff = resolve_queue(&current, &next);
        assert!(diff.updated.is_empty());
        assert_eq!(diff.activated.len(), 1);
        assert_eq!(diff.deactivated.len(), 3);

        let ids = |records: &[Arc<RouteRecord>]| records.iter().map(|r| r.id()).collect::<Vec<_>>();
        let diff = resolve_queue(&[], &current);
        assert_eq!(ids(&[diff.updated, diff.activated].concat()), ids(&current));
    }

    #[test]
    fn test_href_includes_base() {
        let navigator = Navigator::builder()
            .config(NavigatorConfig {
                base: "/app/".to_string(),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(navigator.href("/users?x=1"), "/app/users?x=1");
        assert_eq!(navigator.backend_location(), "/");
    }

    #[test]
    fn test_remove_hook() {
        let navigator = Navigator::builder().build().unwrap();
        let id = navigator.after_each(|_, _| {});
        assert!(navigator.remove_hook(id));
        assert!(!navigator.remove_hook(id));
    }
}
