/// Navigation guards
///
/// A guard is an async check that decides whether a navigation may continue.
/// Guards come from three places: global hooks on the navigator, per-record
/// `before_enter`, and components (enter / update / leave). This module
/// defines the guard protocol and extracts component guards along a chain
/// of matched records.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::component::{ComponentDef, ViewComponent, ViewInstance};
use crate::location::Location;
use crate::record::RouteRecord;
use crate::route::Route;

/// Callback run with the instance of an entered view once it is mounted
pub type EnterCallback = Box<dyn FnOnce(&ViewInstance) + Send>;

/// Outcome of a guard
pub enum Next {
    /// Continue with the next guard
    Proceed,
    /// Stop the navigation
    Abort,
    /// Stop the navigation and go elsewhere (`replace` is honored)
    Redirect(Location),
    /// Stop the navigation with an error
    Error(anyhow::Error),
    /// Continue, and run the callback with the entered view's instance
    Enter(EnterCallback),
}

impl Next {
    pub fn redirect(to: impl Into<Location>) -> Self {
        Next::Redirect(to.into())
    }

    pub fn error(err: impl Into<anyhow::Error>) -> Self {
        Next::Error(err.into())
    }

    pub fn enter(callback: impl FnOnce(&ViewInstance) + Send + 'static) -> Self {
        Next::Enter(Box::new(callback))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Proceed => f.write_str("Proceed"),
            Next::Abort => f.write_str("Abort"),
            Next::Redirect(location) => f.debug_tuple("Redirect").field(location).finish(),
            Next::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Next::Enter(_) => f.write_str("Enter"),
        }
    }
}

/// A guard that does not need a view instance
#[async_trait]
pub trait NavigationGuard: Send + Sync {
    async fn check(&self, to: &Route, from: &Route) -> Next;
}

/// A guard bound to a live view instance (update and leave guards)
#[async_trait]
pub trait InstanceGuard: Send + Sync {
    async fn check(&self, instance: &ViewInstance, to: &Route, from: &Route) -> Next;
}

struct FnGuard<F>(F);

#[async_trait]
impl<F, Fut> NavigationGuard for FnGuard<F>
where
    F: Fn(Route, Route) -> Fut + Send + Sync,
    Fut: Future<Output = Next> + Send,
{
    async fn check(&self, to: &Route, from: &Route) -> Next {
        (self.0)(to.clone(), from.clone()).await
    }
}

/// Wraps an async closure as a [`NavigationGuard`]
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::guard::{guard_fn, Next};
///
/// let auth = guard_fn(|to, _from| async move {
///     if to.path.starts_with("/admin") {
///         Next::redirect("/login")
///     } else {
///         Next::Proceed
///     }
/// });
/// # let _ = auth;
/// ```
pub fn guard_fn<F, Fut>(f: F) -> Arc<dyn NavigationGuard>
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Next> + Send + 'static,
{
    Arc::new(FnGuard(f))
}

struct FnInstanceGuard<F>(F);

#[async_trait]
impl<F, Fut> InstanceGuard for FnInstanceGuard<F>
where
    F: Fn(ViewInstance, Route, Route) -> Fut + Send + Sync,
    Fut: Future<Output = Next> + Send,
{
    async fn check(&self, instance: &ViewInstance, to: &Route, from: &Route) -> Next {
        (self.0)(Arc::clone(instance), to.clone(), from.clone()).await
    }
}

/// Wraps an async closure as an [`InstanceGuard`]
pub fn instance_guard_fn<F, Fut>(f: F) -> Arc<dyn InstanceGuard>
where
    F: Fn(ViewInstance, Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Next> + Send + 'static,
{
    Arc::new(FnInstanceGuard(f))
}

// ============================================================================
// Bound guards (queue steps)
// ============================================================================

/// An instance guard bound to the instance it was extracted for
struct BoundGuard {
    guard: Arc<dyn InstanceGuard>,
    instance: ViewInstance,
}

#[async_trait]
impl NavigationGuard for BoundGuard {
    async fn check(&self, to: &Route, from: &Route) -> Next {
        self.guard.check(&self.instance, to, from).await
    }
}

/// An enter guard whose `Next::Enter` callback is parked on the record
struct EnterGuard {
    guard: Arc<dyn NavigationGuard>,
    record: Arc<RouteRecord>,
    slot: String,
}

#[async_trait]
impl NavigationGuard for EnterGuard {
    async fn check(&self, to: &Route, from: &Route) -> Next {
        match self.guard.check(to, from).await {
            Next::Enter(callback) => {
                self.record.queue_entered(&self.slot, callback);
                Next::Proceed
            }
            other => other,
        }
    }
}

/// Loads every lazy component of the activated records
pub(crate) struct ResolveComponents {
    records: Vec<Arc<RouteRecord>>,
}

impl ResolveComponents {
    pub(crate) fn new(records: &[Arc<RouteRecord>]) -> Self {
        Self {
            records: records.to_vec(),
        }
    }
}

#[async_trait]
impl NavigationGuard for ResolveComponents {
    async fn check(&self, _to: &Route, _from: &Route) -> Next {
        let pending = self.records.iter().flat_map(|record| {
            record
                .components()
                .snapshot()
                .into_iter()
                .filter_map(move |(slot, component)| match component {
                    ViewComponent::Lazy(lazy) => Some((Arc::clone(record), slot, lazy)),
                    ViewComponent::Ready(_) => None,
                })
        });

        let loads = pending.map(|(record, slot, lazy)| async move {
            match lazy.load().await {
                Ok(component) => {
                    record
                        .components()
                        .set(&slot, ViewComponent::Ready(ComponentDef::from_arc(component)));
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(path = record.path(), slot = %slot, error = %err, "Failed to resolve async component");
                    Err(err.context(format!("Failed to resolve async component {}", slot)))
                }
            }
        });

        match try_join_all(loads).await {
            Ok(_) => Next::Proceed,
            Err(err) => Next::Error(err),
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Ready components of `records`, record by record, slot by slot
fn ready_components(records: &[Arc<RouteRecord>]) -> Vec<(&Arc<RouteRecord>, String, Arc<ComponentDef>)> {
    records
        .iter()
        .flat_map(|record| {
            record
                .components()
                .snapshot()
                .into_iter()
                .filter_map(move |(slot, component)| {
                    component.as_ready().map(|def| (record, slot, Arc::clone(def)))
                })
        })
        .collect()
}

/// Instance-bound guards of one kind, grouped per (record, slot)
fn bound_guards(
    records: &[Arc<RouteRecord>],
    select: impl Fn(&ComponentDef) -> Vec<Arc<dyn InstanceGuard>>,
) -> Vec<Vec<Arc<dyn NavigationGuard>>> {
    ready_components(records)
        .into_iter()
        .filter_map(|(record, slot, def)| {
            let instance = record.instance(&slot)?;
            let guards = select(&def)
                .into_iter()
                .map(|guard| {
                    Arc::new(BoundGuard {
                        guard,
                        instance: Arc::clone(&instance),
                    }) as Arc<dyn NavigationGuard>
                })
                .collect();
            Some(guards)
        })
        .collect()
}

/// Leave guards of the deactivated records, innermost view first
///
/// Guards of one component keep their declaration order.
pub fn extract_leave_guards(deactivated: &[Arc<RouteRecord>]) -> Vec<Arc<dyn NavigationGuard>> {
    let mut groups = bound_guards(deactivated, |def| def.guards().leave.clone());
    groups.reverse();
    groups.into_iter().flatten().collect()
}

/// Update guards of the reused records, outermost view first
pub fn extract_update_guards(updated: &[Arc<RouteRecord>]) -> Vec<Arc<dyn NavigationGuard>> {
    bound_guards(updated, |def| def.guards().update.clone())
        .into_iter()
        .flatten()
        .collect()
}

/// Enter guards of the activated records, outermost view first
///
/// Callbacks returned through [`Next::Enter`] are queued on the record for the
/// slot and run once the view instance is registered.
pub fn extract_enter_guards(activated: &[Arc<RouteRecord>]) -> Vec<Arc<dyn NavigationGuard>> {
    ready_components(activated)
        .into_iter()
        .flat_map(|(record, slot, def)| {
            def.guards()
                .enter
                .iter()
                .map(|guard| {
                    Arc::new(EnterGuard {
                        guard: Arc::clone(guard),
                        record: Arc::clone(record),
                        slot: slot.clone(),
                    }) as Arc<dyn NavigationGuard>
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
