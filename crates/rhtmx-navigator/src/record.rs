/// Route records
///
/// One [`RouteRecord`] exists per route definition, plus one per alias and per
/// aliased child. Records are immutable apart from their live-instance table,
/// their queue of deferred enter callbacks and lazily resolved components.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::component::{ViewComponent, ViewInstance, ViewSlots};
use crate::guard::{EnterCallback, NavigationGuard};
use crate::location::Location;
use crate::pattern::CompiledPattern;
use crate::route::Route;

/// Arbitrary per-route metadata
pub type Meta = HashMap<String, String>;

/// Locks a mutex, recovering the data if another holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a record, used for diffing matched chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        RecordId(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a record redirects to
#[derive(Clone)]
pub enum Redirect {
    To(Location),
    Dynamic(Arc<dyn Fn(&Route) -> Location + Send + Sync>),
}

impl Redirect {
    pub fn dynamic(f: impl Fn(&Route) -> Location + Send + Sync + 'static) -> Self {
        Redirect::Dynamic(Arc::new(f))
    }

    pub(crate) fn evaluate(&self, route: &Route) -> Location {
        match self {
            Redirect::To(location) => location.clone(),
            Redirect::Dynamic(f) => f(route),
        }
    }
}

impl From<Location> for Redirect {
    fn from(target: Location) -> Self {
        Redirect::To(target)
    }
}

impl From<&str> for Redirect {
    fn from(path: &str) -> Self {
        Redirect::To(Location::path(path))
    }
}

impl From<String> for Redirect {
    fn from(path: String) -> Self {
        Redirect::To(Location::path(path))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::To(location) => f.debug_tuple("To").field(location).finish(),
            Redirect::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// How a view's props are derived from the route
#[derive(Clone)]
pub enum PropsConfig {
    /// `true` passes the route params
    Bool(bool),
    Static(HashMap<String, String>),
    Dynamic(Arc<dyn Fn(&Route) -> HashMap<String, String> + Send + Sync>),
}

impl PropsConfig {
    pub fn dynamic(f: impl Fn(&Route) -> HashMap<String, String> + Send + Sync + 'static) -> Self {
        PropsConfig::Dynamic(Arc::new(f))
    }
}

impl fmt::Debug for PropsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsConfig::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            PropsConfig::Static(map) => f.debug_tuple("Static").field(map).finish(),
            PropsConfig::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// A flattened route definition
pub struct RouteRecord {
    id: RecordId,
    path: String,
    pattern: CompiledPattern,
    components: Arc<ViewSlots>,
    alias: Vec<String>,
    instances: Mutex<HashMap<String, Weak<dyn std::any::Any + Send + Sync>>>,
    entered_cbs: Mutex<HashMap<String, Vec<EnterCallback>>>,
    name: Option<String>,
    parent: Option<Weak<RouteRecord>>,
    match_as: Option<String>,
    redirect: Option<Redirect>,
    before_enter: Option<Arc<dyn NavigationGuard>>,
    meta: Meta,
    props: HashMap<String, PropsConfig>,
}

/// Everything needed to create a record; built by the route table
pub(crate) struct RecordParts {
    pub path: String,
    pub pattern: CompiledPattern,
    pub components: Arc<ViewSlots>,
    pub alias: Vec<String>,
    pub name: Option<String>,
    pub parent: Option<Weak<RouteRecord>>,
    pub match_as: Option<String>,
    pub redirect: Option<Redirect>,
    pub before_enter: Option<Arc<dyn NavigationGuard>>,
    pub meta: Meta,
    pub props: HashMap<String, PropsConfig>,
}

impl RouteRecord {
    pub(crate) fn new(parts: RecordParts) -> Arc<Self> {
        Arc::new(Self {
            id: RecordId::next(),
            path: parts.path,
            pattern: parts.pattern,
            components: parts.components,
            alias: parts.alias,
            instances: Mutex::new(HashMap::new()),
            entered_cbs: Mutex::new(HashMap::new()),
            name: parts.name,
            parent: parts.parent,
            match_as: parts.match_as,
            redirect: parts.redirect,
            before_enter: parts.before_enter,
            meta: parts.meta,
            props: parts.props,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Absolute, normalized path template
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn alias(&self) -> &[String] {
        &self.alias
    }

    /// Canonical path this alias record stands for
    pub fn match_as(&self) -> Option<&str> {
        self.match_as.as_deref()
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    pub fn before_enter(&self) -> Option<&Arc<dyn NavigationGuard>> {
        self.before_enter.as_ref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn parent(&self) -> Option<Arc<RouteRecord>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// View slots, shared with alias records
    pub fn components(&self) -> &Arc<ViewSlots> {
        &self.components
    }

    pub fn component(&self, slot: &str) -> Option<ViewComponent> {
        self.components.get(slot)
    }

    /// Registers the live instance rendering `slot`
    ///
    /// Only a weak reference is kept; the renderer owns the instance.
    pub fn register_instance(&self, slot: &str, instance: &ViewInstance) {
        lock(&self.instances).insert(slot.to_string(), Arc::downgrade(instance));
    }

    pub fn unregister_instance(&self, slot: &str) {
        lock(&self.instances).remove(slot);
    }

    /// The live instance of `slot`, if it is still alive
    pub fn instance(&self, slot: &str) -> Option<ViewInstance> {
        lock(&self.instances).get(slot).and_then(Weak::upgrade)
    }

    pub(crate) fn queue_entered(&self, slot: &str, callback: EnterCallback) {
        lock(&self.entered_cbs)
            .entry(slot.to_string())
            .or_default()
            .push(callback);
    }

    /// Number of deferred enter callbacks waiting for `slot`'s instance
    pub fn pending_entered(&self, slot: &str) -> usize {
        lock(&self.entered_cbs).get(slot).map_or(0, Vec::len)
    }

    /// Runs the deferred enter callbacks of `slot` with its live instance
    ///
    /// Callbacks stay queued while no instance is registered. Returns the
    /// number of callbacks invoked.
    pub fn flush_entered(&self, slot: &str) -> usize {
        let Some(instance) = self.instance(slot) else {
            return 0;
        };
        let callbacks = lock(&self.entered_cbs).remove(slot).unwrap_or_default();
        let count = callbacks.len();
        for callback in callbacks {
            callback(&instance);
        }
        count
    }

    /// Flushes every slot that has a live instance
    pub fn flush_all_entered(&self) -> usize {
        let slots: Vec<String> = lock(&self.entered_cbs).keys().cloned().collect();
        slots.iter().map(|slot| self.flush_entered(slot)).sum()
    }

    /// Props for the component rendered in `slot`
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::config::RouteConfig;
    /// use rhtmx_navigator::record::PropsConfig;
    /// use rhtmx_navigator::table::{RouteTable, TableOptions};
    /// use rhtmx_navigator::route::Route;
    ///
    /// let table = RouteTable::build(
    ///     vec![RouteConfig::new("/user/:id").with_props(PropsConfig::Bool(true))],
    ///     &TableOptions::default(),
    /// ).unwrap();
    /// let record = table.record_for_path("/user/:id").unwrap();
    ///
    /// let mut route = Route::start();
    /// route.params.insert("id".into(), "7".into());
    /// assert_eq!(record.resolve_props("default", &route)["id"], "7");
    /// ```
    pub fn resolve_props(&self, slot: &str, route: &Route) -> HashMap<String, String> {
        match self.props.get(slot) {
            Some(PropsConfig::Bool(true)) => route.params.clone(),
            Some(PropsConfig::Bool(false)) | None => HashMap::new(),
            Some(PropsConfig::Static(map)) => map.clone(),
            Some(PropsConfig::Dynamic(f)) => f(route),
        }
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("match_as", &self.match_as)
            .field("redirect", &self.redirect)
            .field("components", &self.components)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
