/// View components and their route lifecycle guards
///
/// A record maps view slots (`"default"` for the unnamed view) to components.
/// Components are either ready definitions or lazy loaders that are resolved
/// during navigation, before entering the route.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::OnceCell;

use crate::guard::{InstanceGuard, NavigationGuard};
use crate::record::lock;

/// Slot name of the unnamed view
pub const DEFAULT_VIEW: &str = "default";

/// A live, rendered instance of a component, owned by the renderer
pub type ViewInstance = Arc<dyn Any + Send + Sync>;

/// A component definition with optional route lifecycle guards
///
/// All guard accessors default to "no guards".
pub trait Component: Send + Sync {
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Guards run before a route rendering this component is entered
    ///
    /// They run before any instance exists; use `Next::Enter` to reach the
    /// instance once it is mounted.
    fn before_route_enter(&self) -> Vec<Arc<dyn NavigationGuard>> {
        Vec::new()
    }

    /// Guards run on the live instance when its route is reused with new params
    fn before_route_update(&self) -> Vec<Arc<dyn InstanceGuard>> {
        Vec::new()
    }

    /// Guards run on the live instance before its route is left
    fn before_route_leave(&self) -> Vec<Arc<dyn InstanceGuard>> {
        Vec::new()
    }
}

/// Guards of one component, read once per definition
#[derive(Clone, Default)]
pub(crate) struct GuardSet {
    pub(crate) enter: Vec<Arc<dyn NavigationGuard>>,
    pub(crate) update: Vec<Arc<dyn InstanceGuard>>,
    pub(crate) leave: Vec<Arc<dyn InstanceGuard>>,
}

/// A ready component definition
pub struct ComponentDef {
    component: Arc<dyn Component>,
    guards: OnceCell<GuardSet>,
}

impl ComponentDef {
    pub fn new(component: impl Component + 'static) -> Arc<Self> {
        Self::from_arc(Arc::new(component))
    }

    pub fn from_arc(component: Arc<dyn Component>) -> Arc<Self> {
        Arc::new(Self {
            component,
            guards: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    pub(crate) fn guards(&self) -> &GuardSet {
        self.guards.get_or_init(|| GuardSet {
            enter: self.component.before_route_enter(),
            update: self.component.before_route_update(),
            leave: self.component.before_route_leave(),
        })
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name())
            .finish()
    }
}

type Loader = dyn Fn() -> BoxFuture<'static, anyhow::Result<Arc<dyn Component>>> + Send + Sync;

/// A component loaded on first navigation to its route
#[derive(Clone)]
pub struct LazyComponent {
    loader: Arc<Loader>,
}

impl LazyComponent {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn Component>>> + Send + 'static,
    {
        Self {
            loader: Arc::new(move || loader().boxed()),
        }
    }

    pub fn load(&self) -> BoxFuture<'static, anyhow::Result<Arc<dyn Component>>> {
        (self.loader)()
    }
}

/// Content of a view slot
#[derive(Clone)]
pub enum ViewComponent {
    Ready(Arc<ComponentDef>),
    Lazy(LazyComponent),
}

impl ViewComponent {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ViewComponent::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&Arc<ComponentDef>> {
        match self {
            ViewComponent::Ready(def) => Some(def),
            ViewComponent::Lazy(_) => None,
        }
    }
}

impl From<Arc<ComponentDef>> for ViewComponent {
    fn from(def: Arc<ComponentDef>) -> Self {
        ViewComponent::Ready(def)
    }
}

impl From<LazyComponent> for ViewComponent {
    fn from(lazy: LazyComponent) -> Self {
        ViewComponent::Lazy(lazy)
    }
}

impl fmt::Debug for ViewComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewComponent::Ready(def) => write!(f, "Ready({})", def.name()),
            ViewComponent::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Slot table of a record, shared between a record and its aliases
#[derive(Default)]
pub struct ViewSlots {
    slots: Mutex<Vec<(String, ViewComponent)>>,
}

impl ViewSlots {
    pub fn new(slots: Vec<(String, ViewComponent)>) -> Self {
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Slots in declaration order
    pub fn snapshot(&self) -> Vec<(String, ViewComponent)> {
        lock(&self.slots).clone()
    }

    pub fn get(&self, slot: &str) -> Option<ViewComponent> {
        lock(&self.slots)
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, component)| component.clone())
    }

    /// Replaces (or appends) the component of `slot`
    pub fn set(&self, slot: &str, component: ViewComponent) {
        let mut slots = lock(&self.slots);
        match slots.iter_mut().find(|(name, _)| name == slot) {
            Some(entry) => entry.1 = component,
            None => slots.push((slot.to_string(), component)),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ViewSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.snapshot()).finish()
    }
}

/// A plain component built from guard lists
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::component::{Component, View};
/// use rhtmx_navigator::guard::{guard_fn, Next};
///
/// let view = View::new("Dashboard").on_enter(guard_fn(|_to, _from| async { Next::Proceed }));
/// assert_eq!(view.name(), "Dashboard");
/// assert_eq!(view.before_route_enter().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct View {
    name: String,
    enter: Vec<Arc<dyn NavigationGuard>>,
    update: Vec<Arc<dyn InstanceGuard>>,
    leave: Vec<Arc<dyn InstanceGuard>>,
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn on_enter(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.enter.push(guard);
        self
    }

    pub fn on_update(mut self, guard: Arc<dyn InstanceGuard>) -> Self {
        self.update.push(guard);
        self
    }

    pub fn on_leave(mut self, guard: Arc<dyn InstanceGuard>) -> Self {
        self.leave.push(guard);
        self
    }
}

impl Component for View {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_route_enter(&self) -> Vec<Arc<dyn NavigationGuard>> {
        self.enter.clone()
    }

    fn before_route_update(&self) -> Vec<Arc<dyn InstanceGuard>> {
        self.update.clone()
    }

    fn before_route_leave(&self) -> Vec<Arc<dyn InstanceGuard>> {
        self.leave.clone()
    }
}
