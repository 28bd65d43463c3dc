// File: src/config.rs
// Purpose: Navigator configuration (navigator.toml) and route definitions

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::component::{Component, ComponentDef, LazyComponent, ViewComponent, DEFAULT_VIEW};
use crate::guard::NavigationGuard;
use crate::path::normalize_base;
use crate::record::{Meta, PropsConfig, Redirect};

/// Navigator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Base path the application is served under (e.g., "/app")
    #[serde(default = "default_base")]
    pub base: String,

    /// Treat route configuration mistakes as errors instead of skipping them
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Match paths case-sensitively unless a route overrides it
    #[serde(default = "default_false")]
    pub case_sensitive: bool,

    /// Reject an optional trailing slash unless a route overrides it
    #[serde(default = "default_false")]
    pub strict: bool,

    /// Fail a guard that does not settle within this many milliseconds
    #[serde(default)]
    pub guard_timeout_ms: Option<u64>,
}

fn default_base() -> String {
    "/".to_string()
}

fn default_false() -> bool {
    false
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            debug: false,
            case_sensitive: false,
            strict: false,
            guard_timeout_ms: None,
        }
    }
}

impl NavigatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Parse configuration from TOML text (empty text means defaults)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: NavigatorConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Base path with a leading slash and no trailing slash ("" for the root)
    pub fn normalized_base(&self) -> String {
        normalize_base(&self.base)
    }
}

/// A route definition, possibly nested
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::component::View;
/// use rhtmx_navigator::config::RouteConfig;
///
/// let routes = vec![
///     RouteConfig::new("/").with_name("home").with_component(View::new("Home")),
///     RouteConfig::new("/users/:id")
///         .with_name("user")
///         .with_component(View::new("User"))
///         .with_child(RouteConfig::new("posts").with_component(View::new("Posts")))
///         .with_alias("/u/:id"),
///     RouteConfig::new("/old").with_redirect("/"),
/// ];
/// assert_eq!(routes[1].children.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
    pub path: Option<String>,
    pub name: Option<String>,
    /// View slot → component, in declaration order
    pub components: Vec<(String, ViewComponent)>,
    pub children: Vec<RouteConfig>,
    pub redirect: Option<Redirect>,
    pub alias: Vec<String>,
    pub before_enter: Option<Arc<dyn NavigationGuard>>,
    pub meta: Meta,
    /// View slot → props
    pub props: HashMap<String, PropsConfig>,
    pub case_sensitive: Option<bool>,
    pub strict: Option<bool>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Component of the unnamed view
    pub fn with_component(self, component: impl Component + 'static) -> Self {
        self.with_named_component(DEFAULT_VIEW, component)
    }

    pub fn with_named_component(self, slot: impl Into<String>, component: impl Component + 'static) -> Self {
        self.with_view_component(slot, ViewComponent::Ready(ComponentDef::new(component)))
    }

    /// Component of the unnamed view, loaded on first navigation
    pub fn with_lazy_component<F, Fut>(self, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn Component>>> + Send + 'static,
    {
        self.with_view_component(DEFAULT_VIEW, ViewComponent::Lazy(LazyComponent::new(loader)))
    }

    /// Sets a slot to an existing component (e.g., one definition shared by several routes)
    pub fn with_view_component(mut self, slot: impl Into<String>, component: ViewComponent) -> Self {
        let slot = slot.into();
        match self.components.iter_mut().find(|(name, _)| *name == slot) {
            Some(entry) => entry.1 = component,
            None => self.components.push((slot, component)),
        }
        self
    }

    pub fn with_child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_before_enter(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.before_enter = Some(guard);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Props of the unnamed view
    pub fn with_props(self, props: PropsConfig) -> Self {
        self.with_view_props(DEFAULT_VIEW, props)
    }

    pub fn with_view_props(mut self, slot: impl Into<String>, props: PropsConfig) -> Self {
        self.props.insert(slot.into(), props);
        self
    }

    pub fn with_case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("components", &self.components)
            .field("children", &self.children)
            .field("redirect", &self.redirect)
            .field("alias", &self.alias)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
