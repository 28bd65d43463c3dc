//! Error taxonomy
//!
//! [`NavigationFailure`]s are expected control flow (a navigation that did not
//! happen for a known reason). Everything else in [`NavigationError`] is a real
//! error and is reported to the registered error callbacks.

use thiserror::Error;

use crate::pattern::PatternError;

/// Kind of a [`NavigationFailure`], for cheap comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Redirected,
    Aborted,
    Cancelled,
    Duplicated,
}

/// A navigation that did not complete, for an expected reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationFailure {
    #[error("Redirected when going from \"{from}\" to \"{to}\" via a navigation guard.")]
    Redirected { from: String, to: String },

    #[error("Avoided redundant navigation to current location: \"{from}\".")]
    Duplicated { from: String, to: String },

    #[error("Navigation cancelled from \"{from}\" to \"{to}\" with a new navigation.")]
    Cancelled { from: String, to: String },

    #[error("Navigation aborted from \"{from}\" to \"{to}\" via a navigation guard.")]
    Aborted { from: String, to: String },
}

impl NavigationFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            NavigationFailure::Redirected { .. } => FailureKind::Redirected,
            NavigationFailure::Duplicated { .. } => FailureKind::Duplicated,
            NavigationFailure::Cancelled { .. } => FailureKind::Cancelled,
            NavigationFailure::Aborted { .. } => FailureKind::Aborted,
        }
    }

    /// Full path of the route the navigation started from
    pub fn from(&self) -> &str {
        match self {
            NavigationFailure::Redirected { from, .. }
            | NavigationFailure::Duplicated { from, .. }
            | NavigationFailure::Cancelled { from, .. }
            | NavigationFailure::Aborted { from, .. } => from,
        }
    }

    /// Full path of the route the navigation was heading to
    pub fn to(&self) -> &str {
        match self {
            NavigationFailure::Redirected { to, .. }
            | NavigationFailure::Duplicated { to, .. }
            | NavigationFailure::Cancelled { to, .. }
            | NavigationFailure::Aborted { to, .. } => to,
        }
    }
}

/// Errors produced while resolving a location against the route table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("missing param for {route}: {source}")]
    MissingParam {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("redirect chain starting at \"{path}\" exceeded {limit} hops")]
    RedirectLoop { path: String, limit: usize },

    #[error("invalid redirect from \"{path}\": {reason}")]
    InvalidRedirect { path: String, reason: String },
}

/// Errors produced while building or extending the route table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("\"path\" is required in a route configuration")]
    MissingPath,

    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("parent route {0:?} is not registered")]
    UnknownParent(String),
}

/// Outcome of a navigation that did not commit
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Failure(#[from] NavigationFailure),

    #[error(transparent)]
    Match(#[from] MatchError),

    /// A guard reported an error, or a lazy component failed to load
    #[error("navigation guard failed: {0:#}")]
    Guard(anyhow::Error),
}

impl NavigationError {
    /// The failure, when this is an expected navigation failure
    pub fn failure(&self) -> Option<&NavigationFailure> {
        match self {
            NavigationError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Checks the failure kind; `None` matches any failure
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::error::{FailureKind, NavigationError, NavigationFailure};
    ///
    /// let err = NavigationError::from(NavigationFailure::Aborted {
    ///     from: "/".into(),
    ///     to: "/admin".into(),
    /// });
    /// assert!(err.is_failure(None));
    /// assert!(err.is_failure(Some(FailureKind::Aborted)));
    /// assert!(!err.is_failure(Some(FailureKind::Cancelled)));
    /// ```
    pub fn is_failure(&self, kind: Option<FailureKind>) -> bool {
        match (self.failure(), kind) {
            (Some(_), None) => true,
            (Some(failure), Some(kind)) => failure.kind() == kind,
            (None, _) => false,
        }
    }
}
