//! Router error taxonomy.

use thiserror::Error;

use crate::nav_url::NavUrl;

/// Errors surfaced by route registration, resolution and transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The URL does not resolve against the route tree.
    #[error("no route matches {url}")]
    NoMatch { url: NavUrl },

    /// A non-queued transition was requested while another one runs.
    #[error("cannot transition to {target}: a transition is already in progress")]
    TransitionInProgress { target: String },

    /// The router's own current URL no longer resolves. This means the route
    /// tree was changed incompatibly with the live stack.
    #[error("current url {url} no longer resolves against the route tree")]
    InvalidCurrentState { url: NavUrl },

    /// A route pattern could not be registered.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RouterError {
    /// Short, stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RouterError::NoMatch { .. } => "no_match",
            RouterError::TransitionInProgress { .. } => "transition_in_progress",
            RouterError::InvalidCurrentState { .. } => "invalid_current_state",
            RouterError::InvalidPattern { .. } => "invalid_pattern",
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
