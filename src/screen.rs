//! Screen factory boundary.
//!
//! The router never looks inside a [`Screen`]; it only asks a route's
//! [`ScreenFactory`] for one right before a push or replace is dispatched, and
//! hands it to the [`Updater`](crate::Updater) together with the operation.

use std::any::Any;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::routing::MatchedNode;

/// Opaque screen handle produced by a factory and consumed by an updater.
pub type Screen = Box<dyn Any + Send>;

/// Arbitrary payload attached to a transition request and passed to factories.
pub type Context = BTreeMap<String, serde_json::Value>;

/// Builds a screen for a matched route.
pub trait ScreenFactory: Send + Sync {
    fn build(&self, node: &MatchedNode, context: &Context) -> Screen;
}

impl<F> ScreenFactory for F
where
    F: Fn(&MatchedNode, &Context) -> Screen + Send + Sync,
{
    fn build(&self, node: &MatchedNode, context: &Context) -> Screen {
        self(node, context)
    }
}

/// Plain description of a screen, built by [`NamedScreen`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenDescriptor {
    pub name: String,
    pub pattern: String,
    pub params: BTreeMap<String, String>,
}

/// Factory for routes declared in configuration: the screen is just its name
/// plus the bound parameters.
#[derive(Debug, Clone)]
pub struct NamedScreen {
    name: String,
}

impl NamedScreen {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ScreenFactory for NamedScreen {
    fn build(&self, node: &MatchedNode, _context: &Context) -> Screen {
        Box::new(ScreenDescriptor {
            name: self.name.clone(),
            pattern: node.pattern().to_string(),
            params: node.params().clone(),
        })
    }
}
