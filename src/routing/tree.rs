//! Route registry.
//!
//! # Responsibilities
//! - Parse route patterns (`/list/:id`) into segments
//! - Insert or overwrite the node chain for a pattern
//! - Expose the builder surface used by `Router::update_routes`
//!
//! # Design Decisions
//! - Children keyed by segment pattern in a `BTreeMap` (literals sort first)
//! - Overwriting a node replaces its entry and keeps its children
//! - The tree is a plain value; the router swaps whole trees on update

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{RouterError, RouterResult};
use crate::nav_url::NavUrl;
use crate::routing::matcher::{self, MatchPath};
use crate::screen::ScreenFactory;

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one route registration.
///
/// Two matched nodes are "the same screen" only if their ids are equal.
/// Registering a pattern again produces a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

impl RouteId {
    fn next() -> Self {
        Self(NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route#{}", self.0)
    }
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Matches exactly this URL segment.
    Literal(String),
    /// Matches any URL segment and binds it to this name.
    Param(String),
}

impl Segment {
    fn parse(pattern: &str, raw: &str) -> RouterResult<Self> {
        match raw.strip_prefix(':') {
            Some("") => Err(RouterError::invalid_pattern(pattern, "empty parameter name")),
            Some(name) => Ok(Segment::Param(name.to_string())),
            None => Ok(Segment::Literal(raw.to_string())),
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(s) => f.write_str(s),
            Segment::Param(name) => write!(f, ":{}", name),
        }
    }
}

/// Split a pattern into segments, rejecting empty patterns and duplicate
/// parameter names.
pub(crate) fn parse_pattern(pattern: &str) -> RouterResult<Vec<Segment>> {
    let segments = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|raw| Segment::parse(pattern, raw))
        .collect::<RouterResult<Vec<_>>>()?;

    if segments.is_empty() {
        return Err(RouterError::invalid_pattern(
            pattern,
            "pattern must name at least one segment",
        ));
    }

    let mut seen = Vec::new();
    for segment in &segments {
        if let Segment::Param(name) = segment {
            if seen.contains(&name) {
                return Err(RouterError::invalid_pattern(
                    pattern,
                    format!("parameter `{}` appears twice", name),
                ));
            }
            seen.push(name);
        }
    }

    Ok(segments)
}

/// Registration value: a factory plus per-route options.
#[derive(Clone)]
pub struct Route {
    factory: Arc<dyn ScreenFactory>,
    animated: bool,
}

impl Route {
    pub fn new(factory: impl ScreenFactory + 'static) -> Self {
        Self::from_arc(Arc::new(factory))
    }

    pub fn from_arc(factory: Arc<dyn ScreenFactory>) -> Self {
        Self {
            factory,
            animated: true,
        }
    }

    /// Never animate pushes/replaces of this route.
    pub fn unanimated(mut self) -> Self {
        self.animated = false;
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("animated", &self.animated)
            .finish_non_exhaustive()
    }
}

/// A registered screen route.
pub struct RouteEntry {
    id: RouteId,
    pattern: String,
    factory: Arc<dyn ScreenFactory>,
    animated: bool,
}

impl RouteEntry {
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Pattern as registered, normalized to `/a/:b` form.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn factory(&self) -> &Arc<dyn ScreenFactory> {
        &self.factory
    }

    /// False for routes registered as always-unanimated.
    pub fn animated(&self) -> bool {
        self.animated
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("animated", &self.animated)
            .finish_non_exhaustive()
    }
}

/// A node in the route tree. Nodes without an entry are structural.
#[derive(Debug, Clone, Default)]
pub struct RouteNode {
    pub(crate) entry: Option<Arc<RouteEntry>>,
    pub(crate) children: BTreeMap<Segment, RouteNode>,
}

impl RouteNode {
    pub fn entry(&self) -> Option<&Arc<RouteEntry>> {
        self.entry.as_ref()
    }

    pub fn children(&self) -> impl Iterator<Item = (&Segment, &RouteNode)> {
        self.children.iter()
    }

    /// Children that can consume `segment`: the equal literal first, then
    /// every parameter child in pattern order.
    pub(crate) fn candidates<'a>(
        &'a self,
        segment: &'a str,
    ) -> impl Iterator<Item = (&'a Segment, &'a RouteNode)> + 'a {
        let literal = self
            .children
            .get_key_value(&Segment::Literal(segment.to_string()));
        literal
            .into_iter()
            .chain(self.children.iter().filter(|(s, _)| s.is_param()))
    }

    fn collect_patterns(&self, out: &mut Vec<String>) {
        if let Some(entry) = &self.entry {
            out.push(entry.pattern.clone());
        }
        for child in self.children.values() {
            child.collect_patterns(out);
        }
    }

    fn remove(&mut self, segments: &[Segment]) -> bool {
        let Some((head, rest)) = segments.split_first() else {
            return false;
        };
        if rest.is_empty() {
            return self.children.remove(head).is_some();
        }
        let Some(child) = self.children.get_mut(head) else {
            return false;
        };
        let removed = child.remove(rest);
        // Prune structural nodes left without children.
        if removed && child.entry.is_none() && child.children.is_empty() {
            self.children.remove(head);
        }
        removed
    }
}

/// Registry of routes keyed by path pattern.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    root: RouteNode,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree through the builder surface.
    pub fn build<F>(routes: F) -> RouterResult<Self>
    where
        F: FnOnce(&mut RouteBuilder<'_>),
    {
        let mut tree = Self::new();
        tree.update(routes)?;
        Ok(tree)
    }

    /// Apply builder calls to this tree. On error the first failure is
    /// returned; the other registrations have still been applied.
    pub fn update<F>(&mut self, routes: F) -> RouterResult<()>
    where
        F: FnOnce(&mut RouteBuilder<'_>),
    {
        let mut builder = RouteBuilder {
            tree: self,
            errors: Vec::new(),
        };
        routes(&mut builder);
        builder.finish()
    }

    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// Insert or overwrite the route at `pattern`, creating intermediate
    /// structural nodes as needed. Returns the new route's identity.
    pub fn register(&mut self, pattern: &str, route: Route) -> RouterResult<RouteId> {
        let segments = parse_pattern(pattern)?;
        let normalized = format!(
            "/{}",
            segments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/")
        );

        let mut node = &mut self.root;
        for segment in segments {
            node = node.children.entry(segment).or_default();
        }

        let id = RouteId::next();
        if let Some(previous) = &node.entry {
            tracing::debug!(pattern = %normalized, old = %previous.id, new = %id, "Overwriting route");
        } else {
            tracing::debug!(pattern = %normalized, id = %id, "Registering route");
        }
        node.entry = Some(Arc::new(RouteEntry {
            id,
            pattern: normalized,
            factory: route.factory,
            animated: route.animated,
        }));
        Ok(id)
    }

    /// Remove the node at `pattern` and its whole subtree.
    pub fn remove(&mut self, pattern: &str) -> RouterResult<bool> {
        let segments = parse_pattern(pattern)?;
        Ok(self.root.remove(&segments))
    }

    /// Look up the entry registered at exactly `pattern`.
    pub fn get(&self, pattern: &str) -> Option<&Arc<RouteEntry>> {
        let segments = parse_pattern(pattern).ok()?;
        let mut node = &self.root;
        for segment in &segments {
            node = node.children.get(segment)?;
        }
        node.entry.as_ref()
    }

    /// All registered screen patterns, depth-first in key order.
    pub fn patterns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_patterns(&mut out);
        out
    }

    /// Number of screen routes.
    pub fn len(&self) -> usize {
        self.patterns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Resolve `url` into a match path.
    pub fn resolve(&self, url: &NavUrl) -> RouterResult<MatchPath> {
        matcher::resolve(self, url)
    }
}

/// Builder surface for registering routes.
///
/// Calls chain; failures are collected and reported when the builder closure
/// returns.
pub struct RouteBuilder<'a> {
    tree: &'a mut RouteTree,
    errors: Vec<RouterError>,
}

impl RouteBuilder<'_> {
    /// Register an animated route.
    pub fn route(&mut self, pattern: &str, factory: impl ScreenFactory + 'static) -> &mut Self {
        self.add(pattern, Route::new(factory))
    }

    /// Register a route whose pushes and replaces are never animated.
    pub fn route_unanimated(
        &mut self,
        pattern: &str,
        factory: impl ScreenFactory + 'static,
    ) -> &mut Self {
        self.add(pattern, Route::new(factory).unanimated())
    }

    /// Register a prepared [`Route`].
    pub fn add(&mut self, pattern: &str, route: Route) -> &mut Self {
        if let Err(e) = self.tree.register(pattern, route) {
            self.errors.push(e);
        }
        self
    }

    /// Remove a route and its subtree. Removing an unknown pattern is a no-op.
    pub fn remove(&mut self, pattern: &str) -> &mut Self {
        match self.tree.remove(pattern) {
            Ok(false) => tracing::debug!(pattern, "Route to remove not found"),
            Ok(true) => {}
            Err(e) => self.errors.push(e),
        }
        self
    }

    fn finish(self) -> RouterResult<()> {
        let mut errors = self.errors.into_iter();
        match errors.next() {
            None => Ok(()),
            Some(first) => {
                for other in errors {
                    tracing::warn!(error = %other, "Additional route registration failure");
                }
                Err(first)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{Context, Screen};
    use crate::routing::MatchedNode;

    fn screen(name: &'static str) -> impl ScreenFactory {
        move |_: &MatchedNode, _: &Context| -> Screen { Box::new(name) }
    }

    #[test]
    fn test_parse_pattern() {
        let segments = parse_pattern("/list/:id").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Literal("list".into()), Segment::Param("id".into())]
        );
        assert!(parse_pattern("/").is_err());
        assert!(parse_pattern("/a/:").is_err());
        assert!(parse_pattern("/:id/x/:id").is_err());
    }

    #[test]
    fn test_register_creates_structural_intermediates() {
        let tree = RouteTree::build(|r| {
            r.route("/list/:id", screen("list"));
        })
        .unwrap();

        let list = tree.root().children.get(&Segment::Literal("list".into())).unwrap();
        assert!(list.entry().is_none());
        assert_eq!(tree.patterns(), vec!["/list/:id".to_string()]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_children_and_changes_identity() {
        let mut tree = RouteTree::build(|r| {
            r.route("/home", screen("home"))
                .route("/home/detail", screen("detail"));
        })
        .unwrap();
        let old = tree.get("/home").unwrap().id();

        tree.update(|r| {
            r.route_unanimated("/home", screen("home2"));
        })
        .unwrap();

        let new = tree.get("/home").unwrap();
        assert_ne!(new.id(), old);
        assert!(!new.animated());
        // Child registered earlier is still there.
        assert!(tree.get("/home/detail").is_some());
    }

    #[test]
    fn test_remove_prunes_structural_parents() {
        let mut tree = RouteTree::build(|r| {
            r.route("/a/b/c", screen("c")).route("/x", screen("x"));
        })
        .unwrap();
        assert!(tree.remove("/a/b/c").unwrap());
        assert!(tree.get("/a/b/c").is_none());
        assert!(!tree.root().children.contains_key(&Segment::Literal("a".into())));
        assert!(!tree.remove("/nope").unwrap());
        assert_eq!(tree.patterns(), vec!["/x".to_string()]);
    }

    #[test]
    fn test_builder_reports_first_error() {
        let mut tree = RouteTree::new();
        let result = tree.update(|r| {
            r.route("/ok", screen("ok")).route("/bad/:", screen("bad"));
        });
        assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
        assert!(tree.get("/ok").is_some());
    }
}
