//! Route matching logic.
//!
//! # Responsibilities
//! - Walk URL segments against the route tree depth-first
//! - Bind parameter segments and query parameters to matched nodes
//! - Return the ordered match path or an explicit NoMatch
//!
//! # Design Decisions
//! - Literal children are tried before parameter children
//! - The walk backtracks into parameter children when a literal branch dead-ends
//! - A URL must end on a screen node; ending on a structural node is NoMatch
//! - Path parameters win over query parameters with the same name

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{RouterError, RouterResult};
use crate::nav_url::NavUrl;
use crate::routing::tree::{RouteEntry, RouteId, RouteNode, RouteTree, Segment};

/// A route paired with the parameters bound to it during one resolution.
#[derive(Debug, Clone)]
pub struct MatchedNode {
    route: Arc<RouteEntry>,
    params: BTreeMap<String, String>,
}

impl MatchedNode {
    pub fn route(&self) -> &Arc<RouteEntry> {
        &self.route
    }

    pub fn id(&self) -> RouteId {
        self.route.id()
    }

    pub fn pattern(&self) -> &str {
        self.route.pattern()
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// True when both nodes come from the same route registration,
    /// regardless of parameters.
    pub fn same_route(&self, other: &MatchedNode) -> bool {
        self.route.id() == other.route.id()
    }
}

impl PartialEq for MatchedNode {
    fn eq(&self, other: &Self) -> bool {
        self.same_route(other) && self.params == other.params
    }
}

impl Eq for MatchedNode {}

impl fmt::Display for MatchedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " {{{}}}", params.join(", "))?;
        }
        Ok(())
    }
}

impl Serialize for MatchedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MatchedNode", 3)?;
        s.serialize_field("route", &self.route.id().get())?;
        s.serialize_field("pattern", self.pattern())?;
        s.serialize_field("params", &self.params)?;
        s.end()
    }
}

/// Ordered resolution of a URL, root (exclusive) to leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPath {
    url: NavUrl,
    nodes: Vec<MatchedNode>,
}

impl MatchPath {
    /// The path of the empty URL: no screens.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The URL this path was resolved from.
    pub fn url(&self) -> &NavUrl {
        &self.url
    }

    pub fn nodes(&self) -> &[MatchedNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchedNode> {
        self.nodes.get(index)
    }

    pub fn leaf(&self) -> Option<&MatchedNode> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedNode> {
        self.nodes.iter()
    }
}

impl fmt::Display for MatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return f.write_str("[]");
        }
        let nodes: Vec<String> = self.nodes.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", nodes.join(" > "))
    }
}

impl<'a> IntoIterator for &'a MatchPath {
    type Item = &'a MatchedNode;
    type IntoIter = std::slice::Iter<'a, MatchedNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

type Binding = (String, String);

/// A screen hit during the walk and the path parameters it owns.
type Hit = (Arc<RouteEntry>, Vec<Binding>);

/// Resolve `url` against `tree`.
pub fn resolve(tree: &RouteTree, url: &NavUrl) -> RouterResult<MatchPath> {
    if url.is_empty() {
        return Ok(MatchPath {
            url: url.clone(),
            nodes: Vec::new(),
        });
    }

    let hits = descend(tree.root(), url.segments(), &[]).ok_or_else(|| {
        tracing::debug!(url = %url, "No route matched");
        RouterError::NoMatch { url: url.clone() }
    })?;

    let nodes = hits
        .into_iter()
        .map(|(route, bindings)| {
            let mut params = url.params().clone();
            params.extend(bindings);
            MatchedNode { route, params }
        })
        .collect();

    Ok(MatchPath {
        url: url.clone(),
        nodes,
    })
}

/// Depth-first walk. `pending` holds parameters bound by structural nodes
/// since the last screen; they belong to the next screen on the path.
fn descend(node: &RouteNode, segments: &[String], pending: &[Binding]) -> Option<Vec<Hit>> {
    let (head, rest) = segments.split_first()?;

    for (segment, child) in node.candidates(head) {
        let mut bound = pending.to_vec();
        if let Segment::Param(name) = segment {
            bound.push((name.clone(), head.clone()));
        }

        let (hit, carry) = match &child.entry {
            Some(entry) => (Some((entry.clone(), bound)), Vec::new()),
            None => (None, bound),
        };

        if rest.is_empty() {
            match hit {
                Some(hit) => return Some(vec![hit]),
                None => continue,
            }
        }

        if let Some(mut tail) = descend(child, rest, &carry) {
            if let Some(hit) = hit {
                tail.insert(0, hit);
            }
            return Some(tail);
        }
    }

    None
}
