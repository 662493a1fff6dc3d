//! Match path diffing.
//!
//! # Algorithm
//! ```text
//! same identities at every index (same depth):
//!     no param change      → []
//!     params changed       → [Replace(deepest changed node)]
//! otherwise, k = common prefix (identity AND params):
//!     len(current) > k     → PopToRoot (k == 0) | Pop(len(current) - k)
//!     then                 → Push(target[k]), ..., Push(target[last])
//! ```
//!
//! # Design Decisions
//! - A route re-entered with different params is outside the common prefix
//! - Pops use the transition's animation flag; pushes and replaces also
//!   honour the route's own flag

use std::fmt;

use serde::Serialize;

use crate::routing::matcher::{MatchPath, MatchedNode};

/// One atomic stack mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Push { node: MatchedNode, animated: bool },
    Pop { count: usize, animated: bool },
    PopToRoot { animated: bool },
    Replace { node: MatchedNode, animated: bool },
}

impl Operation {
    /// Static label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Push { .. } => "push",
            Operation::Pop { .. } => "pop",
            Operation::PopToRoot { .. } => "pop_to_root",
            Operation::Replace { .. } => "replace",
        }
    }

    pub fn is_animated(&self) -> bool {
        match self {
            Operation::Push { animated, .. }
            | Operation::Pop { animated, .. }
            | Operation::PopToRoot { animated }
            | Operation::Replace { animated, .. } => *animated,
        }
    }

    /// The node a push or replace introduces.
    pub fn node(&self) -> Option<&MatchedNode> {
        match self {
            Operation::Push { node, .. } | Operation::Replace { node, .. } => Some(node),
            Operation::Pop { .. } | Operation::PopToRoot { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Push { node, .. } => write!(f, "push {}", node)?,
            Operation::Pop { count, .. } => write!(f, "pop {}", count)?,
            Operation::PopToRoot { .. } => f.write_str("pop_to_root")?,
            Operation::Replace { node, .. } => write!(f, "replace {}", node)?,
        }
        if !self.is_animated() {
            f.write_str(" (unanimated)")?;
        }
        Ok(())
    }
}

/// Compute the operations that move a stack showing `current` to `target`.
pub fn diff(current: &MatchPath, target: &MatchPath, animated: bool) -> Vec<Operation> {
    let cur = current.nodes();
    let tgt = target.nodes();

    let push_animated = |node: &MatchedNode| animated && node.route().animated();

    let same_shape =
        cur.len() == tgt.len() && cur.iter().zip(tgt).all(|(a, b)| a.same_route(b));
    if same_shape {
        return cur
            .iter()
            .zip(tgt)
            .rposition(|(a, b)| a.params() != b.params())
            .map(|index| {
                let node = tgt[index].clone();
                let animated = push_animated(&node);
                vec![Operation::Replace { node, animated }]
            })
            .unwrap_or_default();
    }

    let k = cur.iter().zip(tgt).take_while(|(a, b)| a == b).count();
    let mut ops = Vec::with_capacity(tgt.len() - k + 1);

    let excess = cur.len() - k;
    if excess > 0 {
        ops.push(if k == 0 {
            Operation::PopToRoot { animated }
        } else {
            Operation::Pop {
                count: excess,
                animated,
            }
        });
    }

    ops.extend(tgt[k..].iter().map(|node| Operation::Push {
        node: node.clone(),
        animated: push_animated(node),
    }));

    ops
}
