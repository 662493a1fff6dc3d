//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (configuration time or runtime):
//!     RouteBuilder::route("/list/:id", factory)
//!     → tree.rs (insert/overwrite node chain, fresh RouteId)
//!
//! Resolution:
//!     NavUrl (segments + params)
//!     → matcher.rs (depth-first walk, literal before parameter)
//!     → Return: MatchPath or NoMatch
//!
//! Diffing:
//!     (current MatchPath, target MatchPath)
//!     → diff.rs (common prefix by identity + params)
//!     → Vec<Operation> (PopToRoot | Pop | Push... | Replace)
//! ```
//!
//! # Design Decisions
//! - Last registration at a pattern wins; the overwritten node keeps its children
//! - Every registration mints a new route identity
//! - Nodes created only as intermediates are structural, not screens
//! - Deterministic: same tree and URL always produce the same MatchPath

pub mod diff;
pub mod matcher;
pub mod tree;

pub use diff::{diff, Operation};
pub use matcher::{MatchPath, MatchedNode};
pub use tree::{Route, RouteBuilder, RouteEntry, RouteId, RouteTree, Segment};
