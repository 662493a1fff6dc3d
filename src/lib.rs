//! URL-driven navigation router for stack-based view hierarchies.
//!
//! Application state is a [`NavUrl`]. Moving between states is a
//! [`Transition`](transition::Transition): both URLs are resolved against the
//! [`RouteTree`](routing::RouteTree), the resulting match paths are diffed into
//! stack [`Operation`](routing::Operation)s, and the operations are handed one
//! at a time to an external [`Updater`].

pub mod config;
pub mod error;
pub mod nav_url;
pub mod observability;
pub mod router;
pub mod routing;
pub mod screen;
pub mod transition;
pub mod updater;

pub use config::RouterConfig;
pub use error::RouterError;
pub use nav_url::NavUrl;
pub use router::{Router, RouterDelegate};
pub use routing::{MatchPath, MatchedNode, Operation, RouteBuilder, RouteTree};
pub use screen::{Context, Screen, ScreenFactory};
pub use transition::{Attributes, TransitionReport};
pub use updater::{Completion, Update, Updater};
