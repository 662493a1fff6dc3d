//! Transition execution.
//!
//! # States
//! ```text
//! Idle → Resolving → Diffing → Executing → Completed
//!            │
//!            └─ NoMatch / InvalidCurrentState → aborted (completion gets Err)
//! ```
//!
//! # Sequencing
//! - One operation is in flight at a time; the next is dispatched only after
//!   the previous completion fires
//! - `awaiting` holds the index of the in-flight operation
//! - `dispatching` is set while the updater call is on the stack, so a
//!   completion fired synchronously is absorbed by the dispatch loop instead
//!   of re-entering it
//! - A completion for any other index is stale and ignored

pub mod attributes;

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::error::{RouterError, RouterResult};
use crate::nav_url::NavUrl;
use crate::routing::{diff, MatchPath, Operation, RouteTree};
use crate::screen::Context;

pub use attributes::{Attributes, AttributesBuilder, Destination, TransitionCallback};

/// Unique id of one transition, carried in log fields and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransitionId(Uuid);

impl TransitionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Idle,
    Resolving,
    Diffing,
    Executing,
    Completed,
}

/// Summary handed to completion callbacks and delegates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub id: TransitionId,
    pub from: NavUrl,
    pub to: NavUrl,
    pub animated: bool,
    pub operations: usize,
}

/// What the dispatch loop should do next.
pub(crate) enum Step {
    /// Hand this operation to the updater.
    Dispatch {
        index: usize,
        operation: Operation,
        context: Context,
    },
    /// An operation is in flight; its completion will resume the loop.
    Waiting,
    /// Every operation has completed.
    Finished,
}

/// Result of acknowledging a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ack {
    /// Completion arrived after the updater returned; the caller must resume.
    Resume,
    /// Completion arrived while the updater call was still on the stack.
    Absorbed,
    /// Not the operation we are waiting for.
    Stale,
}

/// One diff-and-apply cycle.
pub struct Transition {
    id: TransitionId,
    attributes: Attributes,
    state: TransitionState,
    from: NavUrl,
    target: NavUrl,
    target_path: MatchPath,
    pending: VecDeque<Operation>,
    total: usize,
    dispatched: usize,
    awaiting: Option<usize>,
    dispatching: bool,
    started_at: Instant,
}

impl Transition {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            id: TransitionId::new(),
            attributes,
            state: TransitionState::Idle,
            from: NavUrl::empty(),
            target: NavUrl::empty(),
            target_path: MatchPath::empty(),
            pending: VecDeque::new(),
            total: 0,
            dispatched: 0,
            awaiting: None,
            dispatching: false,
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn from(&self) -> &NavUrl {
        &self.from
    }

    pub fn target(&self) -> &NavUrl {
        &self.target
    }

    pub fn target_path(&self) -> &MatchPath {
        &self.target_path
    }

    /// Operations not yet dispatched.
    pub fn pending(&self) -> impl Iterator<Item = &Operation> {
        self.pending.iter()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn report(&self) -> TransitionReport {
        TransitionReport {
            id: self.id,
            from: self.from.clone(),
            to: self.target.clone(),
            animated: self.attributes.animated(),
            operations: self.total,
        }
    }

    fn enter(&mut self, state: TransitionState) {
        tracing::trace!(transition_id = %self.id, from = ?self.state, to = ?state, "Transition state change");
        self.state = state;
    }

    /// Run the Resolving and Diffing phases.
    ///
    /// `current_url` and `current_path` are the router's committed state.
    /// The current URL is re-resolved to validate it against the live tree,
    /// but the diff runs against the committed path, which reflects the
    /// screens actually on the stack.
    pub(crate) fn prepare(
        &mut self,
        current_url: &NavUrl,
        current_path: &MatchPath,
        tree: &RouteTree,
    ) -> RouterResult<()> {
        self.enter(TransitionState::Resolving);
        self.from = current_url.clone();
        self.attributes.stamp_from(current_url.clone());
        self.target = self.attributes.resolve_target(current_url);

        if tree.resolve(current_url).is_err() {
            tracing::error!(
                transition_id = %self.id,
                current = %current_url,
                "Current URL no longer resolves; route tree changed under live state"
            );
            return Err(RouterError::InvalidCurrentState {
                url: current_url.clone(),
            });
        }
        self.target_path = tree.resolve(&self.target)?;

        self.enter(TransitionState::Diffing);
        let operations = diff(current_path, &self.target_path, self.attributes.animated());
        tracing::debug!(
            transition_id = %self.id,
            from = %self.from,
            to = %self.target,
            operations = operations.len(),
            "Transition planned"
        );
        self.total = operations.len();
        self.pending = operations.into();

        self.enter(TransitionState::Executing);
        Ok(())
    }

    /// Advance the dispatch loop by one step.
    pub(crate) fn poll(&mut self) -> Step {
        if self.awaiting.is_some() {
            self.dispatching = false;
            return Step::Waiting;
        }
        match self.pending.pop_front() {
            Some(operation) => {
                let index = self.dispatched;
                self.dispatched += 1;
                self.awaiting = Some(index);
                self.dispatching = true;
                Step::Dispatch {
                    index,
                    operation,
                    context: self.attributes.context().clone(),
                }
            }
            None => {
                self.dispatching = false;
                self.enter(TransitionState::Completed);
                Step::Finished
            }
        }
    }

    /// Record the completion of operation `index`.
    pub(crate) fn acknowledge(&mut self, index: usize) -> Ack {
        if self.awaiting != Some(index) {
            return Ack::Stale;
        }
        self.awaiting = None;
        if self.dispatching {
            Ack::Absorbed
        } else {
            Ack::Resume
        }
    }

    /// Deliver the outcome to the request's completion callback.
    pub(crate) fn complete(&mut self, result: Result<TransitionReport, RouterError>) {
        self.attributes.complete(result);
    }

    pub(crate) fn into_attributes(self) -> Attributes {
        self.attributes
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("from", &self.from)
            .field("target", &self.target)
            .field("pending", &self.pending.len())
            .field("awaiting", &self.awaiting)
            .finish()
    }
}
