//! View-stack updater boundary.
//!
//! # Responsibilities
//! - Define the contract between the router and the live view hierarchy
//! - Carry the one-shot completion signal for each dispatched operation
//! - Provide an immediate updater and a timer-driven one
//!
//! # Design Decisions
//! - `Completion::complete` consumes the signal, so it cannot fire twice
//! - A completion dropped without firing is logged; the transition stalls
//! - Completions may fire on the dispatching call stack or any later thread

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::routing::Operation;
use crate::screen::Screen;
use crate::transition::TransitionId;

/// One operation handed to the updater, with the screen to show for pushes
/// and replaces.
pub struct Update {
    pub transition: TransitionId,
    pub operation: Operation,
    pub screen: Option<Screen>,
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("transition", &self.transition)
            .field("operation", &self.operation)
            .field("screen", &self.screen.is_some())
            .finish()
    }
}

/// Performs stack mutations on the live view hierarchy.
///
/// Implementations must call `done.complete()` exactly once per update, once
/// the mutation (and its animation, if any) has finished.
pub trait Updater: Send + Sync {
    fn apply(&self, update: Update, done: Completion);
}

impl<F> Updater for F
where
    F: Fn(Update, Completion) + Send + Sync,
{
    fn apply(&self, update: Update, done: Completion) {
        self(update, done)
    }
}

/// One-shot completion signal for a dispatched update.
pub struct Completion {
    signal: Option<Box<dyn FnOnce() + Send>>,
    label: String,
}

impl Completion {
    pub fn new(label: impl Into<String>, signal: impl FnOnce() + Send + 'static) -> Self {
        Self {
            signal: Some(Box::new(signal)),
            label: label.into(),
        }
    }

    /// Signal that the update finished.
    pub fn complete(mut self) {
        if let Some(signal) = self.signal.take() {
            signal();
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.label)
            .field("pending", &self.signal.is_some())
            .finish()
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.signal.is_some() {
            tracing::warn!(update = %self.label, "Completion dropped without firing; transition will not advance");
        }
    }
}

/// Applies nothing and completes on the spot. Default for routers built
/// without an updater.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateUpdater;

impl Updater for ImmediateUpdater {
    fn apply(&self, update: Update, done: Completion) {
        tracing::debug!(transition = %update.transition, operation = %update.operation, "Applying update");
        done.complete();
    }
}

type Inspector = Box<dyn Fn(&Update) + Send + Sync>;

/// Completes each update after a fixed delay on a tokio runtime, the way an
/// animation would. Unanimated updates complete on the next tick.
pub struct TimedUpdater {
    handle: Handle,
    delay: Duration,
    inspect: Option<Inspector>,
}

impl TimedUpdater {
    pub fn new(handle: Handle, delay: Duration) -> Self {
        Self {
            handle,
            delay,
            inspect: None,
        }
    }

    /// Use the runtime of the calling context. Fails outside a runtime.
    pub fn current(delay: Duration) -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self::new(Handle::try_current()?, delay))
    }

    /// Observe every update before it is scheduled.
    pub fn inspect(mut self, f: impl Fn(&Update) + Send + Sync + 'static) -> Self {
        self.inspect = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for TimedUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedUpdater")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Updater for TimedUpdater {
    fn apply(&self, update: Update, done: Completion) {
        if let Some(inspect) = &self.inspect {
            inspect(&update);
        }
        let delay = if update.operation.is_animated() {
            self.delay
        } else {
            Duration::ZERO
        };
        tracing::debug!(operation = %update.operation, delay = ?delay, "Scheduling update");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            done.complete();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_completion_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let done = Completion::new("test", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(done.label(), "test");
        done.complete();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_completion_does_not_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let done = Completion::new("dropped", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        drop(done);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timed_updater_completes_later() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let updater = TimedUpdater::current(Duration::from_millis(20)).unwrap();
        let update = Update {
            transition: TransitionId::new(),
            operation: Operation::PopToRoot { animated: true },
            screen: None,
        };
        updater.apply(
            update,
            Completion::new("pop_to_root", move || {
                let _ = tx.send(());
            }),
        );
        tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("completion timed out")
            .unwrap();
    }
}
