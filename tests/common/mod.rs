//! Shared utilities for router integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use nav_router::screen::{NamedScreen, ScreenDescriptor};
use nav_router::transition::TransitionReport;
use nav_router::{Completion, Router, RouterError, Update, Updater};

/// Shared log of everything an updater saw, one line per update.
pub type Log = Arc<Mutex<Vec<String>>>;

/// Render an update as `<operation>[ -> <screen name>]`.
pub fn describe(update: &Update) -> String {
    let screen = update
        .screen
        .as_ref()
        .and_then(|s| s.downcast_ref::<ScreenDescriptor>())
        .map(|s| format!(" -> {}", s.name))
        .unwrap_or_default();
    format!("{}{}", update.operation, screen)
}

/// Records every update and completes it on the spot.
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    pub log: Log,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }
}

impl Updater for RecordingUpdater {
    fn apply(&self, update: Update, done: Completion) {
        self.log.lock().unwrap().push(describe(&update));
        done.complete();
    }
}

/// Records every update and holds its completion until released by the test.
#[derive(Clone, Default)]
pub struct DeferredUpdater {
    pub log: Log,
    held: Arc<Mutex<Vec<Completion>>>,
}

impl DeferredUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    /// Number of completions waiting to be released.
    pub fn pending(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Fire the oldest held completion. Returns false if none is held.
    pub fn release(&self) -> bool {
        let next = {
            let mut held = self.held.lock().unwrap();
            if held.is_empty() {
                None
            } else {
                Some(held.remove(0))
            }
        };
        match next {
            Some(done) => {
                done.complete();
                true
            }
            None => false,
        }
    }

    /// Keep releasing until nothing is held.
    pub fn release_all(&self) {
        while self.release() {}
    }
}

impl Updater for DeferredUpdater {
    fn apply(&self, update: Update, done: Completion) {
        self.log.lock().unwrap().push(describe(&update));
        self.held.lock().unwrap().push(done);
    }
}

/// Factory producing a `ScreenDescriptor` with the given name.
pub fn screen(name: &str) -> NamedScreen {
    NamedScreen::new(name)
}

/// Outcomes delivered to completion callbacks, tagged by request label.
pub type Outcomes = Arc<Mutex<Vec<(String, Result<TransitionReport, RouterError>)>>>;

/// Start a transition to `url`, recording its outcome under `label`.
pub fn go(router: &Router, url: &str, queued: bool, outcomes: &Outcomes, label: &str) {
    let outcomes = outcomes.clone();
    let label = label.to_string();
    router
        .transition()
        .to(url)
        .should_queue(queued)
        .on_complete(move |result| outcomes.lock().unwrap().push((label, result)))
        .start();
}

/// Labels of recorded outcomes, in delivery order.
pub fn labels(outcomes: &Outcomes) -> Vec<String> {
    outcomes
        .lock()
        .unwrap()
        .iter()
        .map(|(label, _)| label.clone())
        .collect()
}
