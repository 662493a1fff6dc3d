//! Router core.
//!
//! # Responsibilities
//! - Hold the committed current URL and its match path
//! - Serialize transitions: start now, queue (FIFO) or reject
//! - Drive the running transition's operations through the updater
//! - Commit the target URL once, after every operation has completed
//!
//! # Data Flow
//! ```text
//! transition().to(url).start()
//!     → start_transition (running? queue : reject | launch)
//!     → launch: Transition::prepare (resolve + diff, under the state lock)
//!     → drive: poll → factory.build → updater.apply(update, completion)
//!     → completion → step_completed → drive ...
//!     → Finished: commit URL, pop queue, callback, delegate
//! ```
//!
//! # Design Decisions
//! - One home context; state behind a `Mutex` that is never held while
//!   calling the updater, a factory, a callback or the delegate
//! - Route tree is copy-on-write behind `ArcSwap`; resolution never blocks
//! - While nothing runs the queue is empty, so a new request can never
//!   overtake queued ones

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock, Weak};

use arc_swap::ArcSwap;

use crate::config::{RouterConfig, TransitionConfig};
use crate::error::{RouterError, RouterResult};
use crate::nav_url::NavUrl;
use crate::observability::metrics;
use crate::routing::{MatchPath, RouteBuilder, RouteTree};
use crate::transition::{Ack, Attributes, AttributesBuilder, Step, Transition, TransitionId, TransitionReport};
use crate::updater::{Completion, ImmediateUpdater, Update, Updater};

/// Observer of transition lifecycle events. All methods are optional.
///
/// The router holds its delegate weakly; events are skipped once it is gone.
pub trait RouterDelegate: Send + Sync {
    /// A transition was planned and is about to dispatch its first operation.
    fn will_start(&self, _report: &TransitionReport) {}

    /// A transition finished and its URL was committed.
    fn did_complete(&self, _report: &TransitionReport) {}

    /// A request failed before or instead of running.
    fn did_fail(&self, _error: &RouterError) {}
}

struct RouterState {
    current_url: NavUrl,
    current_path: MatchPath,
    running: Option<Transition>,
    queue: VecDeque<Attributes>,
}

struct Shared {
    routes: ArcSwap<RouteTree>,
    /// Serializes route writers; readers only touch `routes`.
    route_writes: Mutex<()>,
    state: Mutex<RouterState>,
    updater: RwLock<Arc<dyn Updater>>,
    delegate: RwLock<Option<Weak<dyn RouterDelegate>>>,
    defaults: TransitionConfig,
}

/// Outcome of trying to start the next transition.
#[derive(Default)]
struct Launch {
    started: Option<TransitionReport>,
    failures: Vec<(Attributes, RouterError)>,
}

/// Handle to a router. Clones share the same state.
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

impl Default for Router {
    fn default() -> Self {
        RouterBuilder::new().build()
    }
}

impl Router {
    /// Create a router with an empty route tree.
    pub fn new(updater: impl Updater + 'static) -> Self {
        RouterBuilder::new().updater(updater).build()
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    // --- Public API ---

    /// Start building a transition request.
    pub fn transition(&self) -> TransitionBuilder {
        TransitionBuilder {
            router: self.clone(),
            attributes: AttributesBuilder::with_defaults(&self.shared.defaults),
        }
    }

    /// Start, queue or reject a transition request.
    ///
    /// The outcome is always delivered through the request's completion
    /// callback, never returned.
    pub fn start_transition(&self, mut attributes: Attributes) {
        let mut state = self.lock_state();

        if let Some(running) = state.running.as_ref().map(Transition::id) {
            if attributes.should_queue() {
                tracing::debug!(
                    running = %running,
                    destination = %attributes.describe_target(),
                    queued = state.queue.len() + 1,
                    "Queueing transition"
                );
                state.queue.push_back(attributes);
                metrics::record_transition_queued(state.queue.len());
                return;
            }

            drop(state);
            let error = RouterError::TransitionInProgress {
                target: attributes.describe_target(),
            };
            tracing::warn!(error = %error, "Rejecting transition");
            metrics::record_transition_failed(error.kind());
            attributes.complete(Err(error.clone()));
            self.notify_failed(&error);
            return;
        }

        let launch = self.launch(&mut state, Some(attributes));
        drop(state);

        if self.after_launch(launch) {
            self.drive();
        }
    }

    /// Mutate the route tree. The update is all-or-nothing: on error the
    /// previous tree stays in place.
    ///
    /// Transitions already executing keep the match paths they resolved.
    /// Concurrent updates are applied one after the other. The mutator must
    /// not call back into this router's route API.
    pub fn update_routes<F>(&self, routes: F) -> RouterResult<()>
    where
        F: FnOnce(&mut RouteBuilder<'_>),
    {
        let _writer = self
            .shared
            .route_writes
            .lock()
            .expect("route writer mutex poisoned");
        let mut tree = RouteTree::clone(&self.shared.routes.load());
        tree.update(routes)?;
        tracing::info!(routes = tree.len(), "Routes updated");
        self.shared.routes.store(Arc::new(tree));
        Ok(())
    }

    /// Overwrite the current URL without running any operation or touching
    /// the updater. Fails, leaving state unchanged, if `url` does not resolve.
    pub fn force_url(&self, url: impl Into<NavUrl>) -> RouterResult<()> {
        let url = url.into();
        let path = self.shared.routes.load().resolve(&url).map_err(|e| {
            tracing::warn!(url = %url, "Cannot force unresolvable URL");
            e
        })?;

        let mut state = self.lock_state();
        tracing::info!(from = %state.current_url, to = %url, "Forcing current URL");
        state.current_url = url;
        state.current_path = path;
        Ok(())
    }

    /// Clear the current URL. Routes and queued requests are kept.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        tracing::info!(from = %state.current_url, "Resetting router");
        state.current_url = NavUrl::empty();
        state.current_path = MatchPath::empty();
    }

    // --- Readers ---

    pub fn current_url(&self) -> NavUrl {
        self.lock_state().current_url.clone()
    }

    pub fn current_path(&self) -> MatchPath {
        self.lock_state().current_path.clone()
    }

    /// Target of the running transition, if any.
    pub fn transitioning_url(&self) -> Option<NavUrl> {
        self.lock_state()
            .running
            .as_ref()
            .map(|t| t.target().clone())
    }

    pub fn is_transitioning(&self) -> bool {
        self.lock_state().running.is_some()
    }

    /// Number of requests waiting behind the running transition.
    pub fn queued(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// Snapshot of the current route tree.
    pub fn routes(&self) -> Arc<RouteTree> {
        self.shared.routes.load_full()
    }

    pub fn resolve(&self, url: &NavUrl) -> RouterResult<MatchPath> {
        self.shared.routes.load().resolve(url)
    }

    // --- Collaborators ---

    pub fn set_updater(&self, updater: impl Updater + 'static) {
        *self.shared.updater.write().expect("updater lock poisoned") = Arc::new(updater);
    }

    /// Install a delegate. Only a weak reference is kept.
    pub fn set_delegate<D: RouterDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak = Arc::downgrade(delegate);
        let weak: Weak<dyn RouterDelegate> = weak;
        *self.shared.delegate.write().expect("delegate lock poisoned") = Some(weak);
    }

    pub fn clear_delegate(&self) {
        *self.shared.delegate.write().expect("delegate lock poisoned") = None;
    }

    // --- Internals ---

    fn lock_state(&self) -> MutexGuard<'_, RouterState> {
        self.shared.state.lock().expect("router state mutex poisoned")
    }

    fn updater(&self) -> Arc<dyn Updater> {
        self.shared.updater.read().expect("updater lock poisoned").clone()
    }

    fn delegate(&self) -> Option<Arc<dyn RouterDelegate>> {
        self.shared
            .delegate
            .read()
            .expect("delegate lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn notify_failed(&self, error: &RouterError) {
        if let Some(delegate) = self.delegate() {
            delegate.did_fail(error);
        }
    }

    /// Prepare `first` (or the head of the queue) and install it as the
    /// running transition. Requests that fail to resolve are collected and
    /// the next queued one is tried.
    fn launch(&self, state: &mut RouterState, first: Option<Attributes>) -> Launch {
        let tree = self.shared.routes.load_full();
        let mut launch = Launch::default();
        let mut candidate = first.or_else(|| Self::dequeue(state));

        while let Some(attributes) = candidate {
            let mut transition = Transition::new(attributes);
            match transition.prepare(&state.current_url, &state.current_path, &tree) {
                Ok(()) => {
                    launch.started = Some(transition.report());
                    state.running = Some(transition);
                    break;
                }
                Err(error) => launch.failures.push((transition.into_attributes(), error)),
            }
            candidate = Self::dequeue(state);
        }

        launch
    }

    fn dequeue(state: &mut RouterState) -> Option<Attributes> {
        let next = state.queue.pop_front()?;
        metrics::record_queue_depth(state.queue.len());
        Some(next)
    }

    /// Report failures and announce the started transition. Must be called
    /// without the state lock. Returns true if a transition is now running.
    fn after_launch(&self, launch: Launch) -> bool {
        for (mut attributes, error) in launch.failures {
            tracing::warn!(destination = %attributes.describe_target(), error = %error, "Transition aborted");
            metrics::record_transition_failed(error.kind());
            attributes.complete(Err(error.clone()));
            self.notify_failed(&error);
        }

        let Some(report) = launch.started else {
            return false;
        };
        tracing::info!(
            transition_id = %report.id,
            from = %report.from,
            to = %report.to,
            operations = report.operations,
            "Transition started"
        );
        metrics::record_transition_started();
        if let Some(delegate) = self.delegate() {
            delegate.will_start(&report);
        }
        true
    }

    /// Dispatch loop. Runs until the running transition waits on an
    /// asynchronous completion or nothing is left to run.
    fn drive(&self) {
        loop {
            let (id, index, operation, context) = {
                let mut state = self.lock_state();
                let Some(transition) = state.running.as_mut() else {
                    return;
                };
                match transition.poll() {
                    Step::Dispatch {
                        index,
                        operation,
                        context,
                    } => (transition.id(), index, operation, context),
                    Step::Waiting => return,
                    Step::Finished => {
                        let finished = state.running.take();
                        let launch = match finished {
                            Some(finished) => {
                                state.current_url = finished.target().clone();
                                state.current_path = finished.target_path().clone();
                                let launch = self.launch(&mut state, None);
                                drop(state);
                                self.finish(finished);
                                launch
                            }
                            None => return,
                        };
                        if self.after_launch(launch) {
                            continue;
                        }
                        return;
                    }
                }
            };

            let screen = operation
                .node()
                .map(|node| node.route().factory().build(node, &context));
            tracing::debug!(transition_id = %id, index, operation = %operation, "Dispatching operation");
            metrics::record_operation(operation.kind());

            let completion = self.completion_for(id, index, operation.kind());
            let update = Update {
                transition: id,
                operation,
                screen,
            };
            self.updater().apply(update, completion);
        }
    }

    /// Deliver the outcome of a committed transition.
    fn finish(&self, mut transition: Transition) {
        let report = transition.report();
        tracing::info!(
            transition_id = %report.id,
            url = %report.to,
            elapsed = ?transition.elapsed(),
            "Transition completed"
        );
        metrics::record_transition_completed(transition.elapsed());
        transition.complete(Ok(report.clone()));
        if let Some(delegate) = self.delegate() {
            delegate.did_complete(&report);
        }
    }

    fn completion_for(&self, id: TransitionId, index: usize, kind: &str) -> Completion {
        let shared = Arc::downgrade(&self.shared);
        Completion::new(format!("{}#{} {}", id, index, kind), move || {
            if let Some(shared) = shared.upgrade() {
                Router { shared }.step_completed(id, index);
            }
        })
    }

    fn step_completed(&self, id: TransitionId, index: usize) {
        let ack = {
            let mut state = self.lock_state();
            match state.running.as_mut() {
                Some(transition) if transition.id() == id => transition.acknowledge(index),
                _ => Ack::Stale,
            }
        };

        match ack {
            Ack::Resume => self.drive(),
            Ack::Absorbed => {}
            Ack::Stale => {
                tracing::warn!(transition_id = %id, index, "Ignoring stale or duplicate completion");
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Router")
            .field("current_url", &state.current_url)
            .field("running", &state.running)
            .field("queued", &state.queue.len())
            .finish()
    }
}

/// Construction of a [`Router`].
#[must_use]
pub struct RouterBuilder {
    updater: Arc<dyn Updater>,
    routes: RouteTree,
    defaults: TransitionConfig,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            updater: Arc::new(ImmediateUpdater),
            routes: RouteTree::new(),
            defaults: TransitionConfig::default(),
        }
    }

    pub fn updater(mut self, updater: impl Updater + 'static) -> Self {
        self.updater = Arc::new(updater);
        self
    }

    pub fn shared_updater(mut self, updater: Arc<dyn Updater>) -> Self {
        self.updater = updater;
        self
    }

    pub fn routes<F>(mut self, routes: F) -> RouterResult<Self>
    where
        F: FnOnce(&mut RouteBuilder<'_>),
    {
        self.routes.update(routes)?;
        Ok(self)
    }

    pub fn defaults(mut self, defaults: TransitionConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Take transition defaults and routes from configuration.
    pub fn config(mut self, config: &RouterConfig) -> RouterResult<Self> {
        self.defaults = config.transitions.clone();
        self.routes.update(|r| config.register_into(r))?;
        Ok(self)
    }

    pub fn build(self) -> Router {
        Router {
            shared: Arc::new(Shared {
                routes: ArcSwap::from_pointee(self.routes),
                route_writes: Mutex::new(()),
                state: Mutex::new(RouterState {
                    current_url: NavUrl::empty(),
                    current_path: MatchPath::empty(),
                    running: None,
                    queue: VecDeque::new(),
                }),
                updater: RwLock::new(self.updater),
                delegate: RwLock::new(None),
                defaults: self.defaults,
            }),
        }
    }
}

/// Fluent transition request bound to a router.
#[must_use]
pub struct TransitionBuilder {
    router: Router,
    attributes: AttributesBuilder,
}

impl TransitionBuilder {
    pub fn to(mut self, url: impl Into<NavUrl>) -> Self {
        self.attributes = self.attributes.to(url);
        self
    }

    pub fn push<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = self.attributes.push(segments);
        self
    }

    pub fn pop(mut self, count: usize) -> Self {
        self.attributes = self.attributes.pop(count);
        self
    }

    pub fn root(mut self) -> Self {
        self.attributes = self.attributes.root();
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.param(name, value);
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.attributes = self.attributes.animated(animated);
        self
    }

    pub fn queued(mut self) -> Self {
        self.attributes = self.attributes.queued();
        self
    }

    pub fn should_queue(mut self, should_queue: bool) -> Self {
        self.attributes = self.attributes.should_queue(should_queue);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes = self.attributes.context(key, value);
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(Result<TransitionReport, RouterError>) + Send + 'static,
    ) -> Self {
        self.attributes = self.attributes.on_complete(callback);
        self
    }

    /// Finish without starting.
    pub fn build(self) -> Attributes {
        self.attributes.build()
    }

    pub fn start(self) {
        let attributes = self.attributes.build();
        self.router.start_transition(attributes);
    }
}

static SHARED: OnceLock<Router> = OnceLock::new();

/// Process-wide router, created with defaults and an [`ImmediateUpdater`] on
/// first access. Prefer passing an explicit [`Router`]; this is meant for
/// the application's top level.
pub fn shared() -> &'static Router {
    SHARED.get_or_init(Router::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::MatchedNode;
    use crate::screen::{Context, Screen, ScreenFactory};

    fn screen(name: &'static str) -> impl ScreenFactory {
        move |_: &MatchedNode, _: &Context| -> Screen { Box::new(name) }
    }

    fn router() -> Router {
        Router::builder()
            .routes(|r| {
                r.route("/home", screen("home"))
                    .route("/list/:id", screen("list"));
            })
            .unwrap()
            .build()
    }

    #[test]
    fn test_immediate_transition_commits() {
        let router = router();
        router.transition().to("/home").start();
        assert_eq!(router.current_url(), NavUrl::parse("/home"));
        assert_eq!(router.current_path().len(), 1);
        assert!(!router.is_transitioning());
        assert!(router.transitioning_url().is_none());
    }

    #[test]
    fn test_force_url_and_reset() {
        let router = router();
        router.force_url("/list/3").unwrap();
        assert_eq!(router.current_url().to_string(), "/list/3");

        let err = router.force_url("/nowhere").unwrap_err();
        assert_eq!(err.kind(), "no_match");
        assert_eq!(router.current_url().to_string(), "/list/3");

        router.reset();
        assert!(router.current_url().is_empty());
        assert!(router.current_path().is_empty());
        assert_eq!(router.routes().len(), 2);
    }

    #[test]
    fn test_update_routes_is_all_or_nothing() {
        let router = router();
        let result = router.update_routes(|r| {
            r.route("/new", screen("new")).route("/bad/:", screen("bad"));
        });
        assert!(result.is_err());
        assert!(router.routes().get("/new").is_none());

        router
            .update_routes(|r| {
                r.route("/new", screen("new"));
            })
            .unwrap();
        assert!(router.resolve(&NavUrl::parse("/new")).is_ok());
    }

    #[derive(Default)]
    struct GaugeValue(Mutex<f64>);

    impl ::metrics::GaugeFn for GaugeValue {
        fn increment(&self, value: f64) {
            *self.0.lock().unwrap() += value;
        }

        fn decrement(&self, value: f64) {
            *self.0.lock().unwrap() -= value;
        }

        fn set(&self, value: f64) {
            *self.0.lock().unwrap() = value;
        }
    }

    /// Keeps gauges only; counters and histograms are discarded.
    #[derive(Default)]
    struct GaugeRecorder {
        gauges: Mutex<std::collections::HashMap<String, Arc<GaugeValue>>>,
    }

    impl GaugeRecorder {
        fn gauge(&self, name: &str) -> Option<f64> {
            self.gauges
                .lock()
                .unwrap()
                .get(name)
                .map(|g| *g.0.lock().unwrap())
        }
    }

    impl ::metrics::Recorder for GaugeRecorder {
        fn describe_counter(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn describe_gauge(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn describe_histogram(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn register_counter(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Counter {
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, key: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            let value = self
                .gauges
                .lock()
                .unwrap()
                .entry(key.name().to_string())
                .or_default()
                .clone();
            ::metrics::Gauge::from_arc(value)
        }

        fn register_histogram(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    #[test]
    fn test_queue_depth_gauge_tracks_drain() {
        let held: Arc<Mutex<Vec<Completion>>> = Arc::default();
        let sink = held.clone();
        let router = Router::builder()
            .updater(move |_update: Update, done: Completion| sink.lock().unwrap().push(done))
            .routes(|r| {
                r.route("/a", screen("a"))
                    .route("/b", screen("b"))
                    .route("/c", screen("c"));
            })
            .unwrap()
            .build();

        let recorder = GaugeRecorder::default();
        ::metrics::with_local_recorder(&recorder, || {
            router.transition().to("/a").start();
            router.transition().to("/b").queued().start();
            router.transition().to("/c").queued().start();
            assert_eq!(recorder.gauge("nav_queue_depth"), Some(2.0));

            let first = held.lock().unwrap().pop().unwrap();
            first.complete();
            assert_eq!(router.queued(), 1);
            assert_eq!(recorder.gauge("nav_queue_depth"), Some(1.0));

            loop {
                let next = held.lock().unwrap().pop();
                match next {
                    Some(done) => done.complete(),
                    None => break,
                }
            }
        });

        assert_eq!(router.queued(), 0);
        assert_eq!(router.current_url().to_string(), "/c");
        assert_eq!(recorder.gauge("nav_queue_depth"), Some(0.0));
    }

    #[test]
    fn test_concurrent_route_updates_are_all_kept() {
        let router = router();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let router = router.clone();
                scope.spawn(move || {
                    for j in 0..10 {
                        let pattern = format!("/t{}/r{}", i, j);
                        router
                            .update_routes(|r| {
                                r.route(&pattern, screen("t"));
                            })
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(router.routes().len(), 2 + 80);
    }

    #[test]
    fn test_committed_url_keeps_reserved_segment_characters() {
        let router = router();
        router.transition().push(["list", "a/b?c"]).start();

        let current = router.current_url();
        assert_eq!(current.segments(), &["list".to_string(), "a/b?c".to_string()]);
        assert_eq!(current.to_string(), "/list/a%2Fb%3Fc");
        assert_eq!(NavUrl::parse(&current.to_string()), current);
        assert_eq!(
            router.current_path().leaf().unwrap().param("id"),
            Some("a/b?c")
        );
    }

    #[test]
    fn test_shared_router_is_singleton() {
        assert!(std::ptr::eq(shared(), shared()));
    }
}
