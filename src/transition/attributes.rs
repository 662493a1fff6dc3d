//! Transition request attributes and their builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::TransitionConfig;
use crate::error::RouterError;
use crate::nav_url::NavUrl;
use crate::screen::Context;
use crate::transition::TransitionReport;

/// Callback receiving the outcome of a transition request.
pub type TransitionCallback = Box<dyn FnOnce(Result<TransitionReport, RouterError>) + Send>;

/// Where a transition should go.
///
/// Relative destinations are resolved against the router's current URL when
/// the transition starts, not when the request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Absolute target URL.
    Url(NavUrl),
    /// Append segments to the current URL.
    Push(Vec<String>),
    /// Drop trailing segments of the current URL.
    Pop(usize),
    /// The empty URL.
    Root,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Url(url) => write!(f, "{}", url),
            Destination::Push(segments) => write!(f, "+/{}", segments.join("/")),
            Destination::Pop(count) => write!(f, "-{}", count),
            Destination::Root => f.write_str("/"),
        }
    }
}

/// Description of one requested transition.
pub struct Attributes {
    destination: Destination,
    params: BTreeMap<String, String>,
    animated: bool,
    should_queue: bool,
    context: Context,
    completion: Option<TransitionCallback>,
    from: Option<NavUrl>,
}

impl Attributes {
    pub fn builder() -> AttributesBuilder {
        AttributesBuilder::default()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn should_queue(&self) -> bool {
        self.should_queue
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// URL the transition started from; set by the router right before
    /// execution.
    pub fn from(&self) -> Option<&NavUrl> {
        self.from.as_ref()
    }

    /// The absolute target, available once `from` has been stamped.
    pub fn target(&self) -> Option<NavUrl> {
        self.from.as_ref().map(|from| self.resolve_target(from))
    }

    /// Compute the absolute target relative to `from`. Extra parameters are
    /// merged on top; relative moves do not inherit `from`'s parameters.
    pub fn resolve_target(&self, from: &NavUrl) -> NavUrl {
        let base = match &self.destination {
            Destination::Url(url) => url.clone(),
            Destination::Push(segments) => from.without_params().appending(segments.iter().cloned()),
            Destination::Pop(count) => from.without_params().popping(*count),
            Destination::Root => NavUrl::empty(),
        };
        base.with_params(self.params.clone())
    }

    /// Human-readable target for log lines and errors, before resolution.
    pub fn describe_target(&self) -> String {
        match self.target() {
            Some(url) => url.to_string(),
            None if self.params.is_empty() => self.destination.to_string(),
            None => format!(
                "{}{}",
                self.destination,
                NavUrl::empty().with_params(self.params.clone()).to_string().trim_start_matches('/')
            ),
        }
    }

    pub(crate) fn stamp_from(&mut self, from: NavUrl) {
        self.from = Some(from);
    }

    /// Deliver the outcome to the completion callback, if any.
    pub(crate) fn complete(&mut self, result: Result<TransitionReport, RouterError>) {
        if let Some(callback) = self.completion.take() {
            callback(result);
        }
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("destination", &self.destination)
            .field("params", &self.params)
            .field("animated", &self.animated)
            .field("should_queue", &self.should_queue)
            .field("context", &self.context)
            .field("has_completion", &self.completion.is_some())
            .field("from", &self.from)
            .finish()
    }
}

/// Fluent construction of [`Attributes`].
#[must_use]
pub struct AttributesBuilder {
    destination: Destination,
    params: BTreeMap<String, String>,
    animated: bool,
    should_queue: bool,
    context: Context,
    completion: Option<TransitionCallback>,
}

impl Default for AttributesBuilder {
    fn default() -> Self {
        Self::with_defaults(&TransitionConfig::default())
    }
}

impl AttributesBuilder {
    /// Start from configured defaults for animation and queueing.
    pub fn with_defaults(defaults: &TransitionConfig) -> Self {
        Self {
            destination: Destination::Root,
            params: BTreeMap::new(),
            animated: defaults.animated,
            should_queue: defaults.queue,
            context: Context::new(),
            completion: None,
        }
    }

    /// Absolute target URL.
    pub fn to(mut self, url: impl Into<NavUrl>) -> Self {
        self.destination = Destination::Url(url.into());
        self
    }

    /// Append segments to the current URL.
    pub fn push<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destination = Destination::Push(segments.into_iter().map(Into::into).collect());
        self
    }

    /// Drop `count` trailing segments of the current URL.
    pub fn pop(mut self, count: usize) -> Self {
        self.destination = Destination::Pop(count);
        self
    }

    /// Clear the stack.
    pub fn root(mut self) -> Self {
        self.destination = Destination::Root;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Queue behind a running transition instead of failing.
    pub fn queued(mut self) -> Self {
        self.should_queue = true;
        self
    }

    pub fn should_queue(mut self, should_queue: bool) -> Self {
        self.should_queue = should_queue;
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(Result<TransitionReport, RouterError>) + Send + 'static,
    ) -> Self {
        self.completion = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Attributes {
        Attributes {
            destination: self.destination,
            params: self.params,
            animated: self.animated,
            should_queue: self.should_queue,
            context: self.context,
            completion: self.completion,
            from: None,
        }
    }
}
