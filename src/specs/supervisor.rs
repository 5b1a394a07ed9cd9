//! # Supervisor specification and builders.
//!
//! [`SupervisorSpec`] is the immutable description of an internal tree node:
//! its name, supervision strategy, child start order, error tolerance, the
//! ordered list of children, and an optional resource acquire/release pair
//! scoped around the subtree's lifetime.
//!
//! Builders are pure and composable; the declared call order of
//! [`with_children`](SupervisorSpec::with_children) /
//! [`with_subtree`](SupervisorSpec::with_subtree) fixes the start order of
//! the children (reversed under [`StartOrder::RightToLeft`]). Shutdown order
//! is always the exact reverse of the start order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ResourceError;
use crate::policies::Tolerance;
use crate::specs::node::Node;
use crate::specs::worker::WorkerSpec;

/// Supervision strategy applied when a child must be restarted.
///
/// Only [`Strategy::OneForOne`] is implemented; the enum is the extension
/// point for `AllForOne`/`RestForOne` style strategies.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Restart only the child that terminated (default).
    #[default]
    OneForOne,
}

/// Order in which a supervisor starts its declared children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StartOrder {
    /// Start children in declaration order (default).
    #[default]
    LeftToRight,
    /// Start children in reverse declaration order.
    RightToLeft,
}

/// Boxed future returned by a resource acquire/release callback.
pub type BoxResourceFuture =
    Pin<Box<dyn Future<Output = Result<(), ResourceError>> + Send + 'static>>;

/// Shared resource callback; each invocation creates a fresh future.
pub(crate) type ResourceFn = Arc<dyn Fn() -> BoxResourceFuture + Send + Sync>;

/// Immutable specification of a supervisor node.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use treevisor::{StartNotifier, StartOrder, SupervisorSpec, WorkerError, WorkerFn, WorkerSpec};
///
/// let worker = |name: &'static str| {
///     WorkerSpec::new(WorkerFn::arc(
///         name,
///         |ctx: CancellationToken, started: StartNotifier| async move {
///             started.success();
///             ctx.cancelled().await;
///             Ok::<_, WorkerError>(())
///         },
///     ))
/// };
///
/// let root = SupervisorSpec::new("root")
///     .with_children(vec![worker("c0"), worker("c1")])
///     .with_subtree(SupervisorSpec::new("branch").with_children(vec![worker("c2")]))
///     .with_order(StartOrder::LeftToRight);
///
/// assert_eq!(root.name(), "root");
/// assert_eq!(root.children().len(), 3);
/// ```
#[derive(Clone)]
pub struct SupervisorSpec {
    name: String,
    strategy: Strategy,
    order: StartOrder,
    tolerance: Tolerance,
    children: Vec<Node>,
    on_start: Option<ResourceFn>,
    on_cleanup: Option<ResourceFn>,
}

impl SupervisorSpec {
    /// Creates an empty supervisor spec with default strategy, order, and
    /// tolerance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: Strategy::default(),
            order: StartOrder::default(),
            tolerance: Tolerance::default(),
            children: Vec::new(),
            on_start: None,
            on_cleanup: None,
        }
    }

    /// Appends worker children, preserving iteration order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = WorkerSpec>) -> Self {
        self.children.extend(children.into_iter().map(Node::Worker));
        self
    }

    /// Appends a nested supervisor at the current position in the child
    /// sequence.
    pub fn with_subtree(mut self, subtree: SupervisorSpec) -> Self {
        self.children.push(Node::Supervisor(subtree));
        self
    }

    /// Sets the child start order.
    pub fn with_order(mut self, order: StartOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the supervision strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the error tolerance consulted by this supervisor's parent.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Registers a resource acquire/release pair scoped around the subtree.
    ///
    /// `on_start` runs before any child is started; its error fails the
    /// supervisor's start. `on_cleanup` runs after every child is down; its
    /// error is recorded in the termination aggregate.
    pub fn with_start_cleanup_resources<S, SF, C, CF>(mut self, on_start: S, on_cleanup: C) -> Self
    where
        S: Fn() -> SF + Send + Sync + 'static,
        SF: Future<Output = Result<(), ResourceError>> + Send + 'static,
        C: Fn() -> CF + Send + Sync + 'static,
        CF: Future<Output = Result<(), ResourceError>> + Send + 'static,
    {
        self.on_start = Some(Arc::new(move || Box::pin(on_start())));
        self.on_cleanup = Some(Arc::new(move || Box::pin(on_cleanup())));
        self
    }

    /// Returns the spec name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the supervision strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the child start order.
    pub fn order(&self) -> StartOrder {
        self.order
    }

    /// Returns the error tolerance.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Returns the declared children in declaration order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn on_start(&self) -> Option<&ResourceFn> {
        self.on_start.as_ref()
    }

    pub(crate) fn on_cleanup(&self) -> Option<&ResourceFn> {
        self.on_cleanup.as_ref()
    }
}
