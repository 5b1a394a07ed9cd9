//! # Tree: the public supervision surface.
//!
//! [`Tree`] owns the event bus and the subscriber bridge; [`Tree::start`]
//! runs a [`SupervisorSpec`]'s start procedure and hands back a
//! [`TreeHandle`] exposing the two ways a supervision tree ends:
//!
//! - [`TreeHandle::terminate`] — cooperative shutdown, children cancelled in
//!   reverse-of-start order; returns the aggregated result.
//! - [`TreeHandle::wait`] — block until the tree exits on its own (error
//!   tolerance exceeded at the root); returns the same aggregated result.
//!
//! The root supervisor has no parent, so any escalated error becomes the
//! return value here.
//!
//! ## Example
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use treevisor::{Config, Restart, StartNotifier, SupervisorSpec, Tree, WorkerFn, WorkerSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ticker = WorkerFn::arc(
//!         "ticker",
//!         |ctx: CancellationToken, started: StartNotifier| async move {
//!             started.success();
//!             ctx.cancelled().await;
//!             Ok::<_, treevisor::WorkerError>(())
//!         },
//!     );
//!
//!     let root = SupervisorSpec::new("root")
//!         .with_children(vec![WorkerSpec::new(ticker).with_restart(Restart::Permanent)]);
//!
//!     let tree = Tree::new(Config::default(), Vec::new());
//!     let handle = tree.start(root).await?;
//!     handle.terminate().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{spawn_supervisor, ChildNotification, RunningNode};
use crate::error::{NodeError, StartError};
use crate::events::{Bus, Event};
use crate::specs::{validate_tree, SupervisorSpec};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Entry point for running supervision trees.
///
/// Owns the event bus and bridges it to the registered subscribers. One
/// `Tree` can start any number of roots; they share the bus.
pub struct Tree {
    cfg: Config,
    bus: Bus,
}

impl Tree {
    /// Creates a tree with the given configuration and subscribers (maybe
    /// empty).
    ///
    /// When subscribers are supplied, a bridge task is spawned, so this must
    /// be called within a tokio runtime.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);

        if !subscribers.is_empty() {
            let set = SubscriberSet::new(subscribers, bus.clone());
            let mut rx = bus.subscribe();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
            });
        }

        Self { cfg, bus }
    }

    /// Returns the configuration this tree was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Creates a receiver observing every lifecycle event published after
    /// this call, in emission order.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs the root supervisor's start procedure.
    ///
    /// Validates every name in the spec tree, then blocks until the root's
    /// `SupervisorStarted` is emitted or a start failure is determined. On
    /// failure the already-started part of the tree has been rolled back.
    pub async fn start(&self, spec: SupervisorSpec) -> Result<TreeHandle, StartError> {
        self.start_with_token(spec, &CancellationToken::new()).await
    }

    /// Like [`Tree::start`], but the root's cancellation context descends
    /// from `parent`: cancelling `parent` cancels every node in the tree,
    /// equivalent to [`TreeHandle::terminate`] without consuming the handle.
    pub async fn start_with_token(
        &self,
        spec: SupervisorSpec,
        parent: &CancellationToken,
    ) -> Result<TreeHandle, StartError> {
        validate_tree(&spec)?;
        let (notify_tx, notify_rx) = mpsc::channel(1);
        let root = spawn_supervisor(spec, "", parent, notify_tx, self.bus.clone()).await?;
        Ok(TreeHandle { root, notify_rx })
    }
}

/// Handle to a running supervision tree.
pub struct TreeHandle {
    root: RunningNode,
    notify_rx: mpsc::Receiver<ChildNotification>,
}

impl std::fmt::Debug for TreeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeHandle")
            .field("runtime_name", &self.root.runtime_name())
            .finish()
    }
}

impl TreeHandle {
    /// Runtime name of the root supervisor.
    pub fn runtime_name(&self) -> &str {
        self.root.runtime_name()
    }

    /// Blocks until the tree exits on its own.
    ///
    /// The tree exits by itself only when the root supervisor escalates
    /// (error tolerance exceeded); the escalated aggregate is returned.
    pub async fn wait(mut self) -> Result<(), NodeError> {
        match self.notify_rx.recv().await {
            Some(note) => note.into_result(),
            None => Ok(()),
        }
    }

    /// Initiates cooperative shutdown and returns the aggregated result.
    ///
    /// Cancels the root's context (descendants inherit the cancellation) and
    /// blocks until the root supervisor reports terminal status.
    pub async fn terminate(mut self) -> Result<(), NodeError> {
        self.root.cancel();
        match self.notify_rx.recv().await {
            Some(note) => note.into_result(),
            None => Ok(()),
        }
    }
}
