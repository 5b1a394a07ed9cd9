//! # treevisor
//!
//! **Treevisor** is a library for building **supervision trees** for
//! long-running concurrent activities, directly inspired by Erlang/OTP
//! supervision.
//!
//! A tree of nodes where each internal node (a *supervisor*) starts,
//! monitors, restarts, and shuts down its children (workers or
//! sub-supervisors). A worker failure is first handled by its immediate
//! supervisor according to a *restart policy*; when the supervisor's *error
//! tolerance* is exceeded, the failure escalates upward until it is
//! contained or reaches the root and terminates the whole tree.
//!
//! ## Features
//!
//! | Area               | Description                                                        | Key types / traits                          |
//! |--------------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Specs**          | Pure, composable builders for workers and supervisors.             | [`WorkerSpec`], [`SupervisorSpec`], [`Node`] |
//! | **Policies**       | Restart, shutdown, and tolerance policies per child.               | [`Restart`], [`Shutdown`], [`Tolerance`]    |
//! | **Supervision**    | Ordered start, restart loop, reverse shutdown, escalation.         | [`Tree`], [`TreeHandle`]                    |
//! | **Events**         | Typed lifecycle stream, one event per transition, emission order.  | [`Event`], [`EventKind`]                    |
//! | **Observers**      | Non-blocking fan-out to pluggable subscribers.                     | [`Subscribe`], [`LogSubscriber`]            |
//! | **Errors**         | Structured aggregates with cause chains and `kvs()` projections.   | [`SupervisorError`], [`SupervisorRestartError`] |
//!
//! ## Guarantees
//!
//! - Per supervisor, child starts are strictly serialized in declared order;
//!   shutdown is the exact reverse of the start order. This holds
//!   recursively: a subtree is fully up before its next sibling starts.
//! - In the event stream, **workers start before their supervisor**: a
//!   supervisor's `SupervisorStarted` marks "the whole subtree is up".
//! - Restart reuses the child's runtime name.
//! - Cancellation is cooperative; activities that ignore it are bounded by
//!   their [`Shutdown`] policy, declared leaked, and reported — never
//!   killed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use treevisor::{
//!     Config, LogSubscriber, Restart, StartNotifier, SupervisorSpec, Tree, WorkerError,
//!     WorkerFn, WorkerSpec,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Define a worker: signal started, then run until cancelled.
//!     let hello = WorkerFn::arc(
//!         "hello",
//!         |ctx: CancellationToken, started: StartNotifier| async move {
//!             started.success();
//!             ctx.cancelled().await;
//!             Ok::<_, WorkerError>(())
//!         },
//!     );
//!
//!     // Assemble the tree as a value.
//!     let root = SupervisorSpec::new("root")
//!         .with_children(vec![WorkerSpec::new(hello).with_restart(Restart::Permanent)]);
//!
//!     // Start it, observing lifecycle events on stdout.
//!     let tree = Tree::new(Config::default(), vec![Arc::new(LogSubscriber) as _]);
//!     let handle = tree.start(root).await?;
//!
//!     // Cooperative shutdown; children stop in reverse start order.
//!     handle.terminate().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod policies;
mod specs;
mod subscribers;
mod tree;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{
    NodeError, ResourceError, StartError, SupervisorError, SupervisorRestartError,
    ToleranceExceeded, WorkerError,
};
pub use events::{Bus, Event, EventKind};
pub use policies::{FailureWindow, Restart, Shutdown, Tolerance};
pub use specs::{
    BoxResourceFuture, BoxWorkerFuture, Node, NodeKind, StartNotifier, StartOrder, Strategy,
    SupervisorSpec, Worker, WorkerFn, WorkerRef, WorkerSpec,
};
pub use subscribers::{LogSubscriber, Subscribe, SubscriberSet};
pub use tree::{Tree, TreeHandle};
