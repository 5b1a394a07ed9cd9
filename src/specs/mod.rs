//! # Node specifications and builders.
//!
//! This module provides the immutable data model of a supervision tree:
//! - [`Worker`], [`WorkerFn`], [`WorkerRef`] — the leaf activity contract
//! - [`StartNotifier`] — the start handshake callback
//! - [`WorkerSpec`] — worker plus restart/shutdown/tolerance policies
//! - [`SupervisorSpec`], [`Strategy`], [`StartOrder`] — internal nodes
//! - [`Node`], [`NodeKind`] — the tagged union the runtime dispatches on
//!
//! Builders are pure: no I/O, no globals. The tree is a value handed to
//! [`Tree::start`](crate::Tree::start), which validates every name before
//! any activity is spawned.

mod node;
mod supervisor;
mod worker;

pub use node::{Node, NodeKind};
pub use supervisor::{BoxResourceFuture, StartOrder, Strategy, SupervisorSpec};
pub use worker::{BoxWorkerFuture, StartNotifier, Worker, WorkerFn, WorkerRef, WorkerSpec};

pub(crate) use node::{runtime_name, validate_tree};
