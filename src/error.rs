//! # Error types used by the supervision runtime and workers.
//!
//! The taxonomy follows the failure surface of a supervision tree:
//!
//! - [`WorkerError`] — terminal outcome of one worker run.
//! - [`StartError`] — a node failed before reaching running; for supervisors
//!   it carries the rollback result of already-started siblings.
//! - [`ToleranceExceeded`] — the sliding-window accountant rejected a restart.
//! - [`SupervisorError`] — aggregate produced when terminating a subtree
//!   fails: per-child termination errors plus an optional resource-cleanup
//!   error.
//! - [`SupervisorRestartError`] — produced when tolerance is exceeded;
//!   carries the triggering error and whatever went wrong tearing the
//!   siblings down.
//! - [`NodeError`] — the union that flows through child notifications and
//!   error maps.
//!
//! All types are `Clone` (reasons are rendered strings) so a notification
//! can be offered to both supervisor inboxes.
//! `#[source]` chains make the original worker error discoverable by descent;
//! the aggregates additionally expose a [`kvs`](SupervisorError::kvs)
//! key/value projection for structured logging.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Terminal outcome of one worker run.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum WorkerError {
    /// The worker returned an error.
    #[error("execution failed: {reason}")]
    Fail {
        /// Rendered failure reason.
        reason: String,
    },

    /// The worker panicked and the panic was captured.
    #[error("panicked: {reason}")]
    Panicked {
        /// Rendered panic payload.
        reason: String,
    },

    /// The worker observed cancellation and exited.
    ///
    /// This is **not a failure**: restart classification and termination
    /// treat it as a clean return.
    #[error("context canceled")]
    Canceled,
}

impl WorkerError {
    /// Creates a [`WorkerError::Fail`] from any displayable reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkerError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Panicked { .. } => "worker_panicked",
            WorkerError::Canceled => "worker_canceled",
        }
    }
}

/// Error from a supervisor's optional resource acquire/release pair.
#[derive(Error, Debug, Clone)]
#[error("resource error: {reason}")]
pub struct ResourceError {
    /// Rendered failure reason.
    pub reason: String,
}

impl ResourceError {
    /// Creates a resource error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A node failed before reaching running.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum StartError {
    /// The spec tree is malformed (empty name, `/` in a name, duplicate
    /// sibling names).
    #[error("invalid node spec '{name}': {reason}")]
    InvalidSpec {
        /// Offending spec name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The start function reported failure through its notifier, or returned
    /// an error before notifying.
    #[error("node '{runtime_name}' failed to start: {reason}")]
    Start {
        /// Runtime name of the failed node.
        runtime_name: String,
        /// Rendered start failure.
        reason: String,
    },

    /// The worker returned `Ok` before signalling started.
    #[error("node '{runtime_name}' returned before signalling start")]
    PrematureExit {
        /// Runtime name of the failed node.
        runtime_name: String,
    },

    /// The supervisor's `on_start` resource acquisition failed.
    #[error("resource acquisition failed for supervisor '{runtime_name}'")]
    Resource {
        /// Runtime name of the supervisor.
        runtime_name: String,
        /// The acquisition error.
        #[source]
        source: ResourceError,
    },

    /// A child failed to start; previously started siblings were rolled back.
    #[error("supervisor '{runtime_name}' failed to start")]
    Supervisor {
        /// Runtime name of the supervisor whose start procedure failed.
        runtime_name: String,
        /// The failing child's start error.
        #[source]
        cause: Box<StartError>,
        /// Errors from rolling the started siblings back, if any.
        rollback: Option<Box<SupervisorError>>,
    },
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::InvalidSpec { .. } => "invalid_spec",
            StartError::Start { .. } => "start_failed",
            StartError::PrematureExit { .. } => "premature_exit",
            StartError::Resource { .. } => "resource_failed",
            StartError::Supervisor { .. } => "supervisor_start_failed",
        }
    }
}

/// Error carried by a child's terminal notification or produced while
/// terminating it.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    /// A worker run ended with an error or captured panic.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Restarting the node failed before it reached running again.
    #[error(transparent)]
    Start(Box<StartError>),

    /// The node did not report termination within its shutdown timeout; the
    /// activity is considered leaked.
    #[error("shutdown timeout {timeout:?} elapsed; node '{runtime_name}' leaked")]
    ShutdownTimeout {
        /// Runtime name of the leaked node.
        runtime_name: String,
        /// The elapsed shutdown bound.
        timeout: Duration,
    },

    /// A subtree failed to terminate cleanly.
    #[error(transparent)]
    Termination(Box<SupervisorError>),

    /// A subtree gave up restarting one of its children.
    #[error(transparent)]
    Restart(Box<SupervisorRestartError>),
}

impl NodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeError::Worker(e) => e.as_label(),
            NodeError::Start(_) => "start_failed",
            NodeError::ShutdownTimeout { .. } => "shutdown_timeout",
            NodeError::Termination(_) => "termination_failed",
            NodeError::Restart(_) => "tolerance_exceeded",
        }
    }

    /// True when the outcome counts as a failure for restart classification.
    ///
    /// Cooperative cancellation is a clean return.
    pub fn is_failure(&self) -> bool {
        !matches!(self, NodeError::Worker(WorkerError::Canceled))
    }
}

/// The sliding-window accountant rejected a restart.
#[derive(Error, Debug, Clone)]
#[error(
    "node '{runtime_name}' surpassed error tolerance: \
     {max_failures} failures within {window:?}"
)]
pub struct ToleranceExceeded {
    /// Runtime name of the child whose failures exceeded tolerance.
    pub runtime_name: String,
    /// Failures tolerated within the window.
    pub max_failures: u32,
    /// Width of the sliding window.
    pub window: Duration,
    /// The failure that tripped the accountant. `None` when a clean return
    /// under `Permanent` restart exceeded tolerance.
    #[source]
    pub cause: Option<Box<NodeError>>,
}

impl ToleranceExceeded {
    /// Returns a data bag that may be used in structured logging.
    pub fn kvs(&self) -> BTreeMap<String, String> {
        let mut kvs = BTreeMap::new();
        kvs.insert("node.name".to_owned(), self.runtime_name.clone());
        kvs.insert(
            "node.max.failures".to_owned(),
            self.max_failures.to_string(),
        );
        kvs.insert("node.error.window".to_owned(), format!("{:?}", self.window));
        if let Some(cause) = &self.cause {
            kvs.insert("node.error".to_owned(), cause.to_string());
        }
        kvs
    }
}

/// Termination of a subtree failed.
///
/// Collects everything that went wrong while bringing a supervisor's
/// children down: the error that triggered the termination (if any), the
/// per-child termination errors keyed by runtime name, and the optional
/// resource-cleanup error.
#[derive(Error, Debug, Clone)]
#[error("supervision tree termination failed at '{runtime_name}'")]
pub struct SupervisorError {
    /// Runtime name of the supervisor whose termination failed.
    pub runtime_name: String,
    /// The error that triggered the termination, if the termination was
    /// itself a reaction to a failure.
    #[source]
    pub cause: Option<Box<NodeError>>,
    /// Error from the `on_cleanup` resource callback, if one was registered
    /// and failed.
    pub cleanup: Option<ResourceError>,
    /// Per-child termination errors, keyed by the child's runtime name.
    pub children: BTreeMap<String, NodeError>,
}

impl SupervisorError {
    /// Number of children that failed to terminate correctly.
    ///
    /// A child that fails because of a shutdown timeout may leak: there is
    /// no way to kill an activity that ignores cooperative cancellation.
    pub fn failed_child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a data bag that may be used in structured logging.
    pub fn kvs(&self) -> BTreeMap<String, String> {
        let mut kvs = BTreeMap::new();
        kvs.insert("supervisor.name".to_owned(), self.runtime_name.clone());
        for (child, err) in &self.children {
            kvs.insert(
                format!("supervisor.node.{child}.stop.error"),
                err.to_string(),
            );
        }
        if let Some(cause) = &self.cause {
            kvs.insert("supervisor.termination.error".to_owned(), cause.to_string());
        }
        if let Some(cleanup) = &self.cleanup {
            kvs.insert("supervisor.cleanup.error".to_owned(), cleanup.to_string());
        }
        kvs
    }
}

/// A supervisor gave up restarting a child.
///
/// Produced when the tolerance accountant rejects a restart: carries the
/// triggering [`ToleranceExceeded`] and, when tearing the remaining siblings
/// down also failed, the termination aggregate.
#[derive(Error, Debug, Clone)]
#[error("worker surpassed error tolerance at '{runtime_name}'")]
pub struct SupervisorRestartError {
    /// Runtime name of the supervisor that escalated.
    pub runtime_name: String,
    /// The rejection that triggered the escalation.
    #[source]
    pub tolerance: ToleranceExceeded,
    /// What went wrong while terminating the remaining siblings, if anything.
    pub termination: Option<SupervisorError>,
}

impl SupervisorRestartError {
    /// Returns a data bag merging the tolerance rejection and the sibling
    /// termination errors.
    pub fn kvs(&self) -> BTreeMap<String, String> {
        let mut kvs = self.tolerance.kvs();
        if let Some(termination) = &self.termination {
            kvs.extend(termination.kvs());
        }
        kvs.insert("supervisor.name".to_owned(), self.runtime_name.clone());
        kvs
    }
}
