//! # Child-to-parent terminal notifications.
//!
//! A [`ChildNotification`] is the single value a node posts when it reaches
//! a terminal state. It is offered to two inboxes: the parent's supervision
//! inbox (driving restart logic) and the per-child terminating inbox
//! (awaited during shutdown). Exactly one consumer sees it.

use crate::error::{NodeError, WorkerError};
use crate::specs::NodeKind;

/// Terminal notification posted by a child to its supervisor.
#[derive(Debug, Clone)]
pub(crate) struct ChildNotification {
    /// Runtime name of the child instance, e.g. `root/branch0/child1`.
    pub runtime_name: String,
    /// Spec name of the child (last path segment), used by the supervisor to
    /// find the spec when restarting.
    pub name: String,
    /// Kind tag of the source node.
    pub kind: NodeKind,
    /// Terminal error, if any. `None` is a clean return.
    pub error: Option<NodeError>,
}

impl ChildNotification {
    /// True when the outcome counts as a failure for restart classification.
    pub(crate) fn is_failure(&self) -> bool {
        self.error.as_ref().is_some_and(NodeError::is_failure)
    }

    /// Collapses the notification into a termination result.
    ///
    /// Cooperative cancellation is a clean return.
    pub(crate) fn into_result(self) -> Result<(), NodeError> {
        match self.error {
            None | Some(NodeError::Worker(WorkerError::Canceled)) => Ok(()),
            Some(err) => Err(err),
        }
    }
}
