//! # Worker runtime: one supervised activity.
//!
//! [`spawn_worker`] launches a worker as an independent task and **blocks the
//! caller** until the activity signals started (or fails to). The spawned
//! task owns the start handshake, optional panic capture, and the routing of
//! the terminal [`ChildNotification`].
//!
//! ## Contract
//! - The parent observes `Ok(RunningNode)` **only after** the worker called
//!   its [`StartNotifier`](crate::StartNotifier) with success. A worker that
//!   resolves first never reaches running; its resolution becomes the start
//!   error and no terminal notification is sent.
//! - After a successful start, the terminal outcome is posted once: to the
//!   supervision inbox while the parent's loop is consuming it, or to the
//!   per-child terminating inbox once the parent has entered shutdown and
//!   closed its supervision inbox.
//! - [`RunningNode::wait`] resolves on the terminal notification; under
//!   [`Shutdown::Timeout`] an elapsed wait yields a
//!   [`NodeError::ShutdownTimeout`] and the activity is declared leaked.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::notification::ChildNotification;
use crate::error::{NodeError, StartError, WorkerError};
use crate::policies::Shutdown;
use crate::specs::{runtime_name, NodeKind, StartNotifier, WorkerSpec};

/// Handle to a live node, owned by its parent supervisor.
///
/// Created by the node start, consumed by termination. Holds the node's
/// cancellation capability and the terminating inbox its terminal
/// notification falls back to during shutdown.
pub(crate) struct RunningNode {
    runtime_name: String,
    token: CancellationToken,
    term_rx: mpsc::Receiver<ChildNotification>,
}

impl RunningNode {
    pub(crate) fn new(
        runtime_name: String,
        token: CancellationToken,
        term_rx: mpsc::Receiver<ChildNotification>,
    ) -> Self {
        Self {
            runtime_name,
            token,
            term_rx,
        }
    }

    /// Runtime name of this node instance.
    pub(crate) fn runtime_name(&self) -> &str {
        &self.runtime_name
    }

    /// Cancels the node's context; descendants inherit the cancellation.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the terminal notification arrives, bounded by the
    /// shutdown policy.
    ///
    /// A closed inbox (the node already delivered its notification to the
    /// supervision side) counts as a clean termination. An elapsed
    /// [`Shutdown::Timeout`] declares the activity leaked; the caller records
    /// this and does not wait further.
    pub(crate) async fn wait(&mut self, shutdown: Shutdown) -> Result<(), NodeError> {
        match shutdown {
            Shutdown::Indefinite => match self.term_rx.recv().await {
                None => Ok(()),
                Some(note) => note.into_result(),
            },
            Shutdown::Timeout(timeout) => {
                match time::timeout(timeout, self.term_rx.recv()).await {
                    Ok(None) => Ok(()),
                    Ok(Some(note)) => note.into_result(),
                    Err(_elapsed) => Err(NodeError::ShutdownTimeout {
                        runtime_name: self.runtime_name.clone(),
                        timeout,
                    }),
                }
            }
        }
    }
}

/// Launches one worker activity and blocks until its start handshake.
pub(crate) async fn spawn_worker(
    spec: &WorkerSpec,
    parent_name: &str,
    parent_token: &CancellationToken,
    sup_notify_tx: mpsc::Sender<ChildNotification>,
) -> Result<RunningNode, StartError> {
    let path = runtime_name(parent_name, spec.name());
    let token = parent_token.child_token();
    let (start_tx, start_rx) = oneshot::channel();
    let (term_tx, term_rx) = mpsc::channel(1);

    let started = StartNotifier::new(&path, start_tx);
    let notifier = started.clone();
    let worker = Arc::clone(spec.worker());
    let capture = spec.capture_panics();
    let child_token = token.clone();
    let name = spec.name().to_owned();
    let task_path = path.clone();

    tokio::spawn(async move {
        let guarded =
            std::panic::AssertUnwindSafe(worker.start(child_token, started)).catch_unwind();
        let outcome = match guarded.await {
            Ok(res) => res,
            Err(panic) if capture => Err(WorkerError::Panicked {
                reason: panic_reason(panic.as_ref()),
            }),
            Err(panic) => std::panic::resume_unwind(panic),
        };

        if let Some(tx) = notifier.take() {
            // Terminated before the start handshake: the outcome becomes the
            // start error, and there is no instance to notify about.
            let err = match outcome {
                Ok(()) => StartError::PrematureExit {
                    runtime_name: task_path,
                },
                Err(e) => StartError::Start {
                    runtime_name: task_path,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(Err(err));
            return;
        }

        let note = ChildNotification {
            runtime_name: task_path,
            name,
            kind: NodeKind::Worker,
            error: outcome.err().map(NodeError::Worker),
        };
        // The supervision inbox consumes this while the parent's loop runs.
        // Once the parent enters shutdown it closes that inbox, the send
        // fails, and the value is re-offered to the terminating inbox.
        if sup_notify_tx.send(note.clone()).await.is_err() {
            let _ = term_tx.send(note).await;
        }
    });

    match start_rx.await {
        Ok(Ok(())) => Ok(RunningNode::new(path, token, term_rx)),
        Ok(Err(err)) => Err(err),
        Err(_closed) => Err(StartError::Start {
            runtime_name: path,
            reason: "worker terminated during start".to_owned(),
        }),
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
