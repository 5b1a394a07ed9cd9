//! # Supervisor runtime: ordered start, supervision loop, reverse shutdown.
//!
//! [`spawn_supervisor`] launches a supervisor as an independent task; like a
//! worker, it blocks the caller until the start handshake. The handshake
//! fires only after **every** child reported started, so a parent never
//! proceeds to the next sibling while a subtree is still booting.
//!
//! ## Start procedure
//! Children start strictly serialized in declared order (reversed under
//! `RightToLeft`). A child start failure rolls the started siblings back in
//! reverse order and fails the supervisor's own start.
//!
//! ## Supervision loop
//! ```text
//! loop {
//!   select:
//!     cancelled          → break into termination
//!     child notification → classify (restart policy × failed?)
//!                            ├─ no restart → remove from live set
//!                            ├─ restart    → record in window
//!                            │               ├─ admitted → start again, same runtime name
//!                            │               └─ rejected → escalate ToleranceExceeded
//!                            └─ unknown instance → ignore (late notification)
//! }
//! ```
//!
//! ## Termination
//! Closes the supervision inbox (late notifications re-route to the
//! per-child terminating inboxes), drains anything buffered, then cancels
//! and awaits children in reverse-of-start order, collecting per-child
//! errors. Resource cleanup runs after all children are down. The exit
//! outcome is posted to the parent as a single notification.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::notification::ChildNotification;
use crate::core::worker::{spawn_worker, RunningNode};
use crate::error::{
    NodeError, ResourceError, StartError, SupervisorError, SupervisorRestartError,
    ToleranceExceeded,
};
use crate::events::{Bus, Event, EventKind};
use crate::policies::FailureWindow;
use crate::specs::{runtime_name, Node, NodeKind, StartOrder, Strategy, SupervisorSpec};

/// One live child: the running instance, its spec, and the failure window
/// that survives restarts of the instance.
struct ChildSlot {
    spec: Node,
    window: FailureWindow,
    running: RunningNode,
}

/// Starts a node of either kind under `parent_name`.
///
/// Boxed because supervisors start supervisors.
fn start_node<'a>(
    node: &'a Node,
    parent_name: &'a str,
    parent_token: &'a CancellationToken,
    notify_tx: mpsc::Sender<ChildNotification>,
    bus: &'a Bus,
) -> BoxFuture<'a, Result<RunningNode, StartError>> {
    Box::pin(async move {
        match node {
            Node::Worker(spec) => spawn_worker(spec, parent_name, parent_token, notify_tx).await,
            Node::Supervisor(spec) => {
                spawn_supervisor(spec.clone(), parent_name, parent_token, notify_tx, bus.clone())
                    .await
            }
        }
    })
}

/// Launches a supervisor task and blocks until its subtree is up or its
/// start procedure failed.
pub(crate) async fn spawn_supervisor(
    spec: SupervisorSpec,
    parent_name: &str,
    parent_token: &CancellationToken,
    parent_notify_tx: mpsc::Sender<ChildNotification>,
    bus: Bus,
) -> Result<RunningNode, StartError> {
    let path = runtime_name(parent_name, spec.name());
    let token = parent_token.child_token();
    let (start_tx, start_rx) = oneshot::channel();
    let (term_tx, term_rx) = mpsc::channel(1);

    let runtime = SupervisorRuntime::new(spec, path.clone(), token.clone(), bus);
    tokio::spawn(runtime.run(start_tx, term_tx, parent_notify_tx));

    match start_rx.await {
        Ok(Ok(())) => Ok(RunningNode::new(path, token, term_rx)),
        Ok(Err(err)) => Err(err),
        Err(_closed) => Err(StartError::Start {
            runtime_name: path,
            reason: "supervisor terminated during start".to_owned(),
        }),
    }
}

/// State machine driving one supervisor's lifecycle.
struct SupervisorRuntime {
    spec: SupervisorSpec,
    path: String,
    token: CancellationToken,
    bus: Bus,
    live: Vec<ChildSlot>,
    notify_tx: mpsc::Sender<ChildNotification>,
    notify_rx: mpsc::Receiver<ChildNotification>,
}

impl SupervisorRuntime {
    fn new(spec: SupervisorSpec, path: String, token: CancellationToken, bus: Bus) -> Self {
        // Capacity 1: children block momentarily on terminal notification,
        // which is fine because they are exiting anyway.
        let (notify_tx, notify_rx) = mpsc::channel(1);
        Self {
            spec,
            path,
            token,
            bus,
            live: Vec::new(),
            notify_tx,
            notify_rx,
        }
    }

    async fn run(
        mut self,
        start_tx: oneshot::Sender<Result<(), StartError>>,
        term_tx: mpsc::Sender<ChildNotification>,
        parent_notify_tx: mpsc::Sender<ChildNotification>,
    ) {
        match self.start_children().await {
            Ok(()) => {
                self.emit(EventKind::SupervisorStarted, &self.path);
                let _ = start_tx.send(Ok(()));
            }
            Err(err) => {
                self.emit_err(EventKind::SupervisorStartFailed, &self.path, &err);
                let _ = start_tx.send(Err(err));
                return;
            }
        }

        let trigger = self.supervision_loop().await;
        let child_errors = self.terminate_children().await;
        let cleanup = self.release_resources().await;
        let outcome = self.exit_outcome(trigger, child_errors, cleanup);

        match &outcome {
            None => self.emit(EventKind::SupervisorTerminated, &self.path),
            Some(err) => self.emit_err(EventKind::SupervisorFailed, &self.path, err),
        }

        let note = ChildNotification {
            runtime_name: self.path.clone(),
            name: self.spec.name().to_owned(),
            kind: NodeKind::Supervisor,
            error: outcome,
        };
        if parent_notify_tx.send(note.clone()).await.is_err() {
            let _ = term_tx.send(note).await;
        }
    }

    /// Acquires resources, then starts every child in order; on a child
    /// failure rolls the started siblings back and reports a start error.
    async fn start_children(&mut self) -> Result<(), StartError> {
        if let Some(on_start) = self.spec.on_start() {
            if let Err(err) = on_start().await {
                return Err(StartError::Resource {
                    runtime_name: self.path.clone(),
                    source: err,
                });
            }
        }

        let ordered: Vec<Node> = match self.spec.order() {
            StartOrder::LeftToRight => self.spec.children().to_vec(),
            StartOrder::RightToLeft => self.spec.children().iter().rev().cloned().collect(),
        };

        for node in ordered {
            let started = start_node(
                &node,
                &self.path,
                &self.token,
                self.notify_tx.clone(),
                &self.bus,
            )
            .await;
            match started {
                Ok(running) => {
                    if matches!(node.kind(), NodeKind::Worker) {
                        self.emit(EventKind::WorkerStarted, running.runtime_name());
                    }
                    self.live.push(ChildSlot {
                        spec: node,
                        window: FailureWindow::new(),
                        running,
                    });
                }
                Err(err) => {
                    if matches!(node.kind(), NodeKind::Worker) {
                        let child_path = runtime_name(&self.path, node.name());
                        self.emit_err(EventKind::WorkerStartFailed, &child_path, &err);
                    }
                    let child_errors = self.terminate_children().await;
                    let cleanup = self.release_resources().await;
                    let rollback = if child_errors.is_empty() && cleanup.is_none() {
                        None
                    } else {
                        Some(Box::new(SupervisorError {
                            runtime_name: self.path.clone(),
                            cause: Some(Box::new(NodeError::Start(Box::new(err.clone())))),
                            cleanup,
                            children: child_errors,
                        }))
                    };
                    return Err(StartError::Supervisor {
                        runtime_name: self.path.clone(),
                        cause: Box::new(err),
                        rollback,
                    });
                }
            }
        }
        Ok(())
    }

    /// Awaits child notifications until cancelled or a restart is rejected.
    async fn supervision_loop(&mut self) -> Option<ToleranceExceeded> {
        let token = self.token.clone();
        loop {
            let note = select! {
                _ = token.cancelled() => return None,
                note = self.notify_rx.recv() => note,
            };
            // The runtime keeps a sender, so the channel cannot close here;
            // treat it like cancellation if it somehow does.
            let Some(note) = note else { return None };
            if let Some(exceeded) = self.handle_notification(note).await {
                return Some(exceeded);
            }
        }
    }

    async fn handle_notification(
        &mut self,
        note: ChildNotification,
    ) -> Option<ToleranceExceeded> {
        let Some(idx) = self
            .live
            .iter()
            .position(|slot| slot.spec.name() == note.name)
        else {
            // Late notification for an instance no longer in the live set.
            return None;
        };

        let failed = note.is_failure();
        if matches!(note.kind, NodeKind::Worker) {
            match &note.error {
                Some(err) if failed => self.emit_err(EventKind::WorkerFailed, &note.runtime_name, err),
                _ => self.emit(EventKind::WorkerTerminated, &note.runtime_name),
            }
        }

        let mut slot = self.live.remove(idx);
        if !slot.spec.restart().should_restart(failed) {
            return None;
        }

        // Every restart passes through the accountant, clean completions
        // restarted under Permanent included.
        let tolerance = slot.spec.tolerance();
        if !slot.window.record(&tolerance) {
            return Some(ToleranceExceeded {
                runtime_name: note.runtime_name,
                max_failures: tolerance.max_failures,
                window: tolerance.window,
                cause: note.error.map(Box::new),
            });
        }

        match self.spec.strategy() {
            Strategy::OneForOne => self.restart_child(idx, slot, note).await,
        }
    }

    /// Starts a new instance for the slot, reusing its runtime name and
    /// position. A failed start attempt counts against the same window.
    async fn restart_child(
        &mut self,
        idx: usize,
        mut slot: ChildSlot,
        note: ChildNotification,
    ) -> Option<ToleranceExceeded> {
        let tolerance = slot.spec.tolerance();
        loop {
            let started = start_node(
                &slot.spec,
                &self.path,
                &self.token,
                self.notify_tx.clone(),
                &self.bus,
            )
            .await;
            match started {
                Ok(running) => {
                    if matches!(slot.spec.kind(), NodeKind::Worker) {
                        self.emit(EventKind::WorkerStarted, running.runtime_name());
                    }
                    slot.running = running;
                    self.live.insert(idx, slot);
                    return None;
                }
                Err(err) => {
                    if matches!(slot.spec.kind(), NodeKind::Worker) {
                        self.emit_err(EventKind::WorkerStartFailed, &note.runtime_name, &err);
                    }
                    if !slot.window.record(&tolerance) {
                        return Some(ToleranceExceeded {
                            runtime_name: note.runtime_name.clone(),
                            max_failures: tolerance.max_failures,
                            window: tolerance.window,
                            cause: Some(Box::new(NodeError::Start(Box::new(err)))),
                        });
                    }
                }
            }
        }
    }

    /// Cancels and awaits children in reverse-of-start order, collecting
    /// per-child termination errors keyed by runtime name.
    async fn terminate_children(&mut self) -> BTreeMap<String, NodeError> {
        // Stop accepting notifications: in-flight sends fail over to the
        // per-child terminating inboxes; anything already buffered is
        // consulted before waiting on the corresponding child.
        self.notify_rx.close();
        let mut pending: BTreeMap<String, ChildNotification> = BTreeMap::new();
        while let Ok(note) = self.notify_rx.try_recv() {
            pending.insert(note.runtime_name.clone(), note);
        }

        let mut errors = BTreeMap::new();
        let live = std::mem::take(&mut self.live);
        for mut slot in live.into_iter().rev() {
            slot.running.cancel();
            let path = slot.running.runtime_name().to_owned();
            let result = match pending.remove(&path) {
                Some(note) => note.into_result(),
                None => slot.running.wait(slot.spec.shutdown()).await,
            };
            match result {
                Ok(()) => {
                    if matches!(slot.spec.kind(), NodeKind::Worker) {
                        self.emit(EventKind::WorkerTerminated, &path);
                    }
                }
                Err(err) => {
                    if matches!(slot.spec.kind(), NodeKind::Worker) {
                        self.emit_err(EventKind::WorkerFailed, &path, &err);
                    }
                    errors.insert(path, err);
                }
            }
        }
        errors
    }

    async fn release_resources(&self) -> Option<ResourceError> {
        match self.spec.on_cleanup() {
            Some(on_cleanup) => on_cleanup().await.err(),
            None => None,
        }
    }

    /// Folds the loop trigger, child termination errors, and cleanup result
    /// into the supervisor's terminal outcome.
    fn exit_outcome(
        &self,
        trigger: Option<ToleranceExceeded>,
        children: BTreeMap<String, NodeError>,
        cleanup: Option<ResourceError>,
    ) -> Option<NodeError> {
        let termination = if children.is_empty() && cleanup.is_none() {
            None
        } else {
            Some(SupervisorError {
                runtime_name: self.path.clone(),
                cause: None,
                cleanup,
                children,
            })
        };
        match trigger {
            Some(tolerance) => Some(NodeError::Restart(Box::new(SupervisorRestartError {
                runtime_name: self.path.clone(),
                tolerance,
                termination,
            }))),
            None => termination.map(|err| NodeError::Termination(Box::new(err))),
        }
    }

    fn emit(&self, kind: EventKind, node: &str) {
        self.bus.publish(Event::now(kind, node));
    }

    fn emit_err(&self, kind: EventKind, node: &str, err: &dyn std::fmt::Display) {
        self.bus.publish(Event::now(kind, node).with_error(err.to_string()));
    }
}
