#![allow(dead_code)]

//! Shared fixtures: canned workers and an event probe asserting exact
//! lifecycle sequences.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;

use treevisor::{Event, EventKind, StartNotifier, WorkerError, WorkerFn, WorkerSpec};

/// Upper bound on any single probe step; keeps broken tests from hanging.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Worker that signals started and then runs until cancelled.
pub fn wait_done(name: &'static str) -> WorkerSpec {
    WorkerSpec::new(WorkerFn::arc(
        name,
        |ctx: CancellationToken, started: StartNotifier| async move {
            started.success();
            ctx.cancelled().await;
            Ok::<_, WorkerError>(())
        },
    ))
}

/// Worker that fails once per permit added to the returned semaphore; with
/// no permit available it runs until cancelled.
pub fn fail_on_signal(name: &'static str) -> (WorkerSpec, Arc<Semaphore>) {
    let signal = Arc::new(Semaphore::new(0));
    let trigger = Arc::clone(&signal);
    let spec = WorkerSpec::new(WorkerFn::arc(
        name,
        move |ctx: CancellationToken, started: StartNotifier| {
            let signal = Arc::clone(&trigger);
            async move {
                started.success();
                tokio::select! {
                    _ = ctx.cancelled() => Ok(()),
                    permit = signal.acquire() => match permit {
                        Ok(permit) => {
                            permit.forget();
                            Err(WorkerError::fail("induced failure"))
                        }
                        Err(_closed) => Ok(()),
                    },
                }
            }
        },
    ));
    (spec, signal)
}

/// Worker that completes cleanly once per permit added to the returned
/// semaphore.
pub fn done_on_signal(name: &'static str) -> (WorkerSpec, Arc<Semaphore>) {
    let signal = Arc::new(Semaphore::new(0));
    let trigger = Arc::clone(&signal);
    let spec = WorkerSpec::new(WorkerFn::arc(
        name,
        move |ctx: CancellationToken, started: StartNotifier| {
            let signal = Arc::clone(&trigger);
            async move {
                started.success();
                tokio::select! {
                    _ = ctx.cancelled() => Ok::<_, WorkerError>(()),
                    permit = signal.acquire() => {
                        if let Ok(permit) = permit {
                            permit.forget();
                        }
                        Ok(())
                    }
                }
            }
        },
    ));
    (spec, signal)
}

/// Worker that panics once per permit added to the returned semaphore.
pub fn panic_on_signal(name: &'static str) -> (WorkerSpec, Arc<Semaphore>) {
    let signal = Arc::new(Semaphore::new(0));
    let trigger = Arc::clone(&signal);
    let spec = WorkerSpec::new(WorkerFn::arc(
        name,
        move |ctx: CancellationToken, started: StartNotifier| {
            let signal = Arc::clone(&trigger);
            async move {
                started.success();
                tokio::select! {
                    _ = ctx.cancelled() => Ok::<_, WorkerError>(()),
                    permit = signal.acquire() => {
                        if let Ok(permit) = permit {
                            permit.forget();
                        }
                        panic!("worker blew up");
                    }
                }
            }
        },
    ));
    (spec, signal)
}

/// Worker whose start function reports failure through the notifier.
pub fn fail_start(name: &'static str) -> WorkerSpec {
    WorkerSpec::new(WorkerFn::arc(
        name,
        |_ctx: CancellationToken, started: StartNotifier| async move {
            started.failure("boot failure");
            Ok::<_, WorkerError>(())
        },
    ))
}

/// Worker that returns without ever touching the start notifier.
pub fn premature_exit(name: &'static str) -> WorkerSpec {
    WorkerSpec::new(WorkerFn::arc(
        name,
        |_ctx: CancellationToken, _started: StartNotifier| async move {
            Ok::<_, WorkerError>(())
        },
    ))
}

/// Worker that reports cancellation as `WorkerError::Canceled` instead of a
/// clean return, whether its own context or the given scope is cancelled.
pub fn cancel_scoped(name: &'static str, scope: CancellationToken) -> WorkerSpec {
    WorkerSpec::new(WorkerFn::arc(
        name,
        move |ctx: CancellationToken, started: StartNotifier| {
            let scope = scope.clone();
            async move {
                started.success();
                tokio::select! {
                    _ = ctx.cancelled() => {}
                    _ = scope.cancelled() => {}
                }
                Err::<(), WorkerError>(WorkerError::Canceled)
            }
        },
    ))
}

/// Worker that signals started and then ignores cancellation forever.
pub fn ignore_cancel(name: &'static str) -> WorkerSpec {
    WorkerSpec::new(WorkerFn::arc(
        name,
        |_ctx: CancellationToken, started: StartNotifier| async move {
            started.success();
            futures::future::pending::<()>().await;
            Ok::<_, WorkerError>(())
        },
    ))
}

/// Records lifecycle events from a bus receiver and asserts exact order.
pub struct EventProbe {
    rx: broadcast::Receiver<Event>,
    pub seen: Vec<Event>,
}

impl EventProbe {
    pub fn new(rx: broadcast::Receiver<Event>) -> Self {
        Self {
            rx,
            seen: Vec::new(),
        }
    }

    /// Receives events until one matches `kind` on `node`, recording
    /// everything seen along the way.
    pub async fn wait_for(&mut self, kind: EventKind, node: &str) {
        loop {
            let ev = tokio::time::timeout(STEP_TIMEOUT, self.rx.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {kind:?} on {node}"))
                .expect("event bus closed");
            let hit = ev.kind == kind && ev.node == node;
            self.seen.push(ev);
            if hit {
                return;
            }
        }
    }

    /// Drains whatever is already buffered on the receiver.
    pub fn drain(&mut self) {
        while let Ok(ev) = self.rx.try_recv() {
            self.seen.push(ev);
        }
    }

    pub fn timeline(&self) -> Vec<(EventKind, &str)> {
        self.seen
            .iter()
            .map(|ev| (ev.kind, ev.node.as_str()))
            .collect()
    }
}

/// Asserts the probe saw exactly `expected`, in order.
#[track_caller]
pub fn assert_exact(probe: &EventProbe, expected: &[(EventKind, &str)]) {
    assert_eq!(probe.timeline().as_slice(), expected);
}
