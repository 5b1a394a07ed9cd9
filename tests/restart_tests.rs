//! Restart policies, tolerance accounting, and escalation.

mod common;

use std::time::Duration;

use common::{
    assert_exact, cancel_scoped, done_on_signal, fail_on_signal, panic_on_signal, wait_done,
    EventProbe,
};
use tokio_util::sync::CancellationToken;

use treevisor::{
    Config, EventKind::*, NodeError, Restart, SupervisorSpec, Tolerance, Tree,
};

#[tokio::test]
async fn permanent_worker_below_tolerance_recovers() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child1, fail1) = fail_on_signal("child1");
    let child1 = child1
        .with_restart(Restart::Permanent)
        .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
    let root = SupervisorSpec::new("root").with_children(vec![child1]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/child1").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/child1"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/child1"),
            (WorkerStarted, "root/child1"),
            (WorkerTerminated, "root/child1"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn permanent_worker_exceeding_tolerance_escalates() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child1, fail1) = fail_on_signal("c1");
    let child1 = child1
        .with_restart(Restart::Permanent)
        .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
    let root = SupervisorSpec::new("root").with_children(vec![child1, wait_done("c2")]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/c1").await;
    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/c1").await;
    fail1.add_permits(1);

    // No parent will rescue the root: the escalation is the wait() result.
    let err = handle.wait().await.unwrap_err();
    match &err {
        NodeError::Restart(restart) => {
            assert_eq!(restart.runtime_name, "root");
            assert_eq!(restart.tolerance.runtime_name, "root/c1");
            assert!(restart.termination.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c1"),
            (WorkerStarted, "root/c2"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/c1"),
            (WorkerStarted, "root/c1"),
            (WorkerFailed, "root/c1"),
            (WorkerStarted, "root/c1"),
            (WorkerFailed, "root/c1"),
            (WorkerTerminated, "root/c2"),
            (SupervisorFailed, "root"),
        ],
    );
}

#[tokio::test]
async fn nested_supervisor_is_restarted_after_escalation() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child1, fail1) = fail_on_signal("c1");
    let child1 = child1
        .with_restart(Restart::Permanent)
        .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
    let subtree1 = SupervisorSpec::new("subtree1").with_children(vec![child1, wait_done("c2")]);
    let root = SupervisorSpec::new("root").with_subtree(subtree1);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/subtree1/c1").await;
    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/subtree1/c1").await;
    fail1.add_permits(1);
    probe.wait_for(SupervisorFailed, "root/subtree1").await;

    // The root contains the failure: the whole subtree boots again.
    probe.wait_for(SupervisorStarted, "root/subtree1").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/subtree1/c1"),
            (WorkerStarted, "root/subtree1/c2"),
            (SupervisorStarted, "root/subtree1"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/subtree1/c1"),
            (WorkerStarted, "root/subtree1/c1"),
            (WorkerFailed, "root/subtree1/c1"),
            (WorkerStarted, "root/subtree1/c1"),
            (WorkerFailed, "root/subtree1/c1"),
            (WorkerTerminated, "root/subtree1/c2"),
            (SupervisorFailed, "root/subtree1"),
            (WorkerStarted, "root/subtree1/c1"),
            (WorkerStarted, "root/subtree1/c2"),
            (SupervisorStarted, "root/subtree1"),
            (WorkerTerminated, "root/subtree1/c2"),
            (WorkerTerminated, "root/subtree1/c1"),
            (SupervisorTerminated, "root/subtree1"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn tolerance_window_slides_and_forgets_old_failures() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child1, fail1) = fail_on_signal("child1");
    let child1 = child1
        .with_restart(Restart::Permanent)
        .with_tolerance(Tolerance::new(1, Duration::from_micros(100)));
    let root = SupervisorSpec::new("root").with_children(vec![child1]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/child1").await;

    // Wait far longer than the window, then fail again: the first failure
    // has expired, so the second restarts instead of escalating.
    tokio::time::sleep(Duration::from_millis(10)).await;
    fail1.add_permits(1);
    probe.wait_for(WorkerStarted, "root/child1").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/child1"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/child1"),
            (WorkerStarted, "root/child1"),
            (WorkerFailed, "root/child1"),
            (WorkerStarted, "root/child1"),
            (WorkerTerminated, "root/child1"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn transient_worker_is_not_restarted_after_clean_return() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child, done) = done_on_signal("c");
    let root = SupervisorSpec::new("root")
        .with_children(vec![child.with_restart(Restart::Transient)]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    done.add_permits(1);
    probe.wait_for(WorkerTerminated, "root/c").await;

    // The supervisor keeps running with an empty live set.
    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/c"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn transient_worker_is_not_restarted_after_cancellation_exit() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let scope = CancellationToken::new();
    let child = cancel_scoped("c", scope.clone()).with_restart(Restart::Transient);
    let root = SupervisorSpec::new("root").with_children(vec![child]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    // The worker exits with `WorkerError::Canceled`: a clean return, not a
    // failure, so `Transient` does not restart it.
    scope.cancel();
    probe.wait_for(WorkerTerminated, "root/c").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/c"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn transient_worker_is_restarted_after_failure() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child, fail) = fail_on_signal("c");
    let child = child
        .with_restart(Restart::Transient)
        .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
    let root = SupervisorSpec::new("root").with_children(vec![child]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail.add_permits(1);
    probe.wait_for(WorkerStarted, "root/c").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/c"),
            (WorkerStarted, "root/c"),
            (WorkerTerminated, "root/c"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn temporary_worker_is_never_restarted() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child, fail) = fail_on_signal("c");
    let root = SupervisorSpec::new("root")
        .with_children(vec![child.with_restart(Restart::Temporary), wait_done("keeper")]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    fail.add_permits(1);
    probe.wait_for(WorkerFailed, "root/c").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c"),
            (WorkerStarted, "root/keeper"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/c"),
            (WorkerTerminated, "root/keeper"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn captured_panic_is_handled_by_the_restart_policy() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let (child, boom) = panic_on_signal("c");
    let child = child
        .with_restart(Restart::Permanent)
        .with_capture_panics(true)
        .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
    let root = SupervisorSpec::new("root").with_children(vec![child]);

    let handle = tree.start(root).await.unwrap();
    probe.wait_for(SupervisorStarted, "root").await;

    boom.add_permits(1);
    probe.wait_for(WorkerStarted, "root/c").await;

    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c"),
            (SupervisorStarted, "root"),
            (WorkerFailed, "root/c"),
            (WorkerStarted, "root/c"),
            (WorkerTerminated, "root/c"),
            (SupervisorTerminated, "root"),
        ],
    );

    let failure = probe
        .seen
        .iter()
        .find(|ev| ev.kind == WorkerFailed)
        .expect("panic failure event");
    assert!(failure.error.as_deref().unwrap().contains("worker blew up"));
}
