//! Start and shutdown ordering across flat and nested trees.
//!
//! Workers start before their supervisor in the event stream: a
//! supervisor's `SupervisorStarted` marks "the whole subtree is up".

mod common;

use common::{assert_exact, fail_start, premature_exit, wait_done, EventProbe};

use treevisor::{
    Config, EventKind::*, StartError, StartOrder, SupervisorSpec, Tree,
};

#[tokio::test]
async fn single_worker_clean_stop() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let root = SupervisorSpec::new("root").with_children(vec![wait_done("one")]);
    let handle = tree.start(root).await.unwrap();
    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/one"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/one"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn three_workers_left_to_right() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let root = SupervisorSpec::new("root")
        .with_children(vec![wait_done("c0"), wait_done("c1"), wait_done("c2")]);
    let handle = tree.start(root).await.unwrap();
    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c0"),
            (WorkerStarted, "root/c1"),
            (WorkerStarted, "root/c2"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/c2"),
            (WorkerTerminated, "root/c1"),
            (WorkerTerminated, "root/c0"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn three_workers_right_to_left() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let root = SupervisorSpec::new("root")
        .with_children(vec![wait_done("c0"), wait_done("c1"), wait_done("c2")])
        .with_order(StartOrder::RightToLeft);
    let handle = tree.start(root).await.unwrap();
    handle.terminate().await.unwrap();

    // Shutdown is the reverse of the order that actually started them.
    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/c2"),
            (WorkerStarted, "root/c1"),
            (WorkerStarted, "root/c0"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/c0"),
            (WorkerTerminated, "root/c1"),
            (WorkerTerminated, "root/c2"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn nested_subtrees_start_in_declared_order() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let root = SupervisorSpec::new("root")
        .with_children(vec![wait_done("w0")])
        .with_subtree(SupervisorSpec::new("b0").with_children(vec![wait_done("c0")]))
        .with_children(vec![wait_done("w1")]);
    let handle = tree.start(root).await.unwrap();
    handle.terminate().await.unwrap();

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/w0"),
            (WorkerStarted, "root/b0/c0"),
            (SupervisorStarted, "root/b0"),
            (WorkerStarted, "root/w1"),
            (SupervisorStarted, "root"),
            (WorkerTerminated, "root/w1"),
            (WorkerTerminated, "root/b0/c0"),
            (SupervisorTerminated, "root/b0"),
            (WorkerTerminated, "root/w0"),
            (SupervisorTerminated, "root"),
        ],
    );
}

#[tokio::test]
async fn start_failure_mid_tree_rolls_back_started_siblings() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let b0 = SupervisorSpec::new("b0").with_children(vec![wait_done("c0"), wait_done("c1")]);
    let b1 = SupervisorSpec::new("b1").with_children(vec![
        wait_done("c2"),
        fail_start("c3"),
        wait_done("c4"),
    ]);
    let root = SupervisorSpec::new("root").with_subtree(b0).with_subtree(b1);

    let err = tree.start(root).await.unwrap_err();
    match err {
        StartError::Supervisor { runtime_name, cause, .. } => {
            assert_eq!(runtime_name, "root");
            match *cause {
                StartError::Supervisor { runtime_name, cause, .. } => {
                    assert_eq!(runtime_name, "root/b1");
                    assert!(matches!(*cause, StartError::Start { .. }));
                }
                other => panic!("unexpected cause: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // c4 is never attempted; b0 is rolled back after b1's failure.
    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStarted, "root/b0/c0"),
            (WorkerStarted, "root/b0/c1"),
            (SupervisorStarted, "root/b0"),
            (WorkerStarted, "root/b1/c2"),
            (WorkerStartFailed, "root/b1/c3"),
            (WorkerTerminated, "root/b1/c2"),
            (SupervisorStartFailed, "root/b1"),
            (WorkerTerminated, "root/b0/c1"),
            (WorkerTerminated, "root/b0/c0"),
            (SupervisorTerminated, "root/b0"),
            (SupervisorStartFailed, "root"),
        ],
    );
}

#[tokio::test]
async fn worker_returning_before_handshake_is_a_start_error() {
    let tree = Tree::new(Config::default(), Vec::new());
    let mut probe = EventProbe::new(tree.subscribe());

    let root = SupervisorSpec::new("root").with_children(vec![premature_exit("w")]);
    let err = tree.start(root).await.unwrap_err();
    match err {
        StartError::Supervisor { cause, .. } => {
            assert!(matches!(*cause, StartError::PrematureExit { ref runtime_name, .. } if runtime_name == "root/w"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    probe.drain();
    assert_exact(
        &probe,
        &[
            (WorkerStartFailed, "root/w"),
            (SupervisorStartFailed, "root"),
        ],
    );
}

#[tokio::test]
async fn invalid_names_are_rejected_before_anything_starts() {
    let tree = Tree::new(Config::default(), Vec::new());

    let slash = SupervisorSpec::new("root").with_children(vec![wait_done("a/b")]);
    assert!(matches!(
        tree.start(slash).await,
        Err(StartError::InvalidSpec { .. })
    ));

    let duplicate =
        SupervisorSpec::new("root").with_children(vec![wait_done("a"), wait_done("a")]);
    assert!(matches!(
        tree.start(duplicate).await,
        Err(StartError::InvalidSpec { .. })
    ));
}
