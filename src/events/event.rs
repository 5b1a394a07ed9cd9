//! # Lifecycle events emitted by the supervision runtime.
//!
//! [`EventKind`] classifies the eight observable transitions of a node —
//! start, clean termination, failure, and start failure, for workers and
//! supervisors alike — plus two adapter reports describing subscribers that
//! dropped an event or panicked while handling one.
//!
//! [`Event`] carries the runtime name of the node the transition belongs to,
//! plus a rendered error message when the transition is a failure.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Events are published synchronously with the transition
//! they describe, so the publication order on the bus *is* the transition
//! order: for a subtree, children start before their supervisor's
//! `SupervisorStarted` and stop (in reverse) before its
//! `SupervisorTerminated`.
//!
//! ## Example
//! ```rust
//! use treevisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::WorkerFailed, "root/child1").with_error("boom");
//!
//! assert_eq!(ev.kind, EventKind::WorkerFailed);
//! assert_eq!(ev.node, "root/child1");
//! assert_eq!(ev.error.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of node lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Node lifecycle ===
    /// A worker completed its start handshake and is running.
    WorkerStarted,
    /// A worker terminated cleanly (normal return or cooperative cancellation).
    WorkerTerminated,
    /// A worker terminated with an error, captured panic, or shutdown timeout.
    WorkerFailed,
    /// A worker's start function failed before it reached running.
    WorkerStartFailed,
    /// A supervisor is running; every child below it reported started.
    SupervisorStarted,
    /// A supervisor and all of its children terminated cleanly.
    SupervisorTerminated,
    /// A supervisor exited with an error: tolerance exceeded, a child failed
    /// to stop, or resource cleanup failed.
    SupervisorFailed,
    /// A supervisor's start procedure failed and its started children were
    /// rolled back.
    SupervisorStartFailed,

    // === Adapter reports ===
    /// A subscriber's queue was full or its worker gone; the event was
    /// dropped for that subscriber only.
    SubscriberOverflow,
    /// A subscriber panicked while handling an event; the panic was caught
    /// and isolated.
    SubscriberPanicked,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::WorkerStarted => "worker_started",
            EventKind::WorkerTerminated => "worker_terminated",
            EventKind::WorkerFailed => "worker_failed",
            EventKind::WorkerStartFailed => "worker_start_failed",
            EventKind::SupervisorStarted => "supervisor_started",
            EventKind::SupervisorTerminated => "supervisor_terminated",
            EventKind::SupervisorFailed => "supervisor_failed",
            EventKind::SupervisorStartFailed => "supervisor_start_failed",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::SubscriberPanicked => "subscriber_panicked",
        }
    }
}

/// A single lifecycle transition of one node.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of transition.
    pub kind: EventKind,
    /// Runtime name of the node, e.g. `root/branch0/child1`. For adapter
    /// reports this is the subscriber name instead.
    pub node: String,
    /// Rendered error message, if the transition represents a failure.
    pub error: Option<String>,
}

impl Event {
    /// Creates a new event for `node` with the current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind, node: impl Into<String>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            node: node.into(),
            error: None,
        }
    }

    /// Attaches a rendered error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Creates an overflow report for a subscriber that dropped an event.
    pub fn subscriber_overflow(
        subscriber: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Event::now(EventKind::SubscriberOverflow, subscriber).with_error(reason)
    }

    /// Creates a panic report for a subscriber that blew up handling an
    /// event.
    pub fn subscriber_panicked(subscriber: impl Into<String>, info: impl Into<String>) -> Self {
        Event::now(EventKind::SubscriberPanicked, subscriber).with_error(info)
    }
}
