//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so the supervision runtime can
//! publish [`Event`]s to any number of independent receivers.
//!
//! ## Key characteristics
//! - **Broadcast semantics**: every active receiver sees a clone of each event.
//! - **Non-persistent**: events published with no receivers are dropped.
//! - **Bounded capacity**: a lagging receiver loses the oldest events, never
//!   blocks a publisher.
//!
//! Publishing is synchronous with the state transition the event describes;
//! a slow observer is the observer's problem, handled at the subscriber
//! adapter, never inside the runtime.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped silently; the tree
    /// operates fine without observers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will see all events published after this
    /// call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
