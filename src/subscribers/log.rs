//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogSubscriber`] prints lifecycle events to stdout in a human-readable
//! format.
//!
//! ## Output format
//! ```text
//! [worker-started] node=root/child1
//! [worker-failed] node=root/child1 err="execution failed: boom"
//! [supervisor-started] node=root
//! [supervisor-terminated] node=root
//! ```
//!
//! Not intended for production use: implement a custom [`Subscribe`] for
//! structured logging or metrics, feeding the `kvs()` projections of the
//! aggregate error types into your logger of choice.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
pub struct LogSubscriber;

#[async_trait]
impl Subscribe for LogSubscriber {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::WorkerStarted => println!("[worker-started] node={}", e.node),
            EventKind::WorkerTerminated => println!("[worker-terminated] node={}", e.node),
            EventKind::WorkerFailed => {
                println!("[worker-failed] node={} err={:?}", e.node, e.error)
            }
            EventKind::WorkerStartFailed => {
                println!("[worker-start-failed] node={} err={:?}", e.node, e.error)
            }
            EventKind::SupervisorStarted => println!("[supervisor-started] node={}", e.node),
            EventKind::SupervisorTerminated => {
                println!("[supervisor-terminated] node={}", e.node)
            }
            EventKind::SupervisorFailed => {
                println!("[supervisor-failed] node={} err={:?}", e.node, e.error)
            }
            EventKind::SupervisorStartFailed => {
                println!("[supervisor-start-failed] node={} err={:?}", e.node, e.error)
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={} err={:?}", e.node, e.error)
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={} err={:?}", e.node, e.error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
