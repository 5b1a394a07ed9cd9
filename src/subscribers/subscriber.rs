//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging observers into the
//! tree: logging, metrics, test probes.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics caught, published as
//!   [`SubscriberPanicked`](crate::EventKind::SubscriberPanicked) reports)
//!
//! ## Rules
//! - A slow subscriber only affects itself: on queue overflow the event is
//!   dropped for that subscriber — never buffered inside the runtime — and
//!   a [`SubscriberOverflow`](crate::EventKind::SubscriberOverflow) report
//!   is published.
//! - Subscribers **cannot block** the supervision core; events are published
//!   to the bus synchronously and fanned out asynchronously.

use async_trait::async_trait;

use crate::events::Event;

/// Observer of node lifecycle events.
///
/// Receives events in emission order through a dedicated worker task with a
/// bounded queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's worker task, sequentially, in queue
    /// order. Panics are caught and reported as `SubscriberPanicked`; the
    /// tree keeps running.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name carried by overflow/panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
