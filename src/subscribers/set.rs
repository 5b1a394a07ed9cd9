//! # Subscriber fan-out.
//!
//! [`SubscriberSet`] hands each published [`Event`] to every subscriber
//! without awaiting any of them. Each subscriber is wrapped in an *outlet*:
//! a bounded queue drained by a dedicated worker task, so one slow or broken
//! observer never stalls the supervision core or its peers.
//!
//! Misbehavior surfaces through the bus, in the same typed stream as the
//! lifecycle events:
//! - a full (or closed) queue drops the event for that subscriber and
//!   publishes [`EventKind::SubscriberOverflow`];
//! - a panic inside [`Subscribe::on_event`] is caught and published as
//!   [`EventKind::SubscriberPanicked`].
//!
//! Adapter reports are visible to bus receivers only and are never
//! re-offered to subscribers: a saturated or panicking subscriber would
//! otherwise feed on reports about itself.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// One subscriber with its bounded queue and draining worker.
struct Outlet {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl Outlet {
    /// Spawns the draining worker; must be called within a tokio runtime.
    fn open(sub: Arc<dyn Subscribe>, bus: Bus) -> Self {
        let name = sub.name();
        let (queue, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let handled = std::panic::AssertUnwindSafe(sub.on_event(ev.as_ref()))
                    .catch_unwind()
                    .await;
                if let Err(panic) = handled {
                    bus.publish(Event::subscriber_panicked(
                        sub.name(),
                        panic_message(panic.as_ref()),
                    ));
                }
            }
        });

        Self {
            name,
            queue,
            worker,
        }
    }
}

/// Non-blocking fan-out of lifecycle events to registered subscribers.
pub struct SubscriberSet {
    bus: Bus,
    outlets: Vec<Outlet>,
}

impl SubscriberSet {
    /// Opens one outlet per subscriber.
    ///
    /// Must be called within a tokio runtime. Overflow and panic reports for
    /// the subscribers are published to `bus`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let outlets = subs
            .into_iter()
            .map(|sub| Outlet::open(sub, bus.clone()))
            .collect();
        Self { bus, outlets }
    }

    /// Offers one event to every outlet and returns immediately.
    ///
    /// An event that does not fit a subscriber's queue is dropped for that
    /// subscriber only and reported as [`EventKind::SubscriberOverflow`].
    /// Adapter reports themselves are skipped here (see the module docs).
    pub fn emit(&self, event: &Event) {
        if matches!(
            event.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        ) {
            return;
        }

        let ev = Arc::new(event.clone());
        for outlet in &self.outlets {
            let reason = match outlet.queue.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker stopped",
            };
            self.bus
                .publish(Event::subscriber_overflow(outlet.name, reason));
        }
    }

    /// Graceful shutdown: closes every queue and awaits the workers.
    pub async fn shutdown(self) {
        for outlet in self.outlets {
            drop(outlet.queue);
            let _ = outlet.worker.await;
        }
    }

    /// True if no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outlets.len()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
