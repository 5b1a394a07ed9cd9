//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to transitions emitted by worker and supervisor
//! runtimes.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: worker and supervisor runtimes, one event per state
//!   transition, in transition order.
//! - **Consumers**: the [`Tree`](crate::Tree) subscriber bridge (fan-out to
//!   [`Subscribe`](crate::Subscribe) implementations) and any receiver from
//!   [`Tree::subscribe`](crate::Tree::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
