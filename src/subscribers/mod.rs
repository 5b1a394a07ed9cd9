//! # Event subscribers.
//!
//! The [`Subscribe`] trait and built-in implementations for observing the
//! lifecycle events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   node runtimes ── publish(Event) ──► Bus ──► Tree bridge ──► SubscriberSet
//!                                                                   │
//!                                                        ┌──────────┼──────────┐
//!                                                        ▼          ▼          ▼
//!                                                  LogSubscriber  Metrics   Custom
//! ```
//!
//! Delivery to each subscriber is FIFO through a bounded queue on a
//! dedicated worker task; a slow or panicking subscriber never stalls the
//! supervision core. Queue overflow and subscriber panics surface on the bus
//! as [`EventKind::SubscriberOverflow`](crate::EventKind::SubscriberOverflow)
//! and [`EventKind::SubscriberPanicked`](crate::EventKind::SubscriberPanicked)
//! reports.

mod log;
mod set;
mod subscriber;

pub use log::LogSubscriber;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
