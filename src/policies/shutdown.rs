//! # Shutdown policies for terminating nodes.
//!
//! [`Shutdown`] bounds how long a supervisor waits for a child's terminal
//! notification after cancelling it.
//!
//! - [`Shutdown::Indefinite`] wait forever. The right choice when leaking an
//!   activity is worse than a slow shutdown.
//! - [`Shutdown::Timeout`] wait up to the given duration, then declare the
//!   child leaked and record a shutdown-timeout error.
//!
//! Cancellation is cooperative: the crate never kills an activity that
//! ignores its [`CancellationToken`](tokio_util::sync::CancellationToken).
//! A timed-out child keeps running untracked; the error it produces during
//! termination is collected into the supervisor's aggregate.

use std::time::Duration;

/// Policy bounding the wait for a child's terminal notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shutdown {
    /// Wait until the child reports termination, however long that takes (default).
    Indefinite,
    /// Wait up to the given duration, then give up and report a leak.
    Timeout(Duration),
}

impl Default for Shutdown {
    /// Returns [`Shutdown::Indefinite`].
    fn default() -> Self {
        Shutdown::Indefinite
    }
}
