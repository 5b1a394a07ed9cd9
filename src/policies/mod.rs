//! Policies governing supervised nodes:
//!  - [`Restart`] when to start a new instance of a terminated child;
//!  - [`Shutdown`] how long to wait for a child during termination;
//!  - [`Tolerance`] / [`FailureWindow`] how many restarts to admit before escalating.
//!
//! ## Overview
//! - [`restart`] — restart decisions: *permanent / transient / temporary*.
//! - [`shutdown`] — bounded or unbounded termination waits.
//! - [`tolerance`] — sliding-window failure accounting with injectable time.

mod restart;
mod shutdown;
mod tolerance;

pub use restart::Restart;
pub use shutdown::Shutdown;
pub use tolerance::{FailureWindow, Tolerance};
