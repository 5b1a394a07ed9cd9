//! # Restart policies for supervised nodes.
//!
//! [`Restart`] determines whether a supervisor starts a new instance of a
//! child after the previous instance reached a terminal state.
//!
//! - [`Restart::Permanent`] the child is always restarted, even after a clean return.
//! - [`Restart::Transient`] the child is restarted only if it failed.
//! - [`Restart::Temporary`] the child is never restarted.
//!
//! Cooperative cancellation is not a failure: a child that exits because its
//! context was cancelled is treated as a clean return.

/// Policy controlling whether a child is restarted after it terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restart {
    /// Always restart, regardless of how the child terminated (default).
    Permanent,
    /// Restart only after an error or captured panic.
    Transient,
    /// Never restart: the child runs one instance and is then removed.
    Temporary,
}

impl Default for Restart {
    /// Returns [`Restart::Permanent`].
    fn default() -> Self {
        Restart::Permanent
    }
}

impl Restart {
    /// Decides whether a terminated child should be started again.
    ///
    /// `failed` is true when the terminal outcome carried an error.
    pub fn should_restart(&self, failed: bool) -> bool {
        match self {
            Restart::Permanent => true,
            Restart::Transient => failed,
            Restart::Temporary => false,
        }
    }
}
