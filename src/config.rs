//! # Global runtime configuration.
//!
//! [`Config`] centralizes the defaults a tree hands to its workers: restart
//! policy, shutdown policy, tolerance, panic capture, and the capacity of
//! the event bus.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use treevisor::{Config, Restart, Shutdown, Tolerance};
//!
//! let mut cfg = Config::default();
//! cfg.restart = Restart::Transient;
//! cfg.shutdown = Shutdown::Timeout(Duration::from_secs(5));
//! cfg.tolerance = Tolerance::new(3, Duration::from_secs(30));
//!
//! assert_eq!(cfg.restart, Restart::Transient);
//! ```

use crate::policies::{Restart, Shutdown, Tolerance};

/// Configuration for a [`Tree`](crate::Tree) and the defaults inherited by
/// [`WorkerSpec::with_defaults`](crate::WorkerSpec::with_defaults).
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Default restart policy for workers.
    pub restart: Restart,
    /// Default shutdown policy for workers.
    pub shutdown: Shutdown,
    /// Default error tolerance for children.
    pub tolerance: Tolerance,
    /// Whether workers capture panics by default.
    pub capture_panics: bool,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `bus_capacity = 1024`
    /// - `restart = Restart::Permanent`
    /// - `shutdown = Shutdown::Indefinite`
    /// - `tolerance = 1 failure per 5s window`
    /// - `capture_panics = false`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            restart: Restart::default(),
            shutdown: Shutdown::default(),
            tolerance: Tolerance::default(),
            capture_panics: false,
        }
    }
}
