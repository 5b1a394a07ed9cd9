//! # Worker abstraction and specification.
//!
//! Defines the leaf-node contract of a supervision tree:
//!
//! - **[`Worker`]** — trait for async, cancelable activities with an explicit
//!   start handshake
//! - **[`WorkerFn`]** — function-backed implementation wrapping closures
//! - **[`WorkerRef`]** — shared handle (`Arc<dyn Worker>`)
//! - **[`StartNotifier`]** — the handshake callback; the parent supervisor
//!   blocks until it fires
//! - **[`WorkerSpec`]** — immutable bundle of a worker and its policies
//!
//! ## Rules
//! - Each [`Worker::start`] call creates a **fresh** future; restarts never
//!   share mutable state implicitly.
//! - The future **must** call [`StartNotifier::success`] once its activity is
//!   up, and **must** observe its [`CancellationToken`] to allow graceful
//!   shutdown. Resolving before notifying turns the outcome into a start
//!   error.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{StartError, WorkerError};
use crate::policies::{Restart, Shutdown, Tolerance};

/// Boxed future returned by [`Worker::start`].
pub type BoxWorkerFuture =
    Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'static>>;

/// Shared handle to a worker object.
pub type WorkerRef = Arc<dyn Worker>;

/// Asynchronous, cancelable, supervised unit of work.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use treevisor::{BoxWorkerFuture, StartNotifier, Worker};
///
/// struct Ticker;
///
/// impl Worker for Ticker {
///     fn name(&self) -> &str {
///         "ticker"
///     }
///
///     fn start(&self, ctx: CancellationToken, started: StartNotifier) -> BoxWorkerFuture {
///         Box::pin(async move {
///             started.success();
///             ctx.cancelled().await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Worker: Send + Sync + 'static {
    /// Returns a stable node name.
    ///
    /// Must be non-empty and must not contain `/`; it becomes the last
    /// segment of the node's runtime name.
    fn name(&self) -> &str;

    /// Creates a new future running the activity until completion or
    /// cancellation.
    ///
    /// The supervisor blocks on the start handshake: it proceeds only after
    /// `started.success()` was called. If the future resolves first, the
    /// resolution becomes the start error and the node never reaches
    /// running.
    fn start(&self, ctx: CancellationToken, started: StartNotifier) -> BoxWorkerFuture;
}

/// Start handshake callback handed to every worker.
///
/// Fires at most once; later calls are ignored. Cheap to clone.
#[derive(Clone)]
pub struct StartNotifier {
    runtime_name: Arc<str>,
    tx: Arc<Mutex<Option<oneshot::Sender<Result<(), StartError>>>>>,
}

impl StartNotifier {
    pub(crate) fn new(
        runtime_name: &str,
        tx: oneshot::Sender<Result<(), StartError>>,
    ) -> Self {
        Self {
            runtime_name: Arc::from(runtime_name),
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Signals the parent supervisor that the activity is up.
    pub fn success(&self) {
        if let Some(tx) = self.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Signals the parent supervisor that the activity could not start.
    pub fn failure(&self, reason: impl Into<String>) {
        if let Some(tx) = self.take() {
            let _ = tx.send(Err(StartError::Start {
                runtime_name: self.runtime_name.to_string(),
                reason: reason.into(),
            }));
        }
    }

    /// Takes the underlying sender if the notifier has not fired yet.
    pub(crate) fn take(&self) -> Option<oneshot::Sender<Result<(), StartError>>> {
        let mut guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take()
    }
}

/// Function-backed worker implementation.
///
/// Wraps a closure that *creates* a new future per start.
pub struct WorkerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkerFn<F> {
    /// Creates a new function-backed worker.
    ///
    /// Prefer [`WorkerFn::arc`] when you immediately need a [`WorkerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the worker and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use treevisor::{StartNotifier, WorkerError, WorkerFn, WorkerRef};
    ///
    /// let w: WorkerRef = WorkerFn::arc(
    ///     "hello",
    ///     |_ctx: CancellationToken, started: StartNotifier| async move {
    ///         started.success();
    ///         Ok::<_, WorkerError>(())
    ///     },
    /// );
    /// assert_eq!(w.name(), "hello");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(CancellationToken, StartNotifier) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, ctx: CancellationToken, started: StartNotifier) -> BoxWorkerFuture {
        Box::pin((self.f)(ctx, started))
    }
}

/// Immutable specification for running a worker under supervision.
///
/// Bundles the worker with its restart policy, shutdown policy, tolerance,
/// and panic-capture flag. Built with composable `with_*` options; pure, no
/// I/O.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use treevisor::{
///     Restart, Shutdown, StartNotifier, Tolerance, WorkerError, WorkerFn, WorkerSpec,
/// };
///
/// let w = WorkerFn::arc(
///     "demo",
///     |ctx: CancellationToken, started: StartNotifier| async move {
///         started.success();
///         ctx.cancelled().await;
///         Ok::<_, WorkerError>(())
///     },
/// );
///
/// let spec = WorkerSpec::new(w)
///     .with_restart(Restart::Transient)
///     .with_shutdown(Shutdown::Timeout(Duration::from_secs(1)))
///     .with_tolerance(Tolerance::new(2, Duration::from_secs(10)));
///
/// assert_eq!(spec.name(), "demo");
/// assert_eq!(spec.restart(), Restart::Transient);
/// ```
#[derive(Clone)]
pub struct WorkerSpec {
    worker: WorkerRef,
    restart: Restart,
    shutdown: Shutdown,
    tolerance: Tolerance,
    capture_panics: bool,
}

impl WorkerSpec {
    /// Creates a spec with default policies.
    pub fn new(worker: WorkerRef) -> Self {
        Self {
            worker,
            restart: Restart::default(),
            shutdown: Shutdown::default(),
            tolerance: Tolerance::default(),
            capture_panics: false,
        }
    }

    /// Creates a spec inheriting defaults from a [`Config`].
    pub fn with_defaults(worker: WorkerRef, cfg: &Config) -> Self {
        Self {
            worker,
            restart: cfg.restart,
            shutdown: cfg.shutdown,
            tolerance: cfg.tolerance,
            capture_panics: cfg.capture_panics,
        }
    }

    /// Sets the restart policy.
    pub fn with_restart(mut self, restart: Restart) -> Self {
        self.restart = restart;
        self
    }

    /// Sets the shutdown policy.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Sets the error tolerance consulted by the parent supervisor.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enables or disables panic capture.
    ///
    /// When enabled, a panicking worker is reported as
    /// [`WorkerError::Panicked`] and handled by the restart policy. When
    /// disabled, the panic payload is resumed inside the worker's task and
    /// the node is not observed further.
    pub fn with_capture_panics(mut self, capture: bool) -> Self {
        self.capture_panics = capture;
        self
    }

    /// Returns the spec name (the worker's name).
    pub fn name(&self) -> &str {
        self.worker.name()
    }

    /// Returns the worker.
    pub fn worker(&self) -> &WorkerRef {
        &self.worker
    }

    /// Returns the restart policy.
    pub fn restart(&self) -> Restart {
        self.restart
    }

    /// Returns the shutdown policy.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown
    }

    /// Returns the error tolerance.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Returns whether panics are captured.
    pub fn capture_panics(&self) -> bool {
        self.capture_panics
    }
}
