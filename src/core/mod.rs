//! Supervision core: node runtimes and lifecycle.
//!
//! The only public API re-exported from here is consumed via
//! [`Tree`](crate::Tree). Everything else is an internal building block the
//! tree wires together.
//!
//! ## Files & responsibilities
//! - **worker.rs**: one supervised activity; start handshake, panic capture,
//!   terminal-notification routing, bounded termination waits.
//! - **supervisor.rs**: ordered child start with rollback, the supervision
//!   loop (restart policies × tolerance accounting), reverse-order
//!   termination, escalation.
//! - **notification.rs**: the child→parent terminal message.
//!
//! ## Wiring (module-level flow)
//! ```text
//! Tree::start(spec)
//!   └─ spawn_supervisor(root)              blocks on start handshake
//!        └─ SupervisorRuntime::run()
//!             ├─ start_children()          serialized, declared order
//!             │    ├─ spawn_worker(..)     blocks on StartNotifier
//!             │    └─ spawn_supervisor(..) recursion for subtrees
//!             ├─ publish SupervisorStarted
//!             ├─ supervision_loop()
//!             │    ├─ child notification → restart / remove / escalate
//!             │    └─ token cancelled    → break
//!             ├─ terminate_children()      reverse order, per-child Shutdown
//!             ├─ release_resources()
//!             └─ notify parent (single terminal ChildNotification)
//!
//! Notification routing (per child):
//!   worker exit ──► supervision inbox (loop running)
//!              └──► terminating inbox (loop exited, inbox closed)
//! ```
//!
//! ## Rules
//! - Child *i* reaches running before child *i+1* is started; shutdown is
//!   the exact reverse of the start order of the live set.
//! - The live-children table is owned exclusively by its supervisor's loop.
//! - Restart reuses the child's runtime name and slot position.

mod notification;
mod supervisor;
mod worker;

pub(crate) use notification::ChildNotification;
pub(crate) use supervisor::spawn_supervisor;
pub(crate) use worker::RunningNode;
