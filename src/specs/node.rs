//! # Node: the tagged union of worker and supervisor specs.
//!
//! A supervision tree is a value: supervisors hold an ordered `Vec<Node>`,
//! and the runtime dispatches on the [`NodeKind`] tag. Children refer to
//! parents only through message-sending handles, never back-references, so
//! the tree is cycle-free by construction.
//!
//! Runtime names are `/`-joined paths from the root (`root/branch0/child1`),
//! unique across the live tree and stable across restarts of a node
//! instance.

use std::collections::BTreeSet;

use crate::error::StartError;
use crate::policies::{Restart, Shutdown, Tolerance};
use crate::specs::supervisor::SupervisorSpec;
use crate::specs::worker::WorkerSpec;

/// Separator used to join runtime-name path segments.
pub(crate) const PATH_SEPARATOR: char = '/';

/// Tag distinguishing leaf workers from internal supervisors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf node executing user-supplied work.
    Worker,
    /// An internal node managing children.
    Supervisor,
}

/// A child of a supervisor: either a worker or a nested supervisor.
#[derive(Clone)]
pub enum Node {
    /// Leaf worker.
    Worker(WorkerSpec),
    /// Nested supervisor.
    Supervisor(SupervisorSpec),
}

impl Node {
    /// Returns the spec name (last runtime-name segment).
    pub fn name(&self) -> &str {
        match self {
            Node::Worker(spec) => spec.name(),
            Node::Supervisor(spec) => spec.name(),
        }
    }

    /// Returns the node kind tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Worker(_) => NodeKind::Worker,
            Node::Supervisor(_) => NodeKind::Supervisor,
        }
    }

    /// Restart policy the parent applies to this child.
    ///
    /// Nested supervisors are always permanent.
    pub(crate) fn restart(&self) -> Restart {
        match self {
            Node::Worker(spec) => spec.restart(),
            Node::Supervisor(_) => Restart::Permanent,
        }
    }

    /// Shutdown policy the parent applies when terminating this child.
    ///
    /// Nested supervisors are waited for indefinitely; their own children's
    /// policies bound the wait.
    pub(crate) fn shutdown(&self) -> Shutdown {
        match self {
            Node::Worker(spec) => spec.shutdown(),
            Node::Supervisor(_) => Shutdown::Indefinite,
        }
    }

    /// Error tolerance the parent consults before restarting this child.
    pub(crate) fn tolerance(&self) -> Tolerance {
        match self {
            Node::Worker(spec) => spec.tolerance(),
            Node::Supervisor(spec) => spec.tolerance(),
        }
    }
}

impl From<WorkerSpec> for Node {
    fn from(spec: WorkerSpec) -> Self {
        Node::Worker(spec)
    }
}

impl From<SupervisorSpec> for Node {
    fn from(spec: SupervisorSpec) -> Self {
        Node::Supervisor(spec)
    }
}

/// Joins a parent runtime name with a child spec name.
pub(crate) fn runtime_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    }
}

fn validate_name(name: &str) -> Result<(), StartError> {
    if name.is_empty() {
        return Err(StartError::InvalidSpec {
            name: name.to_owned(),
            reason: "name must not be empty".to_owned(),
        });
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(StartError::InvalidSpec {
            name: name.to_owned(),
            reason: format!("name must not contain '{PATH_SEPARATOR}'"),
        });
    }
    Ok(())
}

/// Validates every name in the spec tree and rejects duplicate siblings.
pub(crate) fn validate_tree(spec: &SupervisorSpec) -> Result<(), StartError> {
    validate_name(spec.name())?;
    let mut seen = BTreeSet::new();
    for child in spec.children() {
        validate_name(child.name())?;
        if !seen.insert(child.name()) {
            return Err(StartError::InvalidSpec {
                name: child.name().to_owned(),
                reason: "duplicate sibling name".to_owned(),
            });
        }
        if let Node::Supervisor(subtree) = child {
            validate_tree(subtree)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::worker::{StartNotifier, WorkerFn, WorkerSpec};
    use crate::WorkerError;
    use tokio_util::sync::CancellationToken;

    fn worker(name: &'static str) -> WorkerSpec {
        WorkerSpec::new(WorkerFn::arc(
            name,
            |_ctx: CancellationToken, started: StartNotifier| async move {
                started.success();
                Ok::<_, WorkerError>(())
            },
        ))
    }

    #[test]
    fn joins_runtime_names_from_root() {
        assert_eq!(runtime_name("", "root"), "root");
        assert_eq!(runtime_name("root", "branch0"), "root/branch0");
        assert_eq!(runtime_name("root/branch0", "child1"), "root/branch0/child1");
    }

    #[test]
    fn rejects_separator_in_name() {
        let spec = SupervisorSpec::new("root").with_children(vec![worker("a/b")]);
        assert!(matches!(
            validate_tree(&spec),
            Err(StartError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_siblings() {
        let spec = SupervisorSpec::new("root").with_children(vec![worker("a"), worker("a")]);
        assert!(matches!(
            validate_tree(&spec),
            Err(StartError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn accepts_same_name_in_different_subtrees() {
        let spec = SupervisorSpec::new("root")
            .with_subtree(SupervisorSpec::new("b0").with_children(vec![worker("a")]))
            .with_subtree(SupervisorSpec::new("b1").with_children(vec![worker("a")]));
        assert!(validate_tree(&spec).is_ok());
    }
}
