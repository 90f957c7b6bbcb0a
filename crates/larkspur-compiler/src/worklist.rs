use std::collections::{HashSet, VecDeque};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use larkspur_plan::{Dependency, PlanCreationResponse};

use crate::error::CompileError;
use crate::factory::NodeFactory;

/// Holds not-yet-expanded dependencies and drives them to a fixed point.
///
/// Expansion is sequential: later dependencies may read side-channel
/// metadata produced by earlier ones. Every dependency id is recorded when
/// enqueued; a creator re-emitting an id that was already seen is an
/// invariant violation, not something to silently skip, so the drain would
/// otherwise never terminate.
pub struct Worklist {
  pending: VecDeque<Dependency>,
  seen: HashSet<String>,
}

impl Worklist {
  pub fn new() -> Self {
    Self {
      pending: VecDeque::new(),
      seen: HashSet::new(),
    }
  }

  /// Seed a worklist from an initial dependency set.
  pub fn from_dependencies(initial: Vec<Dependency>) -> Result<Self, CompileError> {
    let mut worklist = Self::new();
    for dependency in initial {
      worklist.push(dependency)?;
    }
    Ok(worklist)
  }

  /// Enqueue one dependency, rejecting ids that were already enqueued.
  pub fn push(&mut self, dependency: Dependency) -> Result<(), CompileError> {
    if !self.seen.insert(dependency.node_id.clone()) {
      return Err(CompileError::DuplicateDependency {
        node_id: dependency.node_id,
      });
    }
    self.pending.push_back(dependency);
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }

  /// Expand a single dependency.
  ///
  /// Returns the nodes it produced, with any newly produced dependencies
  /// moved back into this worklist. `Ok(None)` means the worklist is
  /// empty. This is the incremental API for runtimes that drive expansion
  /// themselves.
  pub fn step(
    &mut self,
    factory: &NodeFactory<'_>,
  ) -> Result<Option<PlanCreationResponse>, CompileError> {
    let Some(dependency) = self.pending.pop_front() else {
      return Ok(None);
    };
    let mut produced = factory.expand(&dependency)?;
    for next in produced.take_dependencies() {
      self.push(next)?;
    }
    Ok(Some(produced))
  }

  /// Drain the worklist to a fixed point, merging everything into
  /// `response`.
  pub fn drain(
    &mut self,
    factory: &NodeFactory<'_>,
    response: &mut PlanCreationResponse,
    cancel: &CancellationToken,
  ) -> Result<(), CompileError> {
    let mut expanded = 0usize;
    loop {
      if cancel.is_cancelled() {
        return Err(CompileError::Cancelled);
      }
      match self.step(factory)? {
        Some(produced) => {
          expanded += 1;
          response.merge(produced)?;
        }
        None => {
          debug!(expanded, nodes = response.node_count(), "worklist drained");
          return Ok(());
        }
      }
    }
  }
}

impl Default for Worklist {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use larkspur_plan::DependencyKind;

  fn dependency(id: &str) -> Dependency {
    Dependency::new(id, DependencyKind::Manifests, serde_json::json!({}))
  }

  #[test]
  fn test_duplicate_id_rejected() {
    let mut worklist = Worklist::new();
    worklist.push(dependency("d1")).unwrap();
    let err = worklist.push(dependency("d1")).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateDependency { node_id } if node_id == "d1"));
  }

  #[test]
  fn test_duplicate_rejected_even_after_expansion() {
    // Once an id has been expanded it may never be re-entered.
    let mut worklist = Worklist::new();
    worklist.push(dependency("d1")).unwrap();
    worklist.pending.clear();
    assert!(worklist.push(dependency("d1")).is_err());
  }
}
