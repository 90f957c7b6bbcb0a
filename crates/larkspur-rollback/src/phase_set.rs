use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::registry::RollbackPlannerRegistry;
use crate::types::WorkflowPhase;

/// Forward phases paired with their rollback counterparts.
///
/// Rollback phases are keyed by the forward phase's id so the runtime can
/// substitute rollback behavior without recompiling. The pairing is a
/// lifecycle coupling: removing a forward phase removes its rollback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSet {
  phases: Vec<WorkflowPhase>,
  rollback_by_phase_id: HashMap<String, WorkflowPhase>,
}

impl PhaseSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_phase(&mut self, phase: WorkflowPhase) {
    self.phases.push(phase);
  }

  /// Generate rollback phases for every forward phase whose deployment
  /// type has a planner and which does not have one yet.
  pub fn augment(&mut self, registry: &RollbackPlannerRegistry) {
    for phase in &self.phases {
      if self.rollback_by_phase_id.contains_key(&phase.phase_id) {
        continue;
      }
      if let Some(planner) = registry.get(phase.deployment_type) {
        let rollback = planner.plan(phase, phase.service_repeat);
        self.rollback_by_phase_id.insert(phase.phase_id.clone(), rollback);
      }
    }
  }

  /// Remove a forward phase and its rollback counterpart.
  pub fn remove_phase(&mut self, phase_id: &str) -> Option<WorkflowPhase> {
    let index = self.phases.iter().position(|p| p.phase_id == phase_id)?;
    self.rollback_by_phase_id.remove(phase_id);
    Some(self.phases.remove(index))
  }

  pub fn phases(&self) -> &[WorkflowPhase] {
    &self.phases
  }

  pub fn rollback_for(&self, phase_id: &str) -> Option<&WorkflowPhase> {
    self.rollback_by_phase_id.get(phase_id)
  }

  pub fn rollback_count(&self) -> usize {
    self.rollback_by_phase_id.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::PhaseBuilder;
  use larkspur_config::DeploymentType;
  use larkspur_stencil::StencilRegistry;

  fn phase(deployment_type: DeploymentType) -> WorkflowPhase {
    PhaseBuilder::new(StencilRegistry::builtin())
      .forward_phase(deployment_type, "Phase 1", None, None, false)
      .unwrap()
  }

  #[test]
  fn test_augment_generates_rollback_keyed_by_forward_id() {
    let registry = RollbackPlannerRegistry::defaults();
    let mut set = PhaseSet::new();
    let forward = phase(DeploymentType::Ssh);
    let forward_id = forward.phase_id.clone();
    set.add_phase(forward);

    set.augment(&registry);
    let rollback = set.rollback_for(&forward_id).unwrap();
    assert!(rollback.rollback);
  }

  #[test]
  fn test_augment_skips_types_without_planner() {
    let registry = RollbackPlannerRegistry::defaults();
    let mut set = PhaseSet::new();
    let forward = phase(DeploymentType::AzureWebApp);
    let forward_id = forward.phase_id.clone();
    set.add_phase(forward);

    set.augment(&registry);
    assert!(set.rollback_for(&forward_id).is_none());
    assert_eq!(set.rollback_count(), 0);
  }

  #[test]
  fn test_augment_is_idempotent() {
    let registry = RollbackPlannerRegistry::defaults();
    let mut set = PhaseSet::new();
    let forward = phase(DeploymentType::Kubernetes);
    let forward_id = forward.phase_id.clone();
    set.add_phase(forward);

    set.augment(&registry);
    let first = set.rollback_for(&forward_id).unwrap().phase_id.clone();
    set.augment(&registry);
    assert_eq!(set.rollback_for(&forward_id).unwrap().phase_id, first);
  }

  #[test]
  fn test_removing_forward_phase_removes_rollback() {
    let registry = RollbackPlannerRegistry::defaults();
    let mut set = PhaseSet::new();
    let forward = phase(DeploymentType::Kubernetes);
    let forward_id = forward.phase_id.clone();
    set.add_phase(forward);
    set.augment(&registry);
    assert_eq!(set.rollback_count(), 1);

    set.remove_phase(&forward_id).unwrap();
    assert!(set.phases().is_empty());
    assert_eq!(set.rollback_count(), 0);
  }
}
