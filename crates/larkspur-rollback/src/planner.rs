use uuid::Uuid;

use larkspur_config::DeploymentType;

use crate::types::WorkflowPhase;

/// Derives the compensating rollback phase for one deployment type.
///
/// Implementations are pure functions of the forward phase and the
/// `service_repeat` flag: when setup is shared with a prior phase the
/// rollback can assume it stays in place, otherwise it must undo it.
pub trait RollbackPlanner: Send + Sync {
  fn deployment_type(&self) -> DeploymentType;

  fn plan(&self, forward: &WorkflowPhase, service_repeat: bool) -> WorkflowPhase;
}

/// The skeleton every rollback phase starts from: a fresh phase id, the
/// forward phase's service/infra node ids, and no step groups yet.
pub fn rollback_phase_base(forward: &WorkflowPhase) -> WorkflowPhase {
  WorkflowPhase {
    phase_id: Uuid::new_v4().to_string(),
    name: format!("Rollback {}", forward.name),
    deployment_type: forward.deployment_type,
    service_node_id: forward.service_node_id.clone(),
    infra_node_id: forward.infra_node_id.clone(),
    rollback: true,
    service_repeat: forward.service_repeat,
    step_groups: Vec::new(),
  }
}
