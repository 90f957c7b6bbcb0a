//! The built-in rollback planners, one per stateful deployment type.

use larkspur_config::DeploymentType;

use crate::planner::{RollbackPlanner, rollback_phase_base};
use crate::types::{PhaseStepGroup, PhaseStepNode, PhaseStepType, WorkflowPhase};

fn single_step_rollback(
  forward: &WorkflowPhase,
  step_kind: &str,
  step_name: &str,
) -> WorkflowPhase {
  let mut phase = rollback_phase_base(forward);
  phase.step_groups.push(
    PhaseStepGroup::rollback(PhaseStepType::Deploy, "Deploy", "Deploy")
      .with_step(PhaseStepNode::new(step_kind, step_name, true)),
  );
  // Rolled-back verification runs under the same criteria as the forward
  // deploy.
  phase.step_groups.push(PhaseStepGroup::rollback(
    PhaseStepType::VerifyService,
    "Verify",
    "Deploy",
  ));
  phase
    .step_groups
    .push(PhaseStepGroup::rollback(PhaseStepType::WrapUp, "Wrap Up", "Wrap Up"));
  phase
}

pub(crate) struct KubernetesRollbackPlanner;

impl RollbackPlanner for KubernetesRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::Kubernetes
  }

  fn plan(&self, forward: &WorkflowPhase, service_repeat: bool) -> WorkflowPhase {
    let mut phase = rollback_phase_base(forward);
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::Deploy, "Deploy", "Deploy").with_step(
        PhaseStepNode::new("K8sRollingRollback", "Rollback Containers", true),
      ),
    );
    if !service_repeat {
      phase.step_groups.push(
        PhaseStepGroup::rollback(PhaseStepType::ServiceSetup, "Setup", "Setup").with_step(
          PhaseStepNode::new("K8sSetupRollback", "Rollback Kubernetes Setup", true),
        ),
      );
    }
    phase.step_groups.push(PhaseStepGroup::rollback(
      PhaseStepType::VerifyService,
      "Verify",
      "Deploy",
    ));
    phase
      .step_groups
      .push(PhaseStepGroup::rollback(PhaseStepType::WrapUp, "Wrap Up", "Wrap Up"));
    phase
  }
}

pub(crate) struct HelmRollbackPlanner;

impl RollbackPlanner for HelmRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::NativeHelm
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    single_step_rollback(forward, "HelmRollback", "Helm Rollback")
  }
}

pub(crate) struct SshRollbackPlanner;

impl RollbackPlanner for SshRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::Ssh
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    let mut phase = rollback_phase_base(forward);
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::DisableService, "Disable Service", "Enable Service")
        .with_step(PhaseStepNode::new("SshDisableService", "Disable Service", true)),
    );
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::StopService, "Stop Service", "Deploy Service")
        .with_step(PhaseStepNode::new("SshStopService", "Stop Service", true)),
    );
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::DeployService, "Deploy Service", "Deploy Service")
        .with_step(PhaseStepNode::new("SshDeploy", "Install", true)),
    );
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::EnableService, "Enable Service", "Disable Service")
        .with_step(PhaseStepNode::new("SshEnableService", "Enable Service", true)),
    );
    phase.step_groups.push(PhaseStepGroup::rollback(
      PhaseStepType::VerifyService,
      "Verify",
      "Deploy Service",
    ));
    phase
      .step_groups
      .push(PhaseStepGroup::rollback(PhaseStepType::WrapUp, "Wrap Up", "Wrap Up"));
    phase
  }
}

pub(crate) struct EcsRollbackPlanner;

impl RollbackPlanner for EcsRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::Ecs
  }

  fn plan(&self, forward: &WorkflowPhase, service_repeat: bool) -> WorkflowPhase {
    let mut phase = rollback_phase_base(forward);
    phase.step_groups.push(
      PhaseStepGroup::rollback(PhaseStepType::Deploy, "Deploy", "Deploy")
        .with_step(PhaseStepNode::new("EcsServiceRollback", "Rollback Containers", true)),
    );
    if !service_repeat {
      phase.step_groups.push(
        PhaseStepGroup::rollback(PhaseStepType::ServiceSetup, "Setup", "Setup")
          .with_step(PhaseStepNode::new("EcsSetupRollback", "Rollback Ecs Setup", true)),
      );
    }
    phase.step_groups.push(PhaseStepGroup::rollback(
      PhaseStepType::VerifyService,
      "Verify",
      "Deploy",
    ));
    phase
      .step_groups
      .push(PhaseStepGroup::rollback(PhaseStepType::WrapUp, "Wrap Up", "Wrap Up"));
    phase
  }
}

pub(crate) struct PcfRollbackPlanner;

impl RollbackPlanner for PcfRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::Pcf
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    single_step_rollback(forward, "PcfRollback", "App Rollback")
  }
}

pub(crate) struct AmiRollbackPlanner;

impl RollbackPlanner for AmiRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::Ami
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    single_step_rollback(forward, "AmiServiceRollback", "Rollback AutoScaling Group")
  }
}

pub(crate) struct LambdaRollbackPlanner;

impl RollbackPlanner for LambdaRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::ServerlessAwsLambda
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    single_step_rollback(forward, "LambdaRollback", "Rollback AWS Lambda")
  }
}

pub(crate) struct CodeDeployRollbackPlanner;

impl RollbackPlanner for CodeDeployRollbackPlanner {
  fn deployment_type(&self) -> DeploymentType {
    DeploymentType::CodeDeploy
  }

  fn plan(&self, forward: &WorkflowPhase, _service_repeat: bool) -> WorkflowPhase {
    single_step_rollback(forward, "CodeDeployRollback", "Rollback AWS CodeDeploy")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::PhaseBuilder;
  use larkspur_stencil::StencilRegistry;

  fn forward(deployment_type: DeploymentType, service_repeat: bool) -> WorkflowPhase {
    PhaseBuilder::new(StencilRegistry::builtin())
      .forward_phase(deployment_type, "Phase 1", Some("svc-1".into()), Some("infra-1".into()), service_repeat)
      .unwrap()
  }

  #[test]
  fn test_kubernetes_rollback_undoes_setup_when_not_shared() {
    let forward = forward(DeploymentType::Kubernetes, false);
    let rollback = KubernetesRollbackPlanner.plan(&forward, false);

    assert!(rollback.rollback);
    let setup = rollback.group(PhaseStepType::ServiceSetup).unwrap();
    assert_eq!(setup.steps[0].step_kind, "K8sSetupRollback");
    assert_eq!(setup.phase_step_name_for_rollback.as_deref(), Some("Setup"));
  }

  #[test]
  fn test_kubernetes_rollback_assumes_shared_setup() {
    let forward = forward(DeploymentType::Kubernetes, true);
    let rollback = KubernetesRollbackPlanner.plan(&forward, true);
    assert!(rollback.group(PhaseStepType::ServiceSetup).is_none());
  }

  #[test]
  fn test_rollback_keeps_service_and_infra_ids() {
    let forward = forward(DeploymentType::Pcf, false);
    let rollback = PcfRollbackPlanner.plan(&forward, false);

    assert_eq!(rollback.service_node_id, forward.service_node_id);
    assert_eq!(rollback.infra_node_id, forward.infra_node_id);
    assert_ne!(rollback.phase_id, forward.phase_id);
  }

  #[test]
  fn test_ssh_rollback_mirrors_service_commands() {
    let forward = forward(DeploymentType::Ssh, false);
    let rollback = SshRollbackPlanner.plan(&forward, false);

    let kinds: Vec<_> = rollback
      .step_groups
      .iter()
      .map(|g| g.group_type)
      .collect();
    assert_eq!(
      kinds,
      vec![
        PhaseStepType::DisableService,
        PhaseStepType::StopService,
        PhaseStepType::DeployService,
        PhaseStepType::EnableService,
        PhaseStepType::VerifyService,
        PhaseStepType::WrapUp,
      ]
    );
    let disable = rollback.group(PhaseStepType::DisableService).unwrap();
    assert_eq!(
      disable.phase_step_name_for_rollback.as_deref(),
      Some("Enable Service")
    );
    assert!(disable.steps.iter().all(|s| s.rollback));
  }
}
