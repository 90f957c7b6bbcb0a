use uuid::Uuid;

use larkspur_config::DeploymentType;
use larkspur_stencil::StencilRegistry;

use crate::RollbackError;
use crate::types::{PhaseStepGroup, PhaseStepNode, PhaseStepType, WorkflowPhase};

/// Builds the forward execution phase for a deployment type.
///
/// Step kinds are validated against the stencil registry before the phase
/// is assembled; `service_repeat` drops the setup group when a prior phase
/// already set the service up.
pub struct PhaseBuilder<'a> {
  stencils: &'a StencilRegistry,
}

impl<'a> PhaseBuilder<'a> {
  pub fn new(stencils: &'a StencilRegistry) -> Self {
    Self { stencils }
  }

  pub fn forward_phase(
    &self,
    deployment_type: DeploymentType,
    name: impl Into<String>,
    service_node_id: Option<String>,
    infra_node_id: Option<String>,
    service_repeat: bool,
  ) -> Result<WorkflowPhase, RollbackError> {
    let mut step_groups = Vec::new();

    if !service_repeat {
      if let Some((step_kind, step_name)) = setup_step(deployment_type) {
        self.stencils.validate(step_kind, deployment_type)?;
        step_groups.push(
          PhaseStepGroup::forward(PhaseStepType::ServiceSetup, "Setup")
            .with_step(PhaseStepNode::new(step_kind, step_name, false)),
        );
      }
    }

    let (deploy_kind, deploy_name) = deploy_step(deployment_type);
    self.stencils.validate(deploy_kind, deployment_type)?;
    step_groups.push(
      PhaseStepGroup::forward(PhaseStepType::Deploy, "Deploy")
        .with_step(PhaseStepNode::new(deploy_kind, deploy_name, false)),
    );

    self.stencils.validate("Verify", deployment_type)?;
    step_groups.push(
      PhaseStepGroup::forward(PhaseStepType::VerifyService, "Verify")
        .with_step(PhaseStepNode::new("Verify", "Verify Service", false)),
    );
    step_groups.push(PhaseStepGroup::forward(PhaseStepType::WrapUp, "Wrap Up"));

    Ok(WorkflowPhase {
      phase_id: Uuid::new_v4().to_string(),
      name: name.into(),
      deployment_type,
      service_node_id,
      infra_node_id,
      rollback: false,
      service_repeat,
      step_groups,
    })
  }
}

/// The setup step for deployment types that need one before deploying.
fn setup_step(deployment_type: DeploymentType) -> Option<(&'static str, &'static str)> {
  match deployment_type {
    DeploymentType::Kubernetes => Some(("K8sSetup", "Setup Kubernetes")),
    DeploymentType::Ssh => Some(("SshSetup", "Setup Service")),
    DeploymentType::Ecs => Some(("EcsServiceSetup", "Setup Ecs Service")),
    DeploymentType::Pcf => Some(("PcfSetup", "Setup Application")),
    DeploymentType::Ami => Some(("AmiSetupAutoScalingGroup", "Setup AutoScaling Group")),
    DeploymentType::NativeHelm
    | DeploymentType::WinRm
    | DeploymentType::ServerlessAwsLambda
    | DeploymentType::AzureWebApp
    | DeploymentType::CodeDeploy => None,
  }
}

fn deploy_step(deployment_type: DeploymentType) -> (&'static str, &'static str) {
  match deployment_type {
    DeploymentType::Kubernetes => ("K8sRollingDeploy", "Rolling Deployment"),
    DeploymentType::NativeHelm => ("HelmDeploy", "Helm Deploy"),
    DeploymentType::Ssh => ("SshDeploy", "Deploy Service"),
    DeploymentType::WinRm => ("WinRmDeploy", "Deploy Service"),
    DeploymentType::ServerlessAwsLambda => ("LambdaDeploy", "AWS Lambda"),
    DeploymentType::AzureWebApp => ("AzureWebAppSlotDeploy", "Slot Deployment"),
    DeploymentType::Ecs => ("EcsServiceDeploy", "Upgrade Containers"),
    DeploymentType::Pcf => ("PcfResize", "Resize"),
    DeploymentType::Ami => ("AmiDeployAutoScalingGroup", "Deploy AutoScaling Group"),
    DeploymentType::CodeDeploy => ("CodeDeployApp", "AWS CodeDeploy"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kubernetes_phase_has_setup_and_deploy() {
    let builder = PhaseBuilder::new(StencilRegistry::builtin());
    let phase = builder
      .forward_phase(DeploymentType::Kubernetes, "Phase 1", None, None, false)
      .unwrap();

    assert!(phase.group(PhaseStepType::ServiceSetup).is_some());
    let deploy = phase.group(PhaseStepType::Deploy).unwrap();
    assert_eq!(deploy.steps[0].step_kind, "K8sRollingDeploy");
  }

  #[test]
  fn test_service_repeat_skips_setup() {
    let builder = PhaseBuilder::new(StencilRegistry::builtin());
    let phase = builder
      .forward_phase(DeploymentType::Kubernetes, "Phase 2", None, None, true)
      .unwrap();

    assert!(phase.group(PhaseStepType::ServiceSetup).is_none());
    assert!(phase.service_repeat);
  }

  #[test]
  fn test_helm_phase_has_no_setup_group() {
    let builder = PhaseBuilder::new(StencilRegistry::builtin());
    let phase = builder
      .forward_phase(DeploymentType::NativeHelm, "Phase 1", None, None, false)
      .unwrap();

    assert!(phase.group(PhaseStepType::ServiceSetup).is_none());
    assert_eq!(
      phase.group(PhaseStepType::Deploy).unwrap().steps[0].step_kind,
      "HelmDeploy"
    );
  }
}
