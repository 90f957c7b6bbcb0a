//! The built-in stencil catalog.

use std::sync::OnceLock;

use larkspur_config::DeploymentType;

use crate::registry::{Stencil, StencilRegistry, StencilScope, StepCategory};

static BUILTIN: OnceLock<StencilRegistry> = OnceLock::new();

pub(crate) fn builtin() -> &'static StencilRegistry {
  BUILTIN.get_or_init(|| build().expect("builtin stencil catalog has duplicate step kinds"))
}

fn build() -> Result<StencilRegistry, crate::StencilError> {
  use DeploymentType::*;
  use StepCategory::*;

  let common = |kind: &str, category| {
    Stencil::new(kind, category, [StencilScope::Common])
  };
  let scoped = |kind: &str, category, deployment_type| {
    Stencil::new(kind, category, [StencilScope::Deployment(deployment_type)])
  };

  let registry = StencilRegistry::builder()
    .register(common("ShellScript", Deploy))?
    .register(common("Http", Deploy))?
    .register(common("Wait", Deploy))?
    .register(common("Verify", Verify))?
    // Kubernetes
    .register(scoped("K8sSetup", Setup, Kubernetes))?
    .register(scoped("K8sRollingDeploy", Deploy, Kubernetes))?
    .register(scoped("K8sRollingRollback", Rollback, Kubernetes))?
    .register(scoped("K8sSetupRollback", Rollback, Kubernetes))?
    // Native helm
    .register(scoped("HelmDeploy", Deploy, NativeHelm))?
    .register(scoped("HelmRollback", Rollback, NativeHelm))?
    // SSH
    .register(scoped("SshSetup", Setup, Ssh))?
    .register(scoped("SshDeploy", Deploy, Ssh))?
    .register(scoped("SshDisableService", Deploy, Ssh))?
    .register(scoped("SshEnableService", Deploy, Ssh))?
    .register(scoped("SshStopService", Rollback, Ssh))?
    // WinRM
    .register(scoped("WinRmDeploy", Deploy, WinRm))?
    // ECS
    .register(scoped("EcsServiceSetup", Setup, Ecs))?
    .register(scoped("EcsServiceDeploy", Deploy, Ecs))?
    .register(scoped("EcsServiceRollback", Rollback, Ecs))?
    .register(scoped("EcsSetupRollback", Rollback, Ecs))?
    // PCF
    .register(scoped("PcfSetup", Setup, Pcf))?
    .register(scoped("PcfResize", Deploy, Pcf))?
    .register(scoped("PcfRollback", Rollback, Pcf))?
    // AMI
    .register(scoped("AmiSetupAutoScalingGroup", Setup, Ami))?
    .register(scoped("AmiDeployAutoScalingGroup", Deploy, Ami))?
    .register(scoped("AmiServiceRollback", Rollback, Ami))?
    // Serverless lambda
    .register(scoped("LambdaDeploy", Deploy, ServerlessAwsLambda))?
    .register(scoped("LambdaRollback", Rollback, ServerlessAwsLambda))?
    // CodeDeploy
    .register(scoped("CodeDeployApp", Deploy, CodeDeploy))?
    .register(scoped("CodeDeployRollback", Rollback, CodeDeploy))?
    // Azure web app
    .register(scoped("AzureWebAppSlotDeploy", Deploy, AzureWebApp))?
    .register(scoped("AzureWebAppTrafficShift", Deploy, AzureWebApp))?
    .build();

  Ok(registry)
}
