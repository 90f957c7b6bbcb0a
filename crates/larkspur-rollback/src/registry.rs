use std::collections::HashMap;

use larkspur_config::DeploymentType;

use crate::RollbackError;
use crate::planner::RollbackPlanner;
use crate::planners::{
  AmiRollbackPlanner, CodeDeployRollbackPlanner, EcsRollbackPlanner, HelmRollbackPlanner,
  KubernetesRollbackPlanner, LambdaRollbackPlanner, PcfRollbackPlanner, SshRollbackPlanner,
};

/// Lookup table of rollback planners keyed by deployment type.
///
/// Deployment types without a planner (stateless ones) simply get no
/// rollback phase. Adding a deployment type means adding one planner and
/// one registration here.
#[derive(Default)]
pub struct RollbackPlannerRegistry {
  planners: HashMap<DeploymentType, Box<dyn RollbackPlanner>>,
}

impl RollbackPlannerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The planners for every deployment type with a distinct rollback
  /// shape.
  pub fn defaults() -> Self {
    let mut registry = Self::new();
    // A duplicate here is a programming error caught by the unit tests.
    for planner in [
      Box::new(KubernetesRollbackPlanner) as Box<dyn RollbackPlanner>,
      Box::new(HelmRollbackPlanner),
      Box::new(SshRollbackPlanner),
      Box::new(EcsRollbackPlanner),
      Box::new(PcfRollbackPlanner),
      Box::new(AmiRollbackPlanner),
      Box::new(LambdaRollbackPlanner),
      Box::new(CodeDeployRollbackPlanner),
    ] {
      registry
        .register(planner)
        .expect("default rollback planners must not collide");
    }
    registry
  }

  pub fn register(&mut self, planner: Box<dyn RollbackPlanner>) -> Result<(), RollbackError> {
    let deployment_type = planner.deployment_type();
    if self.planners.contains_key(&deployment_type) {
      return Err(RollbackError::DuplicatePlanner { deployment_type });
    }
    self.planners.insert(deployment_type, planner);
    Ok(())
  }

  pub fn get(&self, deployment_type: DeploymentType) -> Option<&dyn RollbackPlanner> {
    self.planners.get(&deployment_type).map(|p| p.as_ref())
  }

  pub fn len(&self) -> usize {
    self.planners.len()
  }

  pub fn is_empty(&self) -> bool {
    self.planners.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_cover_stateful_deployment_types() {
    let registry = RollbackPlannerRegistry::defaults();
    assert_eq!(registry.len(), 8);
    for deployment_type in [
      DeploymentType::Kubernetes,
      DeploymentType::NativeHelm,
      DeploymentType::Ssh,
      DeploymentType::Ecs,
      DeploymentType::Pcf,
      DeploymentType::Ami,
      DeploymentType::ServerlessAwsLambda,
      DeploymentType::CodeDeploy,
    ] {
      assert!(registry.get(deployment_type).is_some(), "{deployment_type}");
    }
    assert!(registry.get(DeploymentType::WinRm).is_none());
    assert!(registry.get(DeploymentType::AzureWebApp).is_none());
  }

  #[test]
  fn test_duplicate_registration_rejected() {
    let mut registry = RollbackPlannerRegistry::defaults();
    let err = registry
      .register(Box::new(KubernetesRollbackPlanner))
      .unwrap_err();
    assert!(matches!(err, RollbackError::DuplicatePlanner { .. }));
  }
}
