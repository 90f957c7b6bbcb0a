use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use larkspur_config::DeploymentType;

use crate::StencilError;

/// Broad category of a step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepCategory {
  Setup,
  Deploy,
  Verify,
  Rollback,
  WrapUp,
}

/// Where a step kind may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StencilScope {
  /// Legal for every deployment type.
  Common,
  /// Legal only for one deployment type.
  Deployment(DeploymentType),
}

/// A registered, legal step kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stencil {
  pub step_kind: String,
  pub category: StepCategory,
  pub scopes: HashSet<StencilScope>,
}

impl Stencil {
  pub fn new(
    step_kind: impl Into<String>,
    category: StepCategory,
    scopes: impl IntoIterator<Item = StencilScope>,
  ) -> Self {
    Self {
      step_kind: step_kind.into(),
      category,
      scopes: scopes.into_iter().collect(),
    }
  }

  pub fn legal_for(&self, deployment_type: DeploymentType) -> bool {
    self.scopes.contains(&StencilScope::Common)
      || self.scopes.contains(&StencilScope::Deployment(deployment_type))
  }
}

/// Builder for [`StencilRegistry`]; rejects duplicate step kinds.
#[derive(Debug, Default)]
pub struct StencilRegistryBuilder {
  by_kind: BTreeMap<String, Stencil>,
}

impl StencilRegistryBuilder {
  pub fn register(mut self, stencil: Stencil) -> Result<Self, StencilError> {
    if self.by_kind.contains_key(&stencil.step_kind) {
      return Err(StencilError::DuplicateStepKind {
        step_kind: stencil.step_kind,
      });
    }
    self.by_kind.insert(stencil.step_kind.clone(), stencil);
    Ok(self)
  }

  pub fn build(self) -> StencilRegistry {
    StencilRegistry {
      by_kind: self.by_kind,
    }
  }
}

/// Immutable catalog of known step kinds, keyed by step kind.
///
/// Safe to share across concurrently compiling stages; it is never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct StencilRegistry {
  by_kind: BTreeMap<String, Stencil>,
}

impl StencilRegistry {
  pub fn builder() -> StencilRegistryBuilder {
    StencilRegistryBuilder::default()
  }

  /// The default catalog, built once per process.
  pub fn builtin() -> &'static StencilRegistry {
    crate::builtin::builtin()
  }

  /// Load a catalog from a JSON file (a list of stencils).
  pub fn from_catalog_file(path: &Path) -> Result<StencilRegistry, StencilError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StencilError::Catalog {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    let stencils: Vec<Stencil> =
      serde_json::from_str(&contents).map_err(|e| StencilError::Catalog {
        path: path.display().to_string(),
        message: e.to_string(),
      })?;
    let mut builder = StencilRegistry::builder();
    for stencil in stencils {
      builder = builder.register(stencil)?;
    }
    Ok(builder.build())
  }

  pub fn get(&self, step_kind: &str) -> Option<&Stencil> {
    self.by_kind.get(step_kind)
  }

  pub fn len(&self) -> usize {
    self.by_kind.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_kind.is_empty()
  }

  /// Step kinds legal for a deployment type, in stable (sorted) order.
  pub fn legal_for(&self, deployment_type: DeploymentType) -> Vec<&Stencil> {
    self
      .by_kind
      .values()
      .filter(|s| s.legal_for(deployment_type))
      .collect()
  }

  /// Check that a step kind exists and is legal for the deployment type.
  pub fn validate(
    &self,
    step_kind: &str,
    deployment_type: DeploymentType,
  ) -> Result<&Stencil, StencilError> {
    let stencil = self.get(step_kind).ok_or_else(|| StencilError::UnknownStepKind {
      step_kind: step_kind.to_string(),
    })?;
    if !stencil.legal_for(deployment_type) {
      return Err(StencilError::IllegalForDeploymentType {
        step_kind: step_kind.to_string(),
        deployment_type,
      });
    }
    Ok(stencil)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn k8s_stencil(kind: &str) -> Stencil {
    Stencil::new(
      kind,
      StepCategory::Deploy,
      [StencilScope::Deployment(DeploymentType::Kubernetes)],
    )
  }

  #[test]
  fn test_duplicate_registration_rejected() {
    let builder = StencilRegistry::builder()
      .register(k8s_stencil("K8sRollingDeploy"))
      .unwrap();
    let err = builder.register(k8s_stencil("K8sRollingDeploy")).unwrap_err();
    assert!(matches!(err, StencilError::DuplicateStepKind { .. }));
  }

  #[test]
  fn test_common_scope_is_legal_everywhere() {
    let registry = StencilRegistry::builder()
      .register(Stencil::new(
        "ShellScript",
        StepCategory::Deploy,
        [StencilScope::Common],
      ))
      .unwrap()
      .build();

    assert!(registry.validate("ShellScript", DeploymentType::Ssh).is_ok());
    assert!(
      registry
        .validate("ShellScript", DeploymentType::Kubernetes)
        .is_ok()
    );
  }

  #[test]
  fn test_scope_mismatch_rejected() {
    let registry = StencilRegistry::builder()
      .register(k8s_stencil("K8sRollingDeploy"))
      .unwrap()
      .build();

    let err = registry
      .validate("K8sRollingDeploy", DeploymentType::Ssh)
      .unwrap_err();
    assert!(matches!(err, StencilError::IllegalForDeploymentType { .. }));
  }

  #[test]
  fn test_unknown_step_kind() {
    let registry = StencilRegistry::builder().build();
    let err = registry
      .validate("Nope", DeploymentType::Kubernetes)
      .unwrap_err();
    assert!(matches!(err, StencilError::UnknownStepKind { .. }));
  }

  #[test]
  fn test_builtin_is_memoized() {
    let first = StencilRegistry::builtin() as *const _;
    let second = StencilRegistry::builtin() as *const _;
    assert_eq!(first, second);
  }
}
