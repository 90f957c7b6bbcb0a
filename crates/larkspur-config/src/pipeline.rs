use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentYaml;
use crate::service::ServiceConfig;

/// A declarative pipeline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub pipeline_id: String,
  pub name: String,
  #[serde(default)]
  pub stages: Vec<StageDef>,
}

impl PipelineDef {
  /// Find a stage by its identifier.
  pub fn stage(&self, identifier: &str) -> Option<&StageDef> {
    self.stages.iter().find(|s| s.identifier == identifier)
  }
}

/// One unit of a pipeline: a deployment of a service into an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service: Option<ServiceConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub environment: Option<EnvironmentYaml>,
  /// Identifiers of named override sets this stage opts into, applied in
  /// the order listed.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub use_override_sets: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub steps: Vec<StepDef>,
}

/// An execution step declared on a stage.
///
/// The step kind must be registered in the stencil registry for the stage's
/// deployment type; the compiler validates this before wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub step_kind: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec: Option<serde_json::Value>,
}
