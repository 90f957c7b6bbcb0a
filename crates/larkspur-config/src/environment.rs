use serde::{Deserialize, Serialize};

use crate::service::UseFromStage;

/// The environment section of a stage.
///
/// Either a reference into the entity store (`environment_ref`) or a reuse
/// of a sibling stage's environment (`use_from_stage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentYaml {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub environment_ref: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_from_stage: Option<UseFromStage>,
  #[serde(default)]
  pub deploy_to_all: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub infrastructure_definitions: Vec<InfraDefinitionYaml>,
  /// Optional provisioner subtree; expanded as its own plan node ahead of
  /// the infrastructure node when present.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provisioner: Option<serde_json::Value>,
}

/// One infrastructure definition inside an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraDefinitionYaml {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub inputs: Option<serde_json::Value>,
}
