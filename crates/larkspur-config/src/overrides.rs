use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactListConfig;
use crate::manifest::{ConfigFileWrapper, ManifestConfigWrapper, StoreConfig};

/// Inline overrides declared directly on a stage's service section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOverrides {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifacts: Option<ArtifactListConfig>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manifests: Vec<ManifestConfigWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub config_files: Vec<ConfigFileWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub variables: Vec<VariableConfig>,
}

/// A named set of overrides declared on an environment entity.
///
/// Ignored unless a stage opts in by listing the identifier in
/// `useOverrideSets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSet {
  pub identifier: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifacts: Option<ArtifactListConfig>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manifests: Vec<ManifestConfigWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub config_files: Vec<ConfigFileWrapper>,
}

/// Overrides an environment applies to every service deployed into it,
/// unless a more specific layer wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentGlobalOverride {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manifests: Vec<ManifestConfigWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub config_files: Vec<ConfigFileWrapper>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub application_settings: Option<ApplicationSettingsConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connection_strings: Option<ConnectionStringsConfig>,
}

/// A service variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableConfig {
  pub name: String,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub variable_type: Option<String>,
  pub value: serde_json::Value,
}

/// Azure Web App startup command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupCommandConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub store: StoreConfig,
}

/// Azure Web App application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSettingsConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub store: StoreConfig,
}

/// Azure Web App connection strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStringsConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub store: StoreConfig,
}
