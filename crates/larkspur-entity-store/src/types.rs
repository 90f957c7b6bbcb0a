use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use larkspur_config::{
  ApplicationSettingsConfig, ConfigFileWrapper, ConnectionStringsConfig,
  EnvironmentGlobalOverride, EnvironmentType, ManifestConfigWrapper, OverrideSet,
  ServiceDefinition, VariableConfig,
};

/// Scoped key for an entity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
  pub account_id: String,
  pub org_id: String,
  pub project_id: String,
  pub identifier: String,
}

impl EntityRef {
  pub fn new(
    account_id: impl Into<String>,
    org_id: impl Into<String>,
    project_id: impl Into<String>,
    identifier: impl Into<String>,
  ) -> Self {
    Self {
      account_id: account_id.into(),
      org_id: org_id.into(),
      project_id: project_id.into(),
      identifier: identifier.into(),
    }
  }

  /// The same scope with a different identifier.
  pub fn sibling(&self, identifier: impl Into<String>) -> Self {
    Self {
      account_id: self.account_id.clone(),
      org_id: self.org_id.clone(),
      project_id: self.project_id.clone(),
      identifier: identifier.into(),
    }
  }
}

fn now() -> DateTime<Utc> {
  Utc::now()
}

/// A service document as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntity {
  pub identifier: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_definition: Option<ServiceDefinition>,
  #[serde(default = "now")]
  pub created_at: DateTime<Utc>,
  #[serde(default = "now")]
  pub last_modified_at: DateTime<Utc>,
}

/// An environment document as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentEntity {
  pub identifier: String,
  pub name: String,
  pub environment_type: EnvironmentType,
  /// Overrides applied to every service deployed into this environment.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub global_override: Option<EnvironmentGlobalOverride>,
  /// Named override sets stages can opt into.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub override_sets: Vec<OverrideSet>,
  #[serde(default = "now")]
  pub created_at: DateTime<Utc>,
  #[serde(default = "now")]
  pub last_modified_at: DateTime<Utc>,
}

/// The per-service, per-environment override document.
///
/// The most specific override layer; wins over the environment's global
/// override wherever both set the same field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverrideEntity {
  pub environment_ref: String,
  pub service_ref: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manifests: Vec<ManifestConfigWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub config_files: Vec<ConfigFileWrapper>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub application_settings: Option<ApplicationSettingsConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connection_strings: Option<ConnectionStringsConfig>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub variables: Vec<VariableConfig>,
}
