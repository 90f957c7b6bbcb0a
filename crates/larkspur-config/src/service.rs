use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactListConfig;
use crate::enums::DeploymentType;
use crate::manifest::{ConfigFileWrapper, ManifestConfigWrapper};
use crate::overrides::{
  ApplicationSettingsConfig, ConnectionStringsConfig, StageOverrides, StartupCommandConfig,
  VariableConfig,
};

/// The service section of a stage.
///
/// Exactly one of `definition` or `use_from_stage` may be present: a stage
/// either defines its service inline (or by `service_ref` into the entity
/// store) or reuses the service of a sibling stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  /// Reference to a service entity in the store.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_ref: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub definition: Option<ServiceDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_from_stage: Option<UseFromStage>,
  /// Inline overrides declared directly on the stage.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stage_overrides: Option<StageOverrides>,
}

/// Reference to another stage's service or environment subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseFromStage {
  /// Identifier of the originating stage.
  pub stage: String,
  /// Field-level overrides applied on top of the propagated subtree.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overrides: Option<PropagateOverrides>,
}

/// Overrides carried by a `useFromStage` reference.
///
/// Only the fields explicitly set here are applied; everything else comes
/// from the originating stage verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateOverrides {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// An inline service definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_definition: Option<ServiceDefinition>,
}

/// The typed definition of a service: its deployment-type-specific spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec: Option<ServiceSpec>,
}

/// Deployment-type-specific service spec.
///
/// This is a closed union: consumers match exhaustively so that adding a
/// variant fails to compile until every site handles it. Only
/// `AzureWebApp` carries platform-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServiceSpec {
  Kubernetes(BaseServiceSpec),
  Ssh(BaseServiceSpec),
  WinRm(BaseServiceSpec),
  NativeHelm(BaseServiceSpec),
  ServerlessAwsLambda(BaseServiceSpec),
  AzureWebApp(AzureWebAppSpec),
}

impl ServiceSpec {
  /// The collections shared by every deployment type.
  pub fn base(&self) -> &BaseServiceSpec {
    match self {
      ServiceSpec::Kubernetes(base)
      | ServiceSpec::Ssh(base)
      | ServiceSpec::WinRm(base)
      | ServiceSpec::NativeHelm(base)
      | ServiceSpec::ServerlessAwsLambda(base) => base,
      ServiceSpec::AzureWebApp(spec) => &spec.base,
    }
  }

  pub fn base_mut(&mut self) -> &mut BaseServiceSpec {
    match self {
      ServiceSpec::Kubernetes(base)
      | ServiceSpec::Ssh(base)
      | ServiceSpec::WinRm(base)
      | ServiceSpec::NativeHelm(base)
      | ServiceSpec::ServerlessAwsLambda(base) => base,
      ServiceSpec::AzureWebApp(spec) => &mut spec.base,
    }
  }

  pub fn deployment_type(&self) -> DeploymentType {
    match self {
      ServiceSpec::Kubernetes(_) => DeploymentType::Kubernetes,
      ServiceSpec::Ssh(_) => DeploymentType::Ssh,
      ServiceSpec::WinRm(_) => DeploymentType::WinRm,
      ServiceSpec::NativeHelm(_) => DeploymentType::NativeHelm,
      ServiceSpec::ServerlessAwsLambda(_) => DeploymentType::ServerlessAwsLambda,
      ServiceSpec::AzureWebApp(_) => DeploymentType::AzureWebApp,
    }
  }
}

/// Collections common to every service spec variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseServiceSpec {
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

/// Azure Web App spec: the base collections plus the platform settings that
/// only exist for this deployment type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureWebAppSpec {
  #[serde(flatten)]
  pub base: BaseServiceSpec,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub startup_command: Option<StartupCommandConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub application_settings: Option<ApplicationSettingsConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connection_strings: Option<ConnectionStringsConfig>,
}
