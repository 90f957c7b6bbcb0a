use serde::{Deserialize, Serialize};

/// Wrapper around a manifest, matching the document nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfigWrapper {
  pub manifest: ManifestConfig,
}

/// A declared manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  #[serde(rename = "type")]
  pub manifest_type: ManifestType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub store: Option<StoreConfig>,
}

/// Kinds of manifests understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestType {
  K8sManifest,
  Values,
  HelmChart,
  Kustomize,
  OpenshiftTemplate,
  ServerlessAwsLambda,
}

/// Wrapper around a config file, matching the document nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileWrapper {
  pub config_file: ConfigFile,
}

/// A declared config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub store: Option<StoreConfig>,
}

/// Where a manifest or config file lives (git, managed file store, ...).
///
/// The connector payload is opaque to the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
  #[serde(rename = "type")]
  pub store_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec: Option<serde_json::Value>,
}
