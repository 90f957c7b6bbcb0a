use serde::{Deserialize, Serialize};

/// The artifacts section of a service spec.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactListConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub primary: Option<PrimaryArtifact>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sidecars: Vec<SidecarArtifactWrapper>,
}

impl ArtifactListConfig {
  /// Whether the list declares any artifact at all.
  pub fn is_empty(&self) -> bool {
    self.primary.is_none() && self.sidecars.is_empty()
  }
}

/// The primary artifact of a service.
///
/// Either a single inline source, or a set of declared sources with
/// `primary_artifact_ref` naming which one is primary. The reference must be
/// a concrete identifier at compile time; runtime expressions are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryArtifact {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub primary_artifact_ref: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sources: Vec<ArtifactSource>,
  /// Inline source payload when no `sources` list is declared.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec: Option<serde_json::Value>,
}

/// One declared artifact source (registry, repository, tag, ...).
///
/// The payload is opaque to the compiler; only the identifier and source
/// type participate in plan creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSource {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  pub identifier: String,
  #[serde(rename = "type")]
  pub source_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec: Option<serde_json::Value>,
}

/// Wrapper around a sidecar artifact, matching the document nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarArtifactWrapper {
  pub sidecar: ArtifactSource,
}
