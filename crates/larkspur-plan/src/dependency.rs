use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::PlanError;

/// Which creator must expand a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyKind {
  ServiceDefinition,
  ServiceSpec,
  Artifacts,
  Manifests,
  ConfigFiles,
  StartupCommand,
  ApplicationSettings,
  ConnectionStrings,
}

/// Well-known metadata keys attached to dependencies.
pub mod metadata_keys {
  /// The serialized effective service spec.
  pub const EFFECTIVE_SPEC: &str = "effectiveSpec";
  /// The deployment type of the owning service definition.
  pub const DEPLOYMENT_TYPE: &str = "deploymentType";
  /// The id of the environment/infrastructure node the service chain links
  /// to.
  pub const ENVIRONMENT_NODE_ID: &str = "environmentNodeId";
  /// The id of the node that owns this dependency.
  pub const PARENT_NODE_ID: &str = "parentNodeId";
}

/// Typed key-value side-channel attached 1:1 to a dependency.
///
/// Values are serialized bytes; downstream creators read them back through
/// [`DependencyMetadata::get`]. This carries context that is not
/// expressible in the raw subtree itself (the merged effective spec, the
/// environment node id, ...), without resorting to global state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyMetadata {
  entries: HashMap<String, Vec<u8>>,
}

impl DependencyMetadata {
  pub fn new() -> Self {
    Self::default()
  }

  /// Serialize and store a value under `key`.
  pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), PlanError> {
    let bytes = serde_json::to_vec(value).map_err(|e| PlanError::MetadataEncode {
      key: key.to_string(),
      message: e.to_string(),
    })?;
    self.entries.insert(key.to_string(), bytes);
    Ok(())
  }

  /// Read a value stored under `key`, if present.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PlanError> {
    match self.entries.get(key) {
      None => Ok(None),
      Some(bytes) => serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| PlanError::MetadataDecode {
          key: key.to_string(),
          message: e.to_string(),
        }),
    }
  }

  /// Read a value stored under `key`, failing when absent.
  pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, PlanError> {
    self.get(key)?.ok_or_else(|| PlanError::MetadataMissing {
      key: key.to_string(),
    })
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// An unexpanded subtree awaiting a later compiler pass.
///
/// Consumed exactly once by the matching creator; the worklist rejects a
/// second dependency with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
  /// Id of the node this dependency will expand into.
  pub node_id: String,
  pub kind: DependencyKind,
  /// The raw subtree to expand.
  pub raw: serde_json::Value,
  pub metadata: DependencyMetadata,
}

impl Dependency {
  pub fn new(node_id: impl Into<String>, kind: DependencyKind, raw: serde_json::Value) -> Self {
    Self {
      node_id: node_id.into(),
      kind,
      raw,
      metadata: DependencyMetadata::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_metadata_round_trip() {
    let mut metadata = DependencyMetadata::new();
    metadata
      .put(metadata_keys::ENVIRONMENT_NODE_ID, &"env-1".to_string())
      .unwrap();

    let value: Option<String> = metadata.get(metadata_keys::ENVIRONMENT_NODE_ID).unwrap();
    assert_eq!(value.as_deref(), Some("env-1"));
    assert!(metadata.contains(metadata_keys::ENVIRONMENT_NODE_ID));
  }

  #[test]
  fn test_metadata_require_missing_key() {
    let metadata = DependencyMetadata::new();
    let err = metadata.require::<String>("absent").unwrap_err();
    assert!(matches!(err, PlanError::MetadataMissing { .. }));
  }
}
