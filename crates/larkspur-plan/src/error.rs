use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
  #[error("node id '{node_id}' already present in plan")]
  DuplicateNode { node_id: String },

  #[error("node '{node_id}' not found in plan")]
  NodeNotFound { node_id: String },

  #[error("failed to encode dependency metadata '{key}': {message}")]
  MetadataEncode { key: String, message: String },

  #[error("failed to decode dependency metadata '{key}': {message}")]
  MetadataDecode { key: String, message: String },

  #[error("dependency metadata key '{key}' missing")]
  MetadataMissing { key: String },
}
