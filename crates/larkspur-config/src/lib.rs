//! Larkspur Config
//!
//! This crate contains the serializable pipeline document types for Larkspur.
//! These types represent a declarative deployment pipeline before it is
//! resolved and compiled into an executable plan graph.
//!
//! A pipeline document can be loaded from:
//! - YAML files (via CLI with `larkspur compile pipeline.yaml`)
//! - Database storage (as YAML/JSON blobs)
//!
//! The compiler takes these document types, resolves cross-stage references
//! and override layers, and expands them into typed plan nodes for execution.
//!
//! Every addressable subtree carries a `uuid`. Documents authored by hand
//! usually omit them; [`inject_uuids`] assigns a fresh id to every subtree
//! that lacks one while preserving ids that are already present.

mod artifact;
mod enums;
mod environment;
mod expression;
mod manifest;
mod overrides;
mod pipeline;
mod service;
mod uuids;

pub use artifact::{ArtifactListConfig, ArtifactSource, PrimaryArtifact, SidecarArtifactWrapper};
pub use enums::{DeploymentType, EnvironmentType};
pub use environment::{EnvironmentYaml, InfraDefinitionYaml};
pub use expression::is_runtime_expression;
pub use manifest::{
  ConfigFile, ConfigFileWrapper, ManifestConfig, ManifestConfigWrapper, ManifestType, StoreConfig,
};
pub use overrides::{
  ApplicationSettingsConfig, ConnectionStringsConfig, EnvironmentGlobalOverride, OverrideSet,
  StageOverrides, StartupCommandConfig, VariableConfig,
};
pub use pipeline::{PipelineDef, StageDef, StepDef};
pub use service::{
  AzureWebAppSpec, BaseServiceSpec, PropagateOverrides, ServiceConfig, ServiceDef,
  ServiceDefinition, ServiceSpec, UseFromStage,
};
pub use uuids::{inject_uuids, reassign_environment_uuids, reassign_service_uuids};

use thiserror::Error;

/// Errors raised while loading a pipeline document.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The document is not valid YAML or does not match the expected shape.
  #[error("failed to parse pipeline document: {0}")]
  Parse(#[from] serde_yaml::Error),
}

impl PipelineDef {
  /// Parse a pipeline document from YAML and assign ids to subtrees that
  /// lack one.
  pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
    let mut pipeline: PipelineDef = serde_yaml::from_str(yaml)?;
    inject_uuids(&mut pipeline);
    Ok(pipeline)
  }
}
