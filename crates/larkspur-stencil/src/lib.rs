//! Larkspur Stencil
//!
//! Catalog of the step kinds that are legal within a given deployment
//! type. The registry is immutable once built: construct it explicitly
//! (or load a catalog file) and pass it by reference to every compiler
//! invocation. [`StencilRegistry::builtin`] memoizes the default catalog
//! process-wide under a single initialization guard for callers that do
//! not bring their own.

mod builtin;
mod registry;

pub use registry::{
  Stencil, StencilRegistry, StencilRegistryBuilder, StencilScope, StepCategory,
};

use thiserror::Error;

/// Errors raised by registry construction and queries.
#[derive(Debug, Error)]
pub enum StencilError {
  /// A step kind was registered twice.
  #[error("step kind '{step_kind}' registered twice")]
  DuplicateStepKind { step_kind: String },

  /// A step kind is unknown to the registry.
  #[error("unknown step kind '{step_kind}'")]
  UnknownStepKind { step_kind: String },

  /// A step kind exists but is not legal for the deployment type.
  #[error("step kind '{step_kind}' is not legal for deployment type {deployment_type}")]
  IllegalForDeploymentType {
    step_kind: String,
    deployment_type: larkspur_config::DeploymentType,
  },

  /// A catalog file could not be read or parsed.
  #[error("failed to load stencil catalog from '{path}': {message}")]
  Catalog { path: String, message: String },
}
