use thiserror::Error;

use larkspur_entity_store::StoreError;
use larkspur_plan::PlanError;
use larkspur_resolver::ResolveError;
use larkspur_rollback::RollbackError;
use larkspur_stencil::StencilError;

#[derive(Debug, Error)]
pub enum CompileError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Stencil(#[from] StencilError),

  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Rollback(#[from] RollbackError),

  /// A referenced service entity was not found in the store.
  #[error("service '{service_ref}' not found in entity store")]
  ServiceNotFound { service_ref: String },

  /// A referenced environment entity was not found in the store.
  #[error("environment '{environment_ref}' not found in entity store")]
  EnvironmentNotFound { environment_ref: String },

  /// A stage opted into an override set the environment does not declare.
  #[error("override set '{identifier}' not declared by environment '{environment_ref}'")]
  OverrideSetNotFound {
    identifier: String,
    environment_ref: String,
  },

  /// The referenced service entity carries no service definition.
  #[error("serviceDefinition missing inside service entity '{service_ref}'")]
  ServiceEntityMissingDefinition { service_ref: String },

  /// A creator re-emitted a dependency id that was already expanded.
  #[error("dependency '{node_id}' emitted twice; expansion must be idempotent")]
  DuplicateDependency { node_id: String },

  /// The compilation was cancelled.
  #[error("compilation cancelled")]
  Cancelled,
}
