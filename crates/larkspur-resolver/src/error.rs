use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
  /// A `useFromStage` reference with a blank stage identifier.
  #[error("stage identifier is empty in useFromStage")]
  MissingStageIdentifier,

  /// The referenced stage does not exist in the document.
  #[error("stage '{stage_id}' given in useFromStage does not exist")]
  StageNotFound { stage_id: String },

  /// The referenced stage exists but cannot be interpreted into the
  /// expected shape (no service/environment section to propagate).
  #[error("cannot propagate from stage '{stage_id}': {message}")]
  MalformedStage { stage_id: String, message: String },

  /// The referenced stage itself uses `useFromStage`.
  #[error(
    "invalid stage '{stage_id}' in useFromStage: cannot reference a stage that also uses useFromStage"
  )]
  ChainedStageReference { stage_id: String },

  /// The reference chain revisits a stage.
  #[error("useFromStage reference cycle: {}", chain.join(" -> "))]
  CircularStageReference { chain: Vec<String> },

  /// A stage declares both an inline definition and a `useFromStage`
  /// reference.
  #[error("stage '{stage_id}' declares both a service definition and useFromStage; they are mutually exclusive")]
  ConflictingServiceSource { stage_id: String },

  /// The stage has no service section at all.
  #[error("stage '{stage_id}' has no service configured")]
  NoServiceConfigured { stage_id: String },

  /// A service is present but its `serviceDefinition` section is missing.
  #[error("serviceDefinition missing in service '{service_identifier}'")]
  MissingServiceDefinition { service_identifier: String },

  /// A `serviceDefinition` is present but its `spec` section is missing.
  #[error("spec missing inside serviceDefinition of service '{service_identifier}'")]
  MissingServiceSpec { service_identifier: String },

  /// The primary artifact reference names a source that is not declared.
  #[error(
    "primary artifact reference '{reference}' does not match any declared artifact source; declared sources: [{}]",
    declared.join(", ")
  )]
  PrimaryArtifactSourceNotFound {
    reference: String,
    declared: Vec<String>,
  },

  /// The primary artifact reference is a runtime expression where a
  /// concrete value is required.
  #[error("primary artifact reference '{reference}' is a runtime expression; a concrete source identifier is required at compile time")]
  PrimaryArtifactRefExpression { reference: String },
}
