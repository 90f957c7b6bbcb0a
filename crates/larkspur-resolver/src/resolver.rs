use tracing::debug;

use larkspur_config::{
  EnvironmentYaml, PipelineDef, ServiceConfig, ServiceDef, StageDef, StageOverrides,
  UseFromStage, reassign_environment_uuids, reassign_service_uuids,
};

use crate::error::ResolveError;

/// The service subtree of a stage after cross-stage references are
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedService {
  /// Reference to a service entity in the store, if the stage (or the
  /// stage it propagates from) uses one.
  pub service_ref: Option<String>,
  /// Inline definition, if present.
  pub definition: Option<ServiceDef>,
  /// The referencing stage's own inline overrides. Propagation never
  /// replaces these; a stage that reuses another stage's service still
  /// applies its own overrides on top.
  pub stage_overrides: Option<StageOverrides>,
  /// Identifier of the stage the subtree was propagated from.
  pub propagated_from: Option<String>,
}

/// The environment subtree of a stage after cross-stage references are
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnvironment {
  pub environment: EnvironmentYaml,
  pub propagated_from: Option<String>,
}

/// Resolves `useFromStage` references against the whole pipeline document.
///
/// Resolution carries a visited-identifier set from the referencing stage
/// through every hop, so any cycle (including direct self-reference) fails
/// with the full chain instead of recursing.
pub struct StageResolver<'a> {
  pipeline: &'a PipelineDef,
}

impl<'a> StageResolver<'a> {
  pub fn new(pipeline: &'a PipelineDef) -> Self {
    Self { pipeline }
  }

  /// Resolve the service subtree of a stage.
  pub fn resolve_service(&self, stage: &StageDef) -> Result<ResolvedService, ResolveError> {
    let config = stage
      .service
      .as_ref()
      .ok_or_else(|| ResolveError::NoServiceConfigured {
        stage_id: stage.identifier.clone(),
      })?;

    if config.definition.is_some() && config.use_from_stage.is_some() {
      return Err(ResolveError::ConflictingServiceSource {
        stage_id: stage.identifier.clone(),
      });
    }

    let Some(use_from_stage) = &config.use_from_stage else {
      return Ok(ResolvedService {
        service_ref: config.service_ref.clone(),
        definition: config.definition.clone(),
        stage_overrides: config.stage_overrides.clone(),
        propagated_from: None,
      });
    };

    let mut visited = vec![stage.identifier.clone()];
    let (source_stage, source_config) =
      self.follow_service_reference(use_from_stage, &mut visited)?;
    debug!(
      from_stage = %stage.identifier,
      source_stage = %source_stage.identifier,
      "propagating service from sibling stage"
    );

    // The substituted copy must not collide with the originating stage's
    // ids; stamp fresh ones scoped to the referencing stage.
    let mut substituted = ServiceConfig {
      uuid: config.uuid.clone(),
      service_ref: source_config.service_ref.clone(),
      definition: source_config.definition.clone(),
      use_from_stage: None,
      stage_overrides: None,
    };
    reassign_service_uuids(&mut substituted);

    if let Some(definition) = &mut substituted.definition {
      apply_propagate_overrides(definition, use_from_stage);
    }

    Ok(ResolvedService {
      service_ref: substituted.service_ref,
      definition: substituted.definition,
      stage_overrides: config.stage_overrides.clone(),
      propagated_from: Some(source_stage.identifier.clone()),
    })
  }

  /// Resolve the environment subtree of a stage, if one is declared.
  pub fn resolve_environment(
    &self,
    stage: &StageDef,
  ) -> Result<Option<ResolvedEnvironment>, ResolveError> {
    let Some(environment) = &stage.environment else {
      return Ok(None);
    };

    let Some(use_from_stage) = &environment.use_from_stage else {
      return Ok(Some(ResolvedEnvironment {
        environment: environment.clone(),
        propagated_from: None,
      }));
    };

    let mut visited = vec![stage.identifier.clone()];
    let (source_stage, source_environment) =
      self.follow_environment_reference(use_from_stage, &mut visited)?;
    debug!(
      from_stage = %stage.identifier,
      source_stage = %source_stage.identifier,
      "propagating environment from sibling stage"
    );

    let mut substituted = source_environment.clone();
    substituted.use_from_stage = None;
    reassign_environment_uuids(&mut substituted);
    // Keep the referencing stage's own subtree id so the environment node
    // stays addressable from this stage.
    substituted.uuid = environment.uuid.clone();

    Ok(Some(ResolvedEnvironment {
      environment: substituted,
      propagated_from: Some(source_stage.identifier.clone()),
    }))
  }

  fn follow_service_reference(
    &self,
    use_from_stage: &UseFromStage,
    visited: &mut Vec<String>,
  ) -> Result<(&'a StageDef, &'a ServiceConfig), ResolveError> {
    let target = self.follow_reference(use_from_stage, visited)?;
    let config = target
      .service
      .as_ref()
      .ok_or_else(|| ResolveError::MalformedStage {
        stage_id: target.identifier.clone(),
        message: "referenced stage has no service section".to_string(),
      })?;

    if let Some(next) = &config.use_from_stage {
      self.reject_chain(&target.identifier, next, visited)?;
    }

    if config.definition.is_none() && config.service_ref.is_none() {
      return Err(ResolveError::MalformedStage {
        stage_id: target.identifier.clone(),
        message: "referenced stage declares neither a service definition nor a serviceRef"
          .to_string(),
      });
    }

    Ok((target, config))
  }

  fn follow_environment_reference(
    &self,
    use_from_stage: &UseFromStage,
    visited: &mut Vec<String>,
  ) -> Result<(&'a StageDef, &'a EnvironmentYaml), ResolveError> {
    let target = self.follow_reference(use_from_stage, visited)?;
    let environment = target
      .environment
      .as_ref()
      .ok_or_else(|| ResolveError::MalformedStage {
        stage_id: target.identifier.clone(),
        message: "referenced stage has no environment section".to_string(),
      })?;

    if let Some(next) = &environment.use_from_stage {
      self.reject_chain(&target.identifier, next, visited)?;
    }

    Ok((target, environment))
  }

  fn follow_reference(
    &self,
    use_from_stage: &UseFromStage,
    visited: &mut Vec<String>,
  ) -> Result<&'a StageDef, ResolveError> {
    let stage_id = use_from_stage.stage.trim();
    if stage_id.is_empty() {
      return Err(ResolveError::MissingStageIdentifier);
    }
    if visited.iter().any(|v| v == stage_id) {
      let mut chain = visited.clone();
      chain.push(stage_id.to_string());
      return Err(ResolveError::CircularStageReference { chain });
    }
    let target = self
      .pipeline
      .stage(stage_id)
      .ok_or_else(|| ResolveError::StageNotFound {
        stage_id: stage_id.to_string(),
      })?;
    visited.push(stage_id.to_string());
    Ok(target)
  }

  /// A referenced stage must not itself reference a further stage. A
  /// revisit of an already-seen stage is reported as the cycle it is;
  /// anything else is the (also illegal) plain chain.
  fn reject_chain(
    &self,
    stage_id: &str,
    next: &UseFromStage,
    visited: &[String],
  ) -> Result<(), ResolveError> {
    let next_id = next.stage.trim();
    if visited.iter().any(|v| v == next_id) {
      let mut chain = visited.to_vec();
      chain.push(next_id.to_string());
      return Err(ResolveError::CircularStageReference { chain });
    }
    Err(ResolveError::ChainedStageReference {
      stage_id: stage_id.to_string(),
    })
  }
}

/// Apply the reference's own field overrides: only the fields the override
/// explicitly sets, never a full replace.
fn apply_propagate_overrides(definition: &mut ServiceDef, use_from_stage: &UseFromStage) {
  let Some(overrides) = &use_from_stage.overrides else {
    return;
  };
  if let Some(name) = &overrides.name {
    definition.name = name.clone();
  }
  if let Some(description) = &overrides.description {
    definition.description = Some(description.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use larkspur_config::inject_uuids;

  fn pipeline(yaml: &str) -> PipelineDef {
    let mut pipeline: PipelineDef = serde_yaml::from_str(yaml).unwrap();
    inject_uuids(&mut pipeline);
    pipeline
  }

  const BASE: &str = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: Stage One
    service:
      definition:
        identifier: svc1
        name: svc one
        description: the original
        serviceDefinition:
          spec:
            type: Kubernetes
            manifests:
              - manifest:
                  identifier: m1
                  type: K8sManifest
    environment:
      environmentRef: env1
      infrastructureDefinitions:
        - identifier: infra1
  - identifier: stage2
    name: Stage Two
    service:
      useFromStage:
        stage: stage1
"#;

  #[test]
  fn test_direct_definition_passes_through() {
    let pipeline = pipeline(BASE);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage1").unwrap();

    let resolved = resolver.resolve_service(stage).unwrap();
    assert!(resolved.propagated_from.is_none());
    assert_eq!(resolved.definition.as_ref().unwrap().identifier, "svc1");
  }

  #[test]
  fn test_use_from_stage_substitutes_sibling_service() {
    let pipeline = pipeline(BASE);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let resolved = resolver.resolve_service(stage).unwrap();
    assert_eq!(resolved.propagated_from.as_deref(), Some("stage1"));
    let definition = resolved.definition.unwrap();
    assert_eq!(definition.identifier, "svc1");

    // Substitution stamps fresh ids so they stay scoped to stage2.
    let original = pipeline.stage("stage1").unwrap().service.as_ref().unwrap();
    assert_ne!(
      definition.uuid,
      original.definition.as_ref().unwrap().uuid
    );
  }

  #[test]
  fn test_propagate_overrides_apply_only_set_fields() {
    let yaml = BASE.replace(
      "      useFromStage:\n        stage: stage1",
      "      useFromStage:\n        stage: stage1\n        overrides:\n          name: renamed",
    );
    let pipeline = pipeline(&yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let definition = resolver.resolve_service(stage).unwrap().definition.unwrap();
    assert_eq!(definition.name, "renamed");
    // Description was not overridden; the original value survives.
    assert_eq!(definition.description.as_deref(), Some("the original"));
  }

  #[test]
  fn test_missing_stage_identifier() {
    let yaml = BASE.replace("stage: stage1", "stage: \"  \"");
    let pipeline = pipeline(&yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    assert!(matches!(err, ResolveError::MissingStageIdentifier));
  }

  #[test]
  fn test_stage_not_found() {
    let yaml = BASE.replace("stage: stage1", "stage: nope");
    let pipeline = pipeline(&yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    assert!(matches!(err, ResolveError::StageNotFound { stage_id } if stage_id == "nope"));
  }

  #[test]
  fn test_self_reference_is_a_cycle() {
    let yaml = BASE.replace("stage: stage1", "stage: stage2");
    let pipeline = pipeline(&yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    match err {
      ResolveError::CircularStageReference { chain } => {
        assert_eq!(chain, vec!["stage2", "stage2"]);
      }
      other => panic!("expected cycle error, got {other:?}"),
    }
  }

  #[test]
  fn test_mutual_reference_is_a_cycle() {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: One
    service:
      useFromStage:
        stage: stage2
  - identifier: stage2
    name: Two
    service:
      useFromStage:
        stage: stage1
"#;
    let pipeline = pipeline(yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage1").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    match err {
      ResolveError::CircularStageReference { chain } => {
        assert_eq!(chain, vec!["stage1", "stage2", "stage1"]);
      }
      other => panic!("expected cycle error, got {other:?}"),
    }
  }

  #[test]
  fn test_chained_reference_rejected() {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: One
    service:
      definition:
        identifier: svc1
        name: svc one
  - identifier: stage2
    name: Two
    service:
      useFromStage:
        stage: stage1
  - identifier: stage3
    name: Three
    service:
      useFromStage:
        stage: stage2
"#;
    let pipeline = pipeline(yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage3").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    assert!(
      matches!(err, ResolveError::ChainedStageReference { stage_id } if stage_id == "stage2")
    );
  }

  #[test]
  fn test_conflicting_service_source() {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: One
    service:
      definition:
        identifier: svc1
        name: svc one
      useFromStage:
        stage: stage2
  - identifier: stage2
    name: Two
    service:
      definition:
        identifier: svc2
        name: svc two
"#;
    let pipeline = pipeline(yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage1").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    assert!(matches!(err, ResolveError::ConflictingServiceSource { .. }));
  }

  #[test]
  fn test_referenced_stage_without_service_is_malformed() {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: One
  - identifier: stage2
    name: Two
    service:
      useFromStage:
        stage: stage1
"#;
    let pipeline = pipeline(yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let err = resolver.resolve_service(stage).unwrap_err();
    assert!(matches!(err, ResolveError::MalformedStage { stage_id, .. } if stage_id == "stage1"));
  }

  #[test]
  fn test_environment_propagation() {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: stage1
    name: One
    environment:
      environmentRef: env1
      infrastructureDefinitions:
        - identifier: infra1
  - identifier: stage2
    name: Two
    environment:
      useFromStage:
        stage: stage1
"#;
    let pipeline = pipeline(yaml);
    let resolver = StageResolver::new(&pipeline);
    let stage = pipeline.stage("stage2").unwrap();

    let resolved = resolver.resolve_environment(stage).unwrap().unwrap();
    assert_eq!(resolved.propagated_from.as_deref(), Some("stage1"));
    assert_eq!(resolved.environment.environment_ref.as_deref(), Some("env1"));
    assert!(resolved.environment.use_from_stage.is_none());
  }
}
