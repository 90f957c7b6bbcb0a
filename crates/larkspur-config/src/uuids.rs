//! Uuid assignment pre-pass.
//!
//! Cross-references between compiled plan nodes are by stable node-local
//! identifier. This pass walks a parsed document and assigns a v4 uuid to
//! every subtree lacking one, so downstream compilation can always key on
//! `uuid`. Ids already present in the document are preserved.
//!
//! When a subtree is substituted into another stage (`useFromStage`), the
//! copy must not collide with the originating stage's ids; `reassign_*`
//! variants stamp fresh ids over the whole copy.

use uuid::Uuid;

use crate::artifact::{ArtifactListConfig, PrimaryArtifact};
use crate::environment::EnvironmentYaml;
use crate::overrides::StageOverrides;
use crate::pipeline::PipelineDef;
use crate::service::{ServiceConfig, ServiceDef, ServiceSpec};

#[derive(Clone, Copy)]
enum Mode {
  /// Fill only missing ids.
  Inject,
  /// Stamp a fresh id on every subtree.
  Reassign,
}

fn assign(slot: &mut Option<String>, mode: Mode) {
  match mode {
    Mode::Inject => {
      if slot.is_none() {
        *slot = Some(Uuid::new_v4().to_string());
      }
    }
    Mode::Reassign => *slot = Some(Uuid::new_v4().to_string()),
  }
}

/// Assign a uuid to every subtree of the pipeline that lacks one.
pub fn inject_uuids(pipeline: &mut PipelineDef) {
  assign(&mut pipeline.uuid, Mode::Inject);
  for stage in &mut pipeline.stages {
    assign(&mut stage.uuid, Mode::Inject);
    if let Some(service) = &mut stage.service {
      visit_service_config(service, Mode::Inject);
    }
    if let Some(environment) = &mut stage.environment {
      visit_environment(environment, Mode::Inject);
    }
    for step in &mut stage.steps {
      assign(&mut step.uuid, Mode::Inject);
    }
  }
}

/// Stamp fresh uuids over a service subtree copied from another stage.
pub fn reassign_service_uuids(service: &mut ServiceConfig) {
  visit_service_config(service, Mode::Reassign);
}

/// Stamp fresh uuids over an environment subtree copied from another stage.
pub fn reassign_environment_uuids(environment: &mut EnvironmentYaml) {
  visit_environment(environment, Mode::Reassign);
}

fn visit_service_config(service: &mut ServiceConfig, mode: Mode) {
  assign(&mut service.uuid, mode);
  if let Some(def) = &mut service.definition {
    visit_service_def(def, mode);
  }
  if let Some(overrides) = &mut service.stage_overrides {
    visit_stage_overrides(overrides, mode);
  }
}

fn visit_service_def(def: &mut ServiceDef, mode: Mode) {
  assign(&mut def.uuid, mode);
  if let Some(definition) = &mut def.service_definition {
    assign(&mut definition.uuid, mode);
    if let Some(spec) = &mut definition.spec {
      visit_spec(spec, mode);
    }
  }
}

fn visit_spec(spec: &mut ServiceSpec, mode: Mode) {
  let base = spec.base_mut();
  assign(&mut base.uuid, mode);
  if let Some(artifacts) = &mut base.artifacts {
    visit_artifacts(artifacts, mode);
  }
  for wrapper in &mut base.manifests {
    assign(&mut wrapper.manifest.uuid, mode);
  }
  for wrapper in &mut base.config_files {
    assign(&mut wrapper.config_file.uuid, mode);
  }
  if let ServiceSpec::AzureWebApp(azure) = spec {
    if let Some(startup) = &mut azure.startup_command {
      assign(&mut startup.uuid, mode);
    }
    if let Some(settings) = &mut azure.application_settings {
      assign(&mut settings.uuid, mode);
    }
    if let Some(strings) = &mut azure.connection_strings {
      assign(&mut strings.uuid, mode);
    }
  }
}

fn visit_artifacts(artifacts: &mut ArtifactListConfig, mode: Mode) {
  assign(&mut artifacts.uuid, mode);
  if let Some(primary) = &mut artifacts.primary {
    visit_primary(primary, mode);
  }
  for wrapper in &mut artifacts.sidecars {
    assign(&mut wrapper.sidecar.uuid, mode);
  }
}

fn visit_primary(primary: &mut PrimaryArtifact, mode: Mode) {
  assign(&mut primary.uuid, mode);
  for source in &mut primary.sources {
    assign(&mut source.uuid, mode);
  }
}

fn visit_stage_overrides(overrides: &mut StageOverrides, mode: Mode) {
  assign(&mut overrides.uuid, mode);
  if let Some(artifacts) = &mut overrides.artifacts {
    visit_artifacts(artifacts, mode);
  }
  for wrapper in &mut overrides.manifests {
    assign(&mut wrapper.manifest.uuid, mode);
  }
  for wrapper in &mut overrides.config_files {
    assign(&mut wrapper.config_file.uuid, mode);
  }
}

fn visit_environment(environment: &mut EnvironmentYaml, mode: Mode) {
  assign(&mut environment.uuid, mode);
  for infra in &mut environment.infrastructure_definitions {
    assign(&mut infra.uuid, mode);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_pipeline() -> PipelineDef {
    let yaml = r#"
pipelineId: pip1
name: demo
stages:
  - identifier: deploy
    name: Deploy
    service:
      definition:
        identifier: svc1
        name: svc one
        serviceDefinition:
          spec:
            type: Kubernetes
            manifests:
              - manifest:
                  identifier: m1
                  type: K8sManifest
"#;
    serde_yaml::from_str(yaml).unwrap()
  }

  #[test]
  fn test_inject_fills_missing_ids() {
    let mut pipeline = sample_pipeline();
    inject_uuids(&mut pipeline);

    assert!(pipeline.uuid.is_some());
    let stage = &pipeline.stages[0];
    assert!(stage.uuid.is_some());
    let service = stage.service.as_ref().unwrap();
    assert!(service.uuid.is_some());
    let manifest = &service
      .definition
      .as_ref()
      .unwrap()
      .service_definition
      .as_ref()
      .unwrap()
      .spec
      .as_ref()
      .unwrap()
      .base()
      .manifests[0];
    assert!(manifest.manifest.uuid.is_some());
  }

  #[test]
  fn test_inject_preserves_existing_ids() {
    let mut pipeline = sample_pipeline();
    pipeline.stages[0].uuid = Some("stage-fixed".to_string());
    inject_uuids(&mut pipeline);
    assert_eq!(pipeline.stages[0].uuid.as_deref(), Some("stage-fixed"));
  }

  #[test]
  fn test_inject_is_idempotent() {
    let mut pipeline = sample_pipeline();
    inject_uuids(&mut pipeline);
    let snapshot = pipeline.clone();
    inject_uuids(&mut pipeline);
    assert_eq!(pipeline, snapshot);
  }

  #[test]
  fn test_reassign_replaces_every_id() {
    let mut pipeline = sample_pipeline();
    inject_uuids(&mut pipeline);
    let mut service = pipeline.stages[0].service.clone().unwrap();
    let before = service.uuid.clone();
    reassign_service_uuids(&mut service);
    assert_ne!(service.uuid, before);
  }
}
