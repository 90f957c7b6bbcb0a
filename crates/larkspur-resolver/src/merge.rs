use serde::{Deserialize, Serialize};
use tracing::trace;

use larkspur_config::{
  ApplicationSettingsConfig, ArtifactListConfig, ConfigFileWrapper, ConnectionStringsConfig,
  DeploymentType, EnvironmentGlobalOverride, ManifestConfigWrapper, OverrideSet, ServiceDef,
  ServiceSpec, StageOverrides, StartupCommandConfig, VariableConfig, is_runtime_expression,
};
use larkspur_entity_store::ServiceOverrideEntity;

use crate::error::ResolveError;

/// One override layer, lowest-to-highest precedence when passed in order.
#[derive(Debug, Clone)]
pub enum OverrideLayer {
  /// A named override set the stage opted into.
  NamedSet(OverrideSet),
  /// Inline overrides declared directly on the stage.
  Stage(StageOverrides),
  /// The environment's global override.
  EnvironmentGlobal(EnvironmentGlobalOverride),
  /// The per-service, per-environment override entity; most specific.
  Service(ServiceOverrideEntity),
}

/// The merged result: a service specification with all override layers
/// flattened. Derived data, recomputed per compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSpec {
  pub deployment_type: DeploymentType,
  pub service_identifier: String,
  pub service_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Propagated subtree ids, so plan nodes reuse document ids instead of
  /// regenerating them.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub definition_uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spec_uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifacts: Option<ArtifactListConfig>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manifests: Vec<ManifestConfigWrapper>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub config_files: Vec<ConfigFileWrapper>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub startup_command: Option<StartupCommandConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub application_settings: Option<ApplicationSettingsConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connection_strings: Option<ConnectionStringsConfig>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub variables: Vec<VariableConfig>,
}

impl EffectiveSpec {
  /// Whether any artifact is declared (primary or sidecar).
  pub fn has_artifacts(&self) -> bool {
    self.artifacts.as_ref().is_some_and(|a| !a.is_empty())
  }

  pub fn has_manifests(&self) -> bool {
    !self.manifests.is_empty()
  }

  pub fn has_config_files(&self) -> bool {
    !self.config_files.is_empty()
  }

  /// Whether any Azure-Web-App platform setting is present.
  pub fn has_platform_settings(&self) -> bool {
    self.startup_command.is_some()
      || self.application_settings.is_some()
      || self.connection_strings.is_some()
  }

  /// Validate the primary artifact reference: it must be a concrete
  /// identifier naming one of the declared sources.
  pub fn validate_artifacts(&self) -> Result<(), ResolveError> {
    let Some(primary) = self.artifacts.as_ref().and_then(|a| a.primary.as_ref()) else {
      return Ok(());
    };
    let Some(reference) = &primary.primary_artifact_ref else {
      return Ok(());
    };
    if is_runtime_expression(reference) {
      return Err(ResolveError::PrimaryArtifactRefExpression {
        reference: reference.clone(),
      });
    }
    if !primary.sources.iter().any(|s| &s.identifier == reference) {
      return Err(ResolveError::PrimaryArtifactSourceNotFound {
        reference: reference.clone(),
        declared: primary.sources.iter().map(|s| s.identifier.clone()).collect(),
      });
    }
    Ok(())
  }
}

/// Combines a base specification with zero or more override layers.
///
/// Later layers win on a per-field basis; collections merge per
/// identifier, a later layer's entry replacing the same identifier and
/// otherwise appending in first-seen order.
pub struct OverrideMerger;

impl OverrideMerger {
  /// Merge the base service definition with the given layers, in order.
  pub fn merge(
    definition: &ServiceDef,
    layers: &[OverrideLayer],
  ) -> Result<EffectiveSpec, ResolveError> {
    let service_definition =
      definition
        .service_definition
        .as_ref()
        .ok_or_else(|| ResolveError::MissingServiceDefinition {
          service_identifier: definition.identifier.clone(),
        })?;
    let spec = service_definition
      .spec
      .as_ref()
      .ok_or_else(|| ResolveError::MissingServiceSpec {
        service_identifier: definition.identifier.clone(),
      })?;

    let base = spec.base();
    let mut effective = EffectiveSpec {
      deployment_type: spec.deployment_type(),
      service_identifier: definition.identifier.clone(),
      service_name: definition.name.clone(),
      description: definition.description.clone(),
      service_uuid: definition.uuid.clone(),
      definition_uuid: service_definition.uuid.clone(),
      spec_uuid: base.uuid.clone(),
      artifacts: base.artifacts.clone(),
      manifests: base.manifests.clone(),
      config_files: base.config_files.clone(),
      startup_command: None,
      application_settings: None,
      connection_strings: None,
      variables: base.variables.clone(),
    };

    // Platform settings exist only on the Azure variant; an exhaustive
    // match keeps this honest when a variant is added.
    match spec {
      ServiceSpec::AzureWebApp(azure) => {
        effective.startup_command = azure.startup_command.clone();
        effective.application_settings = azure.application_settings.clone();
        effective.connection_strings = azure.connection_strings.clone();
      }
      ServiceSpec::Kubernetes(_)
      | ServiceSpec::Ssh(_)
      | ServiceSpec::WinRm(_)
      | ServiceSpec::NativeHelm(_)
      | ServiceSpec::ServerlessAwsLambda(_) => {}
    }

    for layer in layers {
      apply_layer(&mut effective, layer);
    }

    Ok(effective)
  }
}

fn apply_layer(effective: &mut EffectiveSpec, layer: &OverrideLayer) {
  match layer {
    OverrideLayer::NamedSet(set) => {
      trace!(override_set = %set.identifier, "applying named override set");
      apply_artifacts(&mut effective.artifacts, set.artifacts.as_ref());
      merge_manifests(&mut effective.manifests, &set.manifests);
      merge_config_files(&mut effective.config_files, &set.config_files);
    }
    OverrideLayer::Stage(overrides) => {
      apply_artifacts(&mut effective.artifacts, overrides.artifacts.as_ref());
      merge_manifests(&mut effective.manifests, &overrides.manifests);
      merge_config_files(&mut effective.config_files, &overrides.config_files);
      merge_variables(&mut effective.variables, &overrides.variables);
    }
    OverrideLayer::EnvironmentGlobal(global) => {
      merge_manifests(&mut effective.manifests, &global.manifests);
      merge_config_files(&mut effective.config_files, &global.config_files);
      if let Some(settings) = &global.application_settings {
        effective.application_settings = Some(settings.clone());
      }
      if let Some(strings) = &global.connection_strings {
        effective.connection_strings = Some(strings.clone());
      }
    }
    OverrideLayer::Service(entity) => {
      merge_manifests(&mut effective.manifests, &entity.manifests);
      merge_config_files(&mut effective.config_files, &entity.config_files);
      merge_variables(&mut effective.variables, &entity.variables);
      if let Some(settings) = &entity.application_settings {
        effective.application_settings = Some(settings.clone());
      }
      if let Some(strings) = &entity.connection_strings {
        effective.connection_strings = Some(strings.clone());
      }
    }
  }
}

/// Artifacts merge per field: a layer's primary replaces the primary, its
/// sidecars merge per identifier.
fn apply_artifacts(current: &mut Option<ArtifactListConfig>, layer: Option<&ArtifactListConfig>) {
  let Some(layer) = layer else {
    return;
  };
  let merged = current.get_or_insert_with(ArtifactListConfig::default);
  if layer.primary.is_some() {
    merged.primary = layer.primary.clone();
  }
  for wrapper in &layer.sidecars {
    match merged
      .sidecars
      .iter_mut()
      .find(|existing| existing.sidecar.identifier == wrapper.sidecar.identifier)
    {
      Some(existing) => *existing = wrapper.clone(),
      None => merged.sidecars.push(wrapper.clone()),
    }
  }
}

fn merge_manifests(current: &mut Vec<ManifestConfigWrapper>, layer: &[ManifestConfigWrapper]) {
  for wrapper in layer {
    match current
      .iter_mut()
      .find(|existing| existing.manifest.identifier == wrapper.manifest.identifier)
    {
      Some(existing) => *existing = wrapper.clone(),
      None => current.push(wrapper.clone()),
    }
  }
}

fn merge_config_files(current: &mut Vec<ConfigFileWrapper>, layer: &[ConfigFileWrapper]) {
  for wrapper in layer {
    match current
      .iter_mut()
      .find(|existing| existing.config_file.identifier == wrapper.config_file.identifier)
    {
      Some(existing) => *existing = wrapper.clone(),
      None => current.push(wrapper.clone()),
    }
  }
}

fn merge_variables(current: &mut Vec<VariableConfig>, layer: &[VariableConfig]) {
  for variable in layer {
    match current.iter_mut().find(|existing| existing.name == variable.name) {
      Some(existing) => *existing = variable.clone(),
      None => current.push(variable.clone()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use larkspur_config::{
    ArtifactSource, BaseServiceSpec, ConfigFile, ManifestConfig, ManifestType, PrimaryArtifact,
    ServiceDefinition,
  };

  fn manifest(identifier: &str, uuid: &str) -> ManifestConfigWrapper {
    ManifestConfigWrapper {
      manifest: ManifestConfig {
        uuid: Some(uuid.to_string()),
        identifier: identifier.to_string(),
        manifest_type: ManifestType::Values,
        store: None,
      },
    }
  }

  fn config_file(identifier: &str, uuid: &str) -> ConfigFileWrapper {
    ConfigFileWrapper {
      config_file: ConfigFile {
        uuid: Some(uuid.to_string()),
        identifier: identifier.to_string(),
        store: None,
      },
    }
  }

  fn k8s_service(manifests: Vec<ManifestConfigWrapper>) -> ServiceDef {
    ServiceDef {
      uuid: Some("svc-uuid".to_string()),
      identifier: "svc1".to_string(),
      name: "svc one".to_string(),
      description: None,
      service_definition: Some(ServiceDefinition {
        uuid: Some("def-uuid".to_string()),
        spec: Some(ServiceSpec::Kubernetes(BaseServiceSpec {
          uuid: Some("spec-uuid".to_string()),
          manifests,
          ..Default::default()
        })),
      }),
    }
  }

  #[test]
  fn test_manifests_concatenate_across_layers() {
    let definition = k8s_service(vec![manifest("m1", "a")]);
    let layers = vec![
      OverrideLayer::EnvironmentGlobal(EnvironmentGlobalOverride {
        manifests: vec![manifest("m2", "b")],
        ..Default::default()
      }),
      OverrideLayer::Service(ServiceOverrideEntity {
        environment_ref: "env1".to_string(),
        service_ref: "svc1".to_string(),
        manifests: vec![manifest("m3", "c")],
        ..Default::default()
      }),
    ];

    let effective = OverrideMerger::merge(&definition, &layers).unwrap();
    let identifiers: Vec<_> = effective
      .manifests
      .iter()
      .map(|w| w.manifest.identifier.as_str())
      .collect();
    assert_eq!(identifiers, vec!["m1", "m2", "m3"]);
  }

  #[test]
  fn test_service_override_dominates_environment_global() {
    let definition = k8s_service(vec![]);
    // Both layers set config file "cf2"; the service override must win
    // regardless of what the environment-global layer says.
    let layers = vec![
      OverrideLayer::EnvironmentGlobal(EnvironmentGlobalOverride {
        config_files: vec![config_file("cf2", "env-global")],
        ..Default::default()
      }),
      OverrideLayer::Service(ServiceOverrideEntity {
        environment_ref: "env1".to_string(),
        service_ref: "svc1".to_string(),
        config_files: vec![config_file("cf2", "svc-override")],
        ..Default::default()
      }),
    ];

    let effective = OverrideMerger::merge(&definition, &layers).unwrap();
    assert_eq!(effective.config_files.len(), 1);
    assert_eq!(
      effective.config_files[0].config_file.uuid.as_deref(),
      Some("svc-override")
    );
  }

  #[test]
  fn test_config_files_merge_per_identifier() {
    let definition = k8s_service(vec![]);
    let mut base_def = definition.clone();
    base_def
      .service_definition
      .as_mut()
      .unwrap()
      .spec
      .as_mut()
      .unwrap()
      .base_mut()
      .config_files = vec![config_file("cf1", "base-1"), config_file("cf2", "base-2")];

    let layers = vec![OverrideLayer::EnvironmentGlobal(EnvironmentGlobalOverride {
      config_files: vec![config_file("cf2", "env-2"), config_file("cf3", "env-3")],
      ..Default::default()
    })];

    let effective = OverrideMerger::merge(&base_def, &layers).unwrap();
    let entries: Vec<_> = effective
      .config_files
      .iter()
      .map(|w| {
        (
          w.config_file.identifier.as_str(),
          w.config_file.uuid.as_deref().unwrap(),
        )
      })
      .collect();
    assert_eq!(
      entries,
      vec![("cf1", "base-1"), ("cf2", "env-2"), ("cf3", "env-3")]
    );
  }

  #[test]
  fn test_named_set_is_lowest_override_layer() {
    let definition = k8s_service(vec![manifest("m1", "base")]);
    let layers = vec![
      OverrideLayer::NamedSet(OverrideSet {
        identifier: "set1".to_string(),
        artifacts: None,
        manifests: vec![manifest("m1", "named-set")],
        config_files: vec![],
      }),
      OverrideLayer::Stage(StageOverrides {
        manifests: vec![manifest("m1", "stage")],
        ..Default::default()
      }),
    ];

    let effective = OverrideMerger::merge(&definition, &layers).unwrap();
    assert_eq!(effective.manifests.len(), 1);
    assert_eq!(effective.manifests[0].manifest.uuid.as_deref(), Some("stage"));
  }

  #[test]
  fn test_missing_service_definition() {
    let mut definition = k8s_service(vec![]);
    definition.service_definition = None;
    let err = OverrideMerger::merge(&definition, &[]).unwrap_err();
    assert!(matches!(err, ResolveError::MissingServiceDefinition { .. }));
  }

  #[test]
  fn test_missing_spec() {
    let mut definition = k8s_service(vec![]);
    definition.service_definition.as_mut().unwrap().spec = None;
    let err = OverrideMerger::merge(&definition, &[]).unwrap_err();
    assert!(matches!(err, ResolveError::MissingServiceSpec { .. }));
  }

  fn primary_with_ref(reference: &str) -> ArtifactListConfig {
    ArtifactListConfig {
      uuid: None,
      primary: Some(PrimaryArtifact {
        uuid: None,
        primary_artifact_ref: Some(reference.to_string()),
        sources: vec![ArtifactSource {
          uuid: None,
          identifier: "docker_hub".to_string(),
          source_type: "DockerRegistry".to_string(),
          spec: None,
        }],
        spec: None,
      }),
      sidecars: vec![],
    }
  }

  #[test]
  fn test_primary_artifact_ref_must_exist() {
    let mut definition = k8s_service(vec![]);
    definition
      .service_definition
      .as_mut()
      .unwrap()
      .spec
      .as_mut()
      .unwrap()
      .base_mut()
      .artifacts = Some(primary_with_ref("missing_source"));

    let effective = OverrideMerger::merge(&definition, &[]).unwrap();
    let err = effective.validate_artifacts().unwrap_err();
    match err {
      ResolveError::PrimaryArtifactSourceNotFound { reference, declared } => {
        assert_eq!(reference, "missing_source");
        assert_eq!(declared, vec!["docker_hub"]);
      }
      other => panic!("expected shape error, got {other:?}"),
    }
  }

  #[test]
  fn test_primary_artifact_ref_expression_rejected() {
    let mut definition = k8s_service(vec![]);
    definition
      .service_definition
      .as_mut()
      .unwrap()
      .spec
      .as_mut()
      .unwrap()
      .base_mut()
      .artifacts = Some(primary_with_ref("<+input>"));

    let effective = OverrideMerger::merge(&definition, &[]).unwrap();
    let err = effective.validate_artifacts().unwrap_err();
    assert!(matches!(err, ResolveError::PrimaryArtifactRefExpression { .. }));
  }

  #[test]
  fn test_concrete_primary_artifact_ref_accepted() {
    let mut definition = k8s_service(vec![]);
    definition
      .service_definition
      .as_mut()
      .unwrap()
      .spec
      .as_mut()
      .unwrap()
      .base_mut()
      .artifacts = Some(primary_with_ref("docker_hub"));

    let effective = OverrideMerger::merge(&definition, &[]).unwrap();
    assert!(effective.validate_artifacts().is_ok());
    assert!(effective.has_artifacts());
  }
}
