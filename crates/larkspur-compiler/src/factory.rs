use serde_json::json;
use tracing::trace;
use uuid::Uuid;

use larkspur_config::DeploymentType;
use larkspur_plan::{
  Dependency, DependencyKind, NodeKind, PlanCreationResponse, PlanNode, metadata_keys,
};
use larkspur_resolver::EffectiveSpec;
use larkspur_stencil::StencilRegistry;

use crate::error::CompileError;

/// The service root node plus the initial dependency set.
pub struct SeededPlan {
  pub root_id: String,
  pub response: PlanCreationResponse,
}

/// Creates typed plan nodes from an effective service specification.
///
/// Expansion always proceeds service -> service-definition -> service-spec
/// -> gated children; each step emits the next as a [`Dependency`] so a
/// worklist (in-process or an external runtime) can drive the fixed point.
pub struct NodeFactory<'a> {
  stencils: &'a StencilRegistry,
}

impl<'a> NodeFactory<'a> {
  pub fn new(stencils: &'a StencilRegistry) -> Self {
    Self { stencils }
  }

  pub fn stencils(&self) -> &StencilRegistry {
    self.stencils
  }

  /// Validate a stage's declared step kinds for the deployment type.
  pub fn validate_step_kinds<'s>(
    &self,
    step_kinds: impl IntoIterator<Item = &'s str>,
    deployment_type: DeploymentType,
  ) -> Result<(), CompileError> {
    for step_kind in step_kinds {
      self.stencils.validate(step_kind, deployment_type)?;
    }
    Ok(())
  }

  /// Create the service root node and the service-definition dependency.
  pub fn seed(
    &self,
    effective: &EffectiveSpec,
    environment_node_id: Option<&str>,
  ) -> Result<SeededPlan, CompileError> {
    let service_node_id = propagated_or_generated(&effective.service_uuid, NodeKind::Service);
    let definition_node_id =
      propagated_or_generated(&effective.definition_uuid, NodeKind::ServiceDefinition);

    let mut response = PlanCreationResponse::new();
    response.add_node(PlanNode::new(
      service_node_id.clone(),
      NodeKind::Service,
      effective.service_name.clone(),
      effective.service_identifier.clone(),
      json!({
        "identifier": effective.service_identifier,
        "deploymentType": effective.deployment_type,
        "description": effective.description,
        "childNodeId": definition_node_id,
      }),
    ))?;

    let mut dependency = Dependency::new(
      definition_node_id,
      DependencyKind::ServiceDefinition,
      json!(effective),
    );
    self.attach_metadata(&mut dependency, effective, environment_node_id, &service_node_id)?;
    response.add_dependency(dependency);

    Ok(SeededPlan {
      root_id: service_node_id,
      response,
    })
  }

  /// Expand one dependency into nodes and further dependencies.
  pub fn expand(&self, dependency: &Dependency) -> Result<PlanCreationResponse, CompileError> {
    trace!(node_id = %dependency.node_id, kind = ?dependency.kind, "expanding dependency");
    let effective: EffectiveSpec = dependency.metadata.require(metadata_keys::EFFECTIVE_SPEC)?;
    let environment_node_id: Option<String> =
      dependency.metadata.get(metadata_keys::ENVIRONMENT_NODE_ID)?;

    match dependency.kind {
      DependencyKind::ServiceDefinition => {
        self.expand_service_definition(dependency, &effective, environment_node_id.as_deref())
      }
      DependencyKind::ServiceSpec => {
        self.expand_service_spec(dependency, &effective, environment_node_id.as_deref())
      }
      DependencyKind::Artifacts => expand_artifacts(dependency, &effective),
      DependencyKind::Manifests => expand_manifests(dependency, &effective),
      DependencyKind::ConfigFiles => expand_config_files(dependency, &effective),
      DependencyKind::StartupCommand => expand_startup_command(dependency, &effective),
      DependencyKind::ApplicationSettings => expand_application_settings(dependency, &effective),
      DependencyKind::ConnectionStrings => expand_connection_strings(dependency, &effective),
    }
  }

  fn expand_service_definition(
    &self,
    dependency: &Dependency,
    effective: &EffectiveSpec,
    environment_node_id: Option<&str>,
  ) -> Result<PlanCreationResponse, CompileError> {
    let spec_node_id = propagated_or_generated(&effective.spec_uuid, NodeKind::ServiceSpec);

    let mut response = PlanCreationResponse::new();
    response.add_node(PlanNode::new(
      dependency.node_id.clone(),
      NodeKind::ServiceDefinition,
      "Service Definition",
      effective.service_identifier.clone(),
      json!({
        "deploymentType": effective.deployment_type,
        "childNodeId": spec_node_id,
      }),
    ))?;

    let mut next = Dependency::new(
      spec_node_id,
      DependencyKind::ServiceSpec,
      json!(effective),
    );
    self.attach_metadata(&mut next, effective, environment_node_id, &dependency.node_id)?;
    response.add_dependency(next);
    Ok(response)
  }

  /// The service-spec creator gates every child on presence in the
  /// effective spec, and creates platform-settings children only for the
  /// Azure Web App deployment type.
  fn expand_service_spec(
    &self,
    dependency: &Dependency,
    effective: &EffectiveSpec,
    environment_node_id: Option<&str>,
  ) -> Result<PlanCreationResponse, CompileError> {
    let mut children: Vec<(String, DependencyKind, serde_json::Value)> = Vec::new();

    if effective.has_artifacts() {
      let artifacts_uuid = effective.artifacts.as_ref().and_then(|a| a.uuid.clone());
      children.push((
        propagated_or_generated(&artifacts_uuid, NodeKind::Artifacts),
        DependencyKind::Artifacts,
        json!(effective.artifacts),
      ));
    }
    if effective.has_manifests() {
      children.push((
        generated_id(NodeKind::Manifests),
        DependencyKind::Manifests,
        json!(effective.manifests),
      ));
    }
    if effective.has_config_files() {
      children.push((
        generated_id(NodeKind::ConfigFiles),
        DependencyKind::ConfigFiles,
        json!(effective.config_files),
      ));
    }

    match effective.deployment_type {
      DeploymentType::AzureWebApp => {
        if let Some(startup) = &effective.startup_command {
          children.push((
            propagated_or_generated(&startup.uuid, NodeKind::StartupCommand),
            DependencyKind::StartupCommand,
            json!(startup),
          ));
        }
        if let Some(settings) = &effective.application_settings {
          children.push((
            propagated_or_generated(&settings.uuid, NodeKind::ApplicationSettings),
            DependencyKind::ApplicationSettings,
            json!(settings),
          ));
        }
        if let Some(strings) = &effective.connection_strings {
          children.push((
            propagated_or_generated(&strings.uuid, NodeKind::ConnectionStrings),
            DependencyKind::ConnectionStrings,
            json!(strings),
          ));
        }
      }
      DeploymentType::Kubernetes
      | DeploymentType::Ssh
      | DeploymentType::WinRm
      | DeploymentType::NativeHelm
      | DeploymentType::ServerlessAwsLambda
      | DeploymentType::Ecs
      | DeploymentType::Pcf
      | DeploymentType::Ami
      | DeploymentType::CodeDeploy => {}
    }

    let child_ids: Vec<&str> = children.iter().map(|(id, _, _)| id.as_str()).collect();
    let mut response = PlanCreationResponse::new();
    response.add_node(PlanNode::new(
      dependency.node_id.clone(),
      NodeKind::ServiceSpec,
      "Service Spec",
      effective.service_identifier.clone(),
      json!({
        "deploymentType": effective.deployment_type,
        "childNodeIds": child_ids,
      }),
    ))?;

    for (node_id, kind, raw) in children {
      let mut child = Dependency::new(node_id, kind, raw);
      self.attach_metadata(&mut child, effective, environment_node_id, &dependency.node_id)?;
      response.add_dependency(child);
    }
    Ok(response)
  }

  fn attach_metadata(
    &self,
    dependency: &mut Dependency,
    effective: &EffectiveSpec,
    environment_node_id: Option<&str>,
    parent_node_id: &str,
  ) -> Result<(), CompileError> {
    dependency
      .metadata
      .put(metadata_keys::EFFECTIVE_SPEC, effective)?;
    dependency
      .metadata
      .put(metadata_keys::DEPLOYMENT_TYPE, &effective.deployment_type)?;
    dependency
      .metadata
      .put(metadata_keys::PARENT_NODE_ID, &parent_node_id)?;
    if let Some(environment_node_id) = environment_node_id {
      dependency
        .metadata
        .put(metadata_keys::ENVIRONMENT_NODE_ID, &environment_node_id)?;
    }
    Ok(())
  }
}

fn expand_artifacts(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let artifacts = effective.artifacts.clone().unwrap_or_default();
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::Artifacts,
    "Artifacts",
    "artifacts",
    json!({
      "primary": artifacts.primary,
      "sidecars": artifacts.sidecars,
    }),
  ))?;
  Ok(response)
}

fn expand_manifests(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::Manifests,
    "Manifests",
    "manifests",
    json!({ "manifests": effective.manifests }),
  ))?;
  Ok(response)
}

fn expand_config_files(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::ConfigFiles,
    "Config Files",
    "configFiles",
    json!({ "configFiles": effective.config_files }),
  ))?;
  Ok(response)
}

fn expand_startup_command(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::StartupCommand,
    "Startup Command",
    "startupCommand",
    json!({ "startupCommand": effective.startup_command }),
  ))?;
  Ok(response)
}

fn expand_application_settings(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::ApplicationSettings,
    "Application Settings",
    "applicationSettings",
    json!({ "applicationSettings": effective.application_settings }),
  ))?;
  Ok(response)
}

fn expand_connection_strings(
  dependency: &Dependency,
  effective: &EffectiveSpec,
) -> Result<PlanCreationResponse, CompileError> {
  let mut response = PlanCreationResponse::new();
  response.add_node(PlanNode::new(
    dependency.node_id.clone(),
    NodeKind::ConnectionStrings,
    "Connection Strings",
    "connectionStrings",
    json!({ "connectionStrings": effective.connection_strings }),
  ))?;
  Ok(response)
}

/// Reuse an id propagated from the document when one exists, otherwise
/// generate a prefixed one so graphs stay structurally comparable across
/// runs.
fn propagated_or_generated(uuid: &Option<String>, kind: NodeKind) -> String {
  uuid.clone().unwrap_or_else(|| generated_id(kind))
}

fn generated_id(kind: NodeKind) -> String {
  format!("{}-{}", kind.id_prefix(), Uuid::new_v4())
}
