use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use larkspur_config::{DeploymentType, PipelineDef, ServiceDef, StageDef};
use larkspur_entity_store::{EntityRef, StoreClient};
use larkspur_plan::{NodeKind, PlanGraph, PlanNode};
use larkspur_resolver::{
  OverrideLayer, OverrideMerger, ResolveError, ResolvedEnvironment, StageResolver,
};
use larkspur_rollback::{PhaseBuilder, PhaseSet, RollbackPlannerRegistry};
use larkspur_stencil::StencilRegistry;

use crate::error::CompileError;
use crate::factory::NodeFactory;
use crate::wire::wire;
use crate::worklist::Worklist;

/// The account/org/project scope entity lookups run under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerScope {
  pub account_id: String,
  pub org_id: String,
  pub project_id: String,
}

impl CompilerScope {
  pub fn new(
    account_id: impl Into<String>,
    org_id: impl Into<String>,
    project_id: impl Into<String>,
  ) -> Self {
    Self {
      account_id: account_id.into(),
      org_id: org_id.into(),
      project_id: project_id.into(),
    }
  }

  fn entity_ref(&self, identifier: &str) -> EntityRef {
    EntityRef::new(
      self.account_id.clone(),
      self.org_id.clone(),
      self.project_id.clone(),
      identifier,
    )
  }
}

/// One stage compiled into an executable graph plus its workflow phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledStage {
  pub stage_identifier: String,
  pub stage_name: String,
  pub deployment_type: DeploymentType,
  pub graph: PlanGraph,
  pub phases: PhaseSet,
}

/// A fully compiled pipeline, ready for the execution runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledPipeline {
  pub pipeline_id: String,
  pub name: String,
  pub stages: Vec<CompiledStage>,
}

/// The deployment-plan compiler.
///
/// Holds only read-only shared state (stencil catalog, rollback planners)
/// plus the store client, so independent stages compile concurrently.
pub struct PlanCompiler {
  store: StoreClient,
  stencils: Arc<StencilRegistry>,
  rollback: Arc<RollbackPlannerRegistry>,
  scope: CompilerScope,
}

impl PlanCompiler {
  pub fn new(store: StoreClient, stencils: Arc<StencilRegistry>, scope: CompilerScope) -> Self {
    Self {
      store,
      stencils,
      rollback: Arc::new(RollbackPlannerRegistry::defaults()),
      scope,
    }
  }

  pub fn with_rollback_planners(mut self, rollback: Arc<RollbackPlannerRegistry>) -> Self {
    self.rollback = rollback;
    self
  }

  /// Compile every stage of the pipeline.
  ///
  /// Independent stages compile concurrently; they share no mutable state.
  /// The first failing stage aborts the compilation - a partial graph is
  /// never returned.
  #[instrument(skip_all, fields(pipeline_id = %pipeline.pipeline_id))]
  pub async fn compile(
    &self,
    pipeline: &PipelineDef,
    cancel: &CancellationToken,
  ) -> Result<CompiledPipeline, CompileError> {
    let repeats = service_repeats(pipeline)?;

    let stages = try_join_all(
      pipeline
        .stages
        .iter()
        .zip(repeats)
        .map(|(stage, service_repeat)| self.compile_stage(pipeline, stage, service_repeat, cancel)),
    )
    .await?;

    info!(stages = stages.len(), "pipeline compiled");
    Ok(CompiledPipeline {
      pipeline_id: pipeline.pipeline_id.clone(),
      name: pipeline.name.clone(),
      stages,
    })
  }

  /// Compile one stage: resolve, merge, expand, wire, and (for stateful
  /// deployment types) augment with rollback phases.
  #[instrument(skip_all, fields(stage = %stage.identifier))]
  pub async fn compile_stage(
    &self,
    pipeline: &PipelineDef,
    stage: &StageDef,
    service_repeat: bool,
    cancel: &CancellationToken,
  ) -> Result<CompiledStage, CompileError> {
    if cancel.is_cancelled() {
      return Err(CompileError::Cancelled);
    }

    let resolver = StageResolver::new(pipeline);
    let resolved_service = resolver.resolve_service(stage)?;
    let resolved_environment = resolver.resolve_environment(stage)?;

    let definition = match (&resolved_service.definition, &resolved_service.service_ref) {
      (Some(definition), _) => definition.clone(),
      (None, Some(service_ref)) => self.fetch_service_definition(service_ref, cancel).await?,
      (None, None) => {
        return Err(CompileError::Resolve(ResolveError::NoServiceConfigured {
          stage_id: stage.identifier.clone(),
        }));
      }
    };

    let environment_entity = match resolved_environment
      .as_ref()
      .and_then(|e| e.environment.environment_ref.as_deref())
    {
      Some(environment_ref) => {
        let entity_ref = self.scope.entity_ref(environment_ref);
        Some(
          self
            .store
            .get_environment(&entity_ref, cancel)
            .await?
            .ok_or_else(|| CompileError::EnvironmentNotFound {
              environment_ref: environment_ref.to_string(),
            })?,
        )
      }
      None => None,
    };

    // Override layers, lowest to highest precedence.
    let mut layers = Vec::new();
    for set_identifier in &stage.use_override_sets {
      let set = environment_entity
        .as_ref()
        .and_then(|entity| {
          entity
            .override_sets
            .iter()
            .find(|set| &set.identifier == set_identifier)
        })
        .ok_or_else(|| CompileError::OverrideSetNotFound {
          identifier: set_identifier.clone(),
          environment_ref: environment_entity
            .as_ref()
            .map(|e| e.identifier.clone())
            .unwrap_or_default(),
        })?;
      layers.push(OverrideLayer::NamedSet(set.clone()));
    }
    if let Some(stage_overrides) = &resolved_service.stage_overrides {
      layers.push(OverrideLayer::Stage(stage_overrides.clone()));
    }
    if let Some(global) = environment_entity
      .as_ref()
      .and_then(|entity| entity.global_override.as_ref())
    {
      layers.push(OverrideLayer::EnvironmentGlobal(global.clone()));
    }
    if let Some(entity) = &environment_entity {
      let entity_ref = self.scope.entity_ref(&entity.identifier);
      if let Some(service_override) = self
        .store
        .get_service_override(&entity_ref, &definition.identifier, cancel)
        .await?
      {
        layers.push(OverrideLayer::Service(service_override));
      }
    }

    let effective = OverrideMerger::merge(&definition, &layers)?;
    effective.validate_artifacts()?;
    debug!(
      deployment_type = %effective.deployment_type,
      layers = layers.len(),
      "effective spec merged"
    );

    let factory = NodeFactory::new(&self.stencils);
    factory.validate_step_kinds(
      stage.steps.iter().map(|s| s.step_kind.as_str()),
      effective.deployment_type,
    )?;

    let infrastructure_node = resolved_environment.as_ref().map(infrastructure_node);
    let infrastructure_node_id = infrastructure_node.as_ref().map(|n| n.uuid.clone());
    let provisioner_node = resolved_environment
      .as_ref()
      .and_then(|resolved| provisioner_node(resolved, infrastructure_node_id.as_deref()));
    let provisioner_node_id = provisioner_node.as_ref().map(|n| n.uuid.clone());

    let seeded = factory.seed(&effective, infrastructure_node_id.as_deref())?;
    let root_id = seeded.root_id;
    let mut response = seeded.response;
    let mut worklist = Worklist::from_dependencies(response.take_dependencies())?;
    // The provisioner, when declared, runs between the service chain and
    // the infrastructure node.
    if let Some(node) = provisioner_node {
      response.add_node(node)?;
    }
    if let Some(node) = infrastructure_node {
      response.add_node(node)?;
    }
    worklist.drain(&factory, &mut response, cancel)?;

    let service_next = provisioner_node_id
      .as_deref()
      .or(infrastructure_node_id.as_deref());
    wire(&mut response, service_next);
    let graph = PlanGraph::from_response(root_id.clone(), response)?;

    let mut phases = PhaseSet::new();
    let forward = PhaseBuilder::new(&self.stencils).forward_phase(
      effective.deployment_type,
      stage.name.clone(),
      Some(root_id),
      infrastructure_node_id,
      service_repeat,
    )?;
    phases.add_phase(forward);
    phases.augment(&self.rollback);

    info!(
      nodes = graph.len(),
      rollback_phases = phases.rollback_count(),
      "stage compiled"
    );
    Ok(CompiledStage {
      stage_identifier: stage.identifier.clone(),
      stage_name: stage.name.clone(),
      deployment_type: effective.deployment_type,
      graph,
      phases,
    })
  }

  async fn fetch_service_definition(
    &self,
    service_ref: &str,
    cancel: &CancellationToken,
  ) -> Result<ServiceDef, CompileError> {
    let entity_ref = self.scope.entity_ref(service_ref);
    let entity = self
      .store
      .get_service(&entity_ref, cancel)
      .await?
      .ok_or_else(|| CompileError::ServiceNotFound {
        service_ref: service_ref.to_string(),
      })?;
    if entity.service_definition.is_none() {
      return Err(CompileError::ServiceEntityMissingDefinition {
        service_ref: service_ref.to_string(),
      });
    }
    Ok(ServiceDef {
      uuid: None,
      identifier: entity.identifier,
      name: entity.name,
      description: entity.description,
      service_definition: entity.service_definition,
    })
  }
}

/// Per stage, whether an earlier stage already deploys the same service.
/// Drives the `service_repeat` flag for phase building.
fn service_repeats(pipeline: &PipelineDef) -> Result<Vec<bool>, CompileError> {
  let resolver = StageResolver::new(pipeline);
  let mut seen = HashSet::new();
  let mut repeats = Vec::with_capacity(pipeline.stages.len());
  for stage in &pipeline.stages {
    let resolved = resolver.resolve_service(stage)?;
    let key = resolved
      .definition
      .as_ref()
      .map(|d| d.identifier.clone())
      .or(resolved.service_ref);
    repeats.push(match key {
      Some(key) => !seen.insert(key),
      None => false,
    });
  }
  Ok(repeats)
}

/// The provisioner node for an environment that declares one; it runs
/// ahead of the infrastructure node.
fn provisioner_node(
  resolved: &ResolvedEnvironment,
  infrastructure_node_id: Option<&str>,
) -> Option<PlanNode> {
  let provisioner = resolved.environment.provisioner.as_ref()?;
  let mut node = PlanNode::new(
    format!("{}-{}", NodeKind::Provisioner.id_prefix(), Uuid::new_v4()),
    NodeKind::Provisioner,
    "Provisioner",
    "provisioner",
    json!({ "provisioner": provisioner }),
  );
  node.on_success = infrastructure_node_id.map(str::to_string);
  Some(node)
}

fn infrastructure_node(resolved: &ResolvedEnvironment) -> PlanNode {
  let environment = &resolved.environment;
  let node_id = environment
    .uuid
    .clone()
    .unwrap_or_else(|| format!("{}-{}", NodeKind::Infrastructure.id_prefix(), Uuid::new_v4()));
  let identifier = environment
    .environment_ref
    .clone()
    .unwrap_or_else(|| "infrastructure".to_string());
  PlanNode::new(
    node_id,
    NodeKind::Infrastructure,
    "Infrastructure",
    identifier,
    json!({
      "environmentRef": environment.environment_ref,
      "deployToAll": environment.deploy_to_all,
      "infrastructureDefinitions": environment.infrastructure_definitions,
    }),
  )
}
