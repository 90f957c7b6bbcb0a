use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use larkspur_compiler::{CompilerScope, PlanCompiler};
use larkspur_config::PipelineDef;
use larkspur_entity_store::{
  EntityRef, EnvironmentEntity, InMemoryEntityStore, ServiceEntity, ServiceOverrideEntity,
  StoreClient,
};
use larkspur_stencil::StencilRegistry;

/// Larkspur - a deployment-plan compiler for declarative pipelines
#[derive(Parser)]
#[command(name = "larkspur")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.larkspur)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a pipeline document into an executable plan graph
  Compile {
    /// Path to the pipeline file (YAML)
    pipeline_file: PathBuf,

    /// Compile only the stage with this identifier
    #[arg(long)]
    stage: Option<String>,

    /// Stencil catalog file (JSON); defaults to <data-dir>/stencils.json
    /// when present, otherwise the built-in catalog
    #[arg(long)]
    stencils: Option<PathBuf>,

    /// Entity seed file (JSON) with services/environments/overrides
    #[arg(long)]
    entities: Option<PathBuf>,

    /// Account scope for entity lookups
    #[arg(long, default_value = "default")]
    account: String,

    /// Org scope for entity lookups
    #[arg(long, default_value = "default")]
    org: String,

    /// Project scope for entity lookups
    #[arg(long, default_value = "default")]
    project: String,
  },
}

/// Shape of the `--entities` seed file.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntitySeed {
  #[serde(default)]
  services: Vec<ServiceEntity>,
  #[serde(default)]
  environments: Vec<EnvironmentEntity>,
  #[serde(default)]
  service_overrides: Vec<ServiceOverrideEntity>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join(".larkspur")
  });

  match cli.command {
    Some(Commands::Compile {
      pipeline_file,
      stage,
      stencils,
      entities,
      account,
      org,
      project,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(compile(
        pipeline_file,
        stage,
        stencils,
        entities,
        CompilerScope::new(account, org, project),
        data_dir,
      ))?;
    }
    None => {
      println!("larkspur - use --help to see available commands");
    }
  }

  Ok(())
}

async fn compile(
  pipeline_file: PathBuf,
  stage: Option<String>,
  stencils: Option<PathBuf>,
  entities: Option<PathBuf>,
  scope: CompilerScope,
  data_dir: PathBuf,
) -> Result<()> {
  let contents = tokio::fs::read_to_string(&pipeline_file)
    .await
    .with_context(|| format!("failed to read pipeline file: {}", pipeline_file.display()))?;
  let pipeline = PipelineDef::from_yaml(&contents)
    .with_context(|| format!("failed to parse pipeline file: {}", pipeline_file.display()))?;
  eprintln!(
    "Loaded pipeline: {} ({} stages)",
    pipeline.name,
    pipeline.stages.len()
  );

  let stencils = load_stencils(stencils, &data_dir)?;
  let store = load_entities(entities, &scope).await?;
  let compiler = PlanCompiler::new(StoreClient::new(store), stencils, scope);

  let cancel = CancellationToken::new();
  match stage {
    Some(identifier) => {
      let Some(stage) = pipeline.stage(&identifier) else {
        bail!("stage '{identifier}' not found in pipeline");
      };
      let compiled = compiler
        .compile_stage(&pipeline, stage, false, &cancel)
        .await
        .context("stage compilation failed")?;
      eprintln!(
        "Compiled stage '{}': {} nodes, {} rollback phases",
        compiled.stage_identifier,
        compiled.graph.len(),
        compiled.phases.rollback_count()
      );
      println!("{}", serde_json::to_string_pretty(&compiled)?);
    }
    None => {
      let compiled = compiler
        .compile(&pipeline, &cancel)
        .await
        .context("pipeline compilation failed")?;
      eprintln!("Compiled {} stages", compiled.stages.len());
      println!("{}", serde_json::to_string_pretty(&compiled)?);
    }
  }

  Ok(())
}

fn load_stencils(
  stencils: Option<PathBuf>,
  data_dir: &std::path::Path,
) -> Result<Arc<StencilRegistry>> {
  if let Some(path) = stencils {
    let registry = StencilRegistry::from_catalog_file(&path)
      .with_context(|| format!("failed to load stencil catalog: {}", path.display()))?;
    return Ok(Arc::new(registry));
  }
  let default_catalog = data_dir.join("stencils.json");
  if default_catalog.is_file() {
    let registry = StencilRegistry::from_catalog_file(&default_catalog).with_context(|| {
      format!("failed to load stencil catalog: {}", default_catalog.display())
    })?;
    return Ok(Arc::new(registry));
  }
  Ok(Arc::new(StencilRegistry::builtin().clone()))
}

async fn load_entities(
  entities: Option<PathBuf>,
  scope: &CompilerScope,
) -> Result<Arc<InMemoryEntityStore>> {
  let store = InMemoryEntityStore::new();
  let Some(path) = entities else {
    return Ok(Arc::new(store));
  };

  let contents = tokio::fs::read_to_string(&path)
    .await
    .with_context(|| format!("failed to read entities file: {}", path.display()))?;
  let seed: EntitySeed = serde_json::from_str(&contents)
    .with_context(|| format!("failed to parse entities file: {}", path.display()))?;

  let entity_ref = |identifier: &str| {
    EntityRef::new(
      scope.account_id.clone(),
      scope.org_id.clone(),
      scope.project_id.clone(),
      identifier,
    )
  };
  for service in seed.services {
    store.put_service(entity_ref(&service.identifier), service);
  }
  for environment in seed.environments {
    store.put_environment(entity_ref(&environment.identifier), environment);
  }
  for service_override in seed.service_overrides {
    store.put_service_override(
      entity_ref(&service_override.environment_ref),
      service_override.service_ref.clone(),
      service_override,
    );
  }

  Ok(Arc::new(store))
}
