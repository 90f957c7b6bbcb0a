use serde::{Deserialize, Serialize};

/// How the runtime may schedule a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStrategy {
  /// Resolve in place on the calling thread (leaf config resolution).
  Sync,
  /// Dispatch to an external collector (artifact discovery).
  Async,
  /// Delegate to a single child node.
  Child,
  /// Fan out to multiple children with an implicit join.
  Children,
}

/// The kind of work a plan node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
  Service,
  ServiceDefinition,
  ServiceSpec,
  Artifacts,
  Manifests,
  ConfigFiles,
  StartupCommand,
  ApplicationSettings,
  ConnectionStrings,
  Provisioner,
  Infrastructure,
}

impl NodeKind {
  /// Prefix used when generating an id for a node of this kind.
  pub fn id_prefix(&self) -> &'static str {
    match self {
      NodeKind::Service => "service",
      NodeKind::ServiceDefinition => "service-definition",
      NodeKind::ServiceSpec => "service-spec",
      NodeKind::Artifacts => "artifacts",
      NodeKind::Manifests => "manifests",
      NodeKind::ConfigFiles => "config-files",
      NodeKind::StartupCommand => "startup-command",
      NodeKind::ApplicationSettings => "application-settings",
      NodeKind::ConnectionStrings => "connection-strings",
      NodeKind::Provisioner => "provisioner",
      NodeKind::Infrastructure => "infrastructure",
    }
  }
}

/// A compiled, typed unit of executable work.
///
/// Created once per logical unit of work and never mutated after being
/// inserted into a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
  pub uuid: String,
  pub kind: NodeKind,
  pub name: String,
  pub identifier: String,
  /// Opaque payload the runtime passes to the step implementation.
  pub parameters: serde_json::Value,
  pub strategy: ExecutionStrategy,
  /// The node that runs after this one succeeds, if any.
  pub on_success: Option<String>,
  /// Skip expression evaluation on the parameter payload.
  pub skip_expression_evaluation: bool,
  /// Tell the graph visualizer to collapse this node's children.
  pub skip_subtree_in_graph_view: bool,
}

impl PlanNode {
  /// A node with the default wiring; strategy and on-success are assigned
  /// by the control-flow wirer.
  pub fn new(
    uuid: impl Into<String>,
    kind: NodeKind,
    name: impl Into<String>,
    identifier: impl Into<String>,
    parameters: serde_json::Value,
  ) -> Self {
    Self {
      uuid: uuid.into(),
      kind,
      name: name.into(),
      identifier: identifier.into(),
      parameters,
      strategy: ExecutionStrategy::Sync,
      on_success: None,
      skip_expression_evaluation: false,
      skip_subtree_in_graph_view: false,
    }
  }
}
