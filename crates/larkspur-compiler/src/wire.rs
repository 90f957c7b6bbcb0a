use larkspur_plan::{ExecutionStrategy, NodeKind, PlanCreationResponse};

/// Attach execution strategies and on-success links to every node.
///
/// Strategies follow node kind: container nodes delegate (CHILD) or fan
/// out (CHILDREN), artifact collection goes through an external collector
/// (ASYNC), and every other leaf resolves in place (SYNC). The service
/// root's on-success points at the next node in the stage's control-flow
/// order, usually the infrastructure node.
pub fn wire(response: &mut PlanCreationResponse, root_on_success: Option<&str>) {
  for node in response.nodes_mut() {
    match node.kind {
      NodeKind::Service => {
        node.strategy = ExecutionStrategy::Child;
        node.on_success = root_on_success.map(str::to_string);
      }
      NodeKind::ServiceDefinition => {
        node.strategy = ExecutionStrategy::Child;
      }
      NodeKind::ServiceSpec => {
        node.strategy = ExecutionStrategy::Children;
        // The visualizer collapses these children under the service
        // section.
        node.skip_subtree_in_graph_view = true;
      }
      NodeKind::Artifacts => {
        node.strategy = ExecutionStrategy::Async;
        // Artifact payloads may carry runtime expressions the collector
        // resolves later.
        node.skip_expression_evaluation = true;
      }
      NodeKind::Manifests
      | NodeKind::ConfigFiles
      | NodeKind::StartupCommand
      | NodeKind::ApplicationSettings
      | NodeKind::ConnectionStrings => {
        node.strategy = ExecutionStrategy::Sync;
      }
      NodeKind::Provisioner => {
        node.strategy = ExecutionStrategy::Child;
      }
      NodeKind::Infrastructure => {
        node.strategy = ExecutionStrategy::Async;
      }
    }
  }
}
