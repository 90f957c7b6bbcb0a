use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::error::PlanError;
use crate::node::PlanNode;

/// The result of one plan-creation pass: ready nodes plus still-unresolved
/// dependencies.
///
/// Runtimes that expand incrementally take the dependencies and call back
/// into the compiler; the in-process worklist drains them itself. Node
/// insertion order is preserved so compiled graphs are structurally
/// comparable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCreationResponse {
  order: Vec<String>,
  nodes: HashMap<String, PlanNode>,
  dependencies: Vec<Dependency>,
}

impl PlanCreationResponse {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a node; every node id must be unique within one compiled plan.
  pub fn add_node(&mut self, node: PlanNode) -> Result<(), PlanError> {
    if self.nodes.contains_key(&node.uuid) {
      return Err(PlanError::DuplicateNode {
        node_id: node.uuid.clone(),
      });
    }
    self.order.push(node.uuid.clone());
    self.nodes.insert(node.uuid.clone(), node);
    Ok(())
  }

  pub fn add_dependency(&mut self, dependency: Dependency) {
    self.dependencies.push(dependency);
  }

  /// Merge another response into this one, preserving both insertion
  /// orders.
  pub fn merge(&mut self, other: PlanCreationResponse) -> Result<(), PlanError> {
    for node_id in other.order {
      let node = other.nodes[&node_id].clone();
      self.add_node(node)?;
    }
    self.dependencies.extend(other.dependencies);
    Ok(())
  }

  pub fn node(&self, node_id: &str) -> Option<&PlanNode> {
    self.nodes.get(node_id)
  }

  pub fn node_mut(&mut self, node_id: &str) -> Option<&mut PlanNode> {
    self.nodes.get_mut(node_id)
  }

  /// Nodes in insertion order.
  pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> {
    self.order.iter().map(|id| &self.nodes[id])
  }

  /// Mutable access to every node, in no particular order.
  pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut PlanNode> {
    self.nodes.values_mut()
  }

  pub fn node_ids(&self) -> &[String] {
    &self.order
  }

  pub fn node_count(&self) -> usize {
    self.order.len()
  }

  pub fn dependencies(&self) -> &[Dependency] {
    &self.dependencies
  }

  /// Remove and return all pending dependencies.
  pub fn take_dependencies(&mut self) -> Vec<Dependency> {
    std::mem::take(&mut self.dependencies)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node::NodeKind;

  fn node(id: &str) -> PlanNode {
    PlanNode::new(id, NodeKind::Manifests, "n", "n", serde_json::json!({}))
  }

  #[test]
  fn test_duplicate_node_rejected() {
    let mut response = PlanCreationResponse::new();
    response.add_node(node("a")).unwrap();
    let err = response.add_node(node("a")).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateNode { .. }));
  }

  #[test]
  fn test_merge_preserves_order() {
    let mut first = PlanCreationResponse::new();
    first.add_node(node("a")).unwrap();
    let mut second = PlanCreationResponse::new();
    second.add_node(node("b")).unwrap();
    second.add_node(node("c")).unwrap();

    first.merge(second).unwrap();
    assert_eq!(first.node_ids(), &["a", "b", "c"]);
  }
}
