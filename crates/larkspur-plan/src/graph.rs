use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::node::{NodeKind, PlanNode};
use crate::response::PlanCreationResponse;

/// A fully expanded, wired plan for one stage.
///
/// No further mutation occurs once the graph is handed to the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanGraph {
  root_id: String,
  order: Vec<String>,
  nodes: HashMap<String, PlanNode>,
}

impl PlanGraph {
  /// Build a graph from a fully drained response.
  ///
  /// # Errors
  /// Fails if the root node is not present in the response.
  pub fn from_response(root_id: String, response: PlanCreationResponse) -> Result<Self, PlanError> {
    if response.node(&root_id).is_none() {
      return Err(PlanError::NodeNotFound { node_id: root_id });
    }
    let order = response.node_ids().to_vec();
    let nodes = response
      .nodes()
      .map(|node| (node.uuid.clone(), node.clone()))
      .collect();
    Ok(Self {
      root_id,
      order,
      nodes,
    })
  }

  pub fn root_id(&self) -> &str {
    &self.root_id
  }

  pub fn node(&self, node_id: &str) -> Option<&PlanNode> {
    self.nodes.get(node_id)
  }

  /// Nodes in creation order.
  pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> {
    self.order.iter().map(|id| &self.nodes[id])
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// The first node of the given kind, if any.
  pub fn find_by_kind(&self, kind: NodeKind) -> Option<&PlanNode> {
    self.nodes().find(|n| n.kind == kind)
  }

  /// All nodes of the given kind, in creation order.
  pub fn all_of_kind(&self, kind: NodeKind) -> Vec<&PlanNode> {
    self.nodes().filter(|n| n.kind == kind).collect()
  }

  /// The node that runs after `node_id` succeeds.
  pub fn next_on_success(&self, node_id: &str) -> Option<&PlanNode> {
    let next_id = self.nodes.get(node_id)?.on_success.as_deref()?;
    self.nodes.get(next_id)
  }

  /// Child node ids recorded in a container node's parameter payload.
  pub fn children_of(&self, node_id: &str) -> Vec<&PlanNode> {
    let Some(node) = self.nodes.get(node_id) else {
      return Vec::new();
    };
    let mut children = Vec::new();
    if let Some(id) = node.parameters.get("childNodeId").and_then(|v| v.as_str()) {
      if let Some(child) = self.nodes.get(id) {
        children.push(child);
      }
    }
    if let Some(ids) = node.parameters.get("childNodeIds").and_then(|v| v.as_array()) {
      for id in ids.iter().filter_map(|v| v.as_str()) {
        if let Some(child) = self.nodes.get(id) {
          children.push(child);
        }
      }
    }
    children
  }
}
