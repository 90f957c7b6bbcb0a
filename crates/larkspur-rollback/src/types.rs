use serde::{Deserialize, Serialize};

use larkspur_config::DeploymentType;

/// The kind of a phase step group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStepType {
  ServiceSetup,
  Deploy,
  DisableService,
  StopService,
  DeployService,
  EnableService,
  VerifyService,
  WrapUp,
}

/// Status of the forward group that gates running its rollback counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
  Success,
  Failure,
}

/// One step inside a phase step group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStepNode {
  pub uuid: String,
  /// A step kind registered in the stencil registry.
  pub step_kind: String,
  pub name: String,
  pub rollback: bool,
}

impl PhaseStepNode {
  pub fn new(step_kind: impl Into<String>, name: impl Into<String>, rollback: bool) -> Self {
    Self {
      uuid: uuid::Uuid::new_v4().to_string(),
      step_kind: step_kind.into(),
      name: name.into(),
      rollback,
    }
  }
}

/// A group of steps executed together within a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStepGroup {
  pub group_type: PhaseStepType,
  pub name: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub steps: Vec<PhaseStepNode>,
  pub rollback: bool,
  /// Name of the forward group this rollback group compensates.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phase_step_name_for_rollback: Option<String>,
  /// Forward status required before this rollback group runs.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_for_rollback: Option<StepStatus>,
}

impl PhaseStepGroup {
  pub fn forward(group_type: PhaseStepType, name: impl Into<String>) -> Self {
    Self {
      group_type,
      name: name.into(),
      steps: Vec::new(),
      rollback: false,
      phase_step_name_for_rollback: None,
      status_for_rollback: None,
    }
  }

  /// A rollback group compensating the named forward group on success.
  pub fn rollback(
    group_type: PhaseStepType,
    name: impl Into<String>,
    compensates: impl Into<String>,
  ) -> Self {
    Self {
      group_type,
      name: name.into(),
      steps: Vec::new(),
      rollback: true,
      phase_step_name_for_rollback: Some(compensates.into()),
      status_for_rollback: Some(StepStatus::Success),
    }
  }

  pub fn with_step(mut self, step: PhaseStepNode) -> Self {
    self.steps.push(step);
    self
  }
}

/// One execution phase of a stage.
///
/// Forward phases are built by [`crate::PhaseBuilder`]; rollback phases are
/// derived from their forward counterpart and keep the forward phase's
/// service/infra node ids so the runtime can substitute rollback behavior
/// without recompiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPhase {
  pub phase_id: String,
  pub name: String,
  pub deployment_type: DeploymentType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_node_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub infra_node_id: Option<String>,
  pub rollback: bool,
  /// Whether service setup is already shared by a prior phase.
  pub service_repeat: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub step_groups: Vec<PhaseStepGroup>,
}

impl WorkflowPhase {
  /// The step group of the given type, if present.
  pub fn group(&self, group_type: PhaseStepType) -> Option<&PhaseStepGroup> {
    self.step_groups.iter().find(|g| g.group_type == group_type)
  }
}
