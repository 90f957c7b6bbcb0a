//! Larkspur Rollback
//!
//! Forward workflow phases and their compensating rollback counterparts.
//!
//! A [`WorkflowPhase`] mirrors one stage's execution shape (setup, deploy,
//! verify, wrap-up step groups). For stateful deployment types a
//! [`RollbackPlanner`] derives the compensating phase as a pure function of
//! the forward phase and the `service_repeat` flag (whether service setup
//! is already shared by a prior phase). Planners live in a lookup table
//! keyed by deployment type, so adding a deployment type is additive.
//!
//! [`PhaseSet`] pairs each forward phase with its rollback, keyed by the
//! forward phase id; removing a forward phase removes its rollback with it.

mod builder;
mod phase_set;
mod planner;
mod planners;
mod registry;
mod types;

pub use builder::PhaseBuilder;
pub use phase_set::PhaseSet;
pub use planner::{RollbackPlanner, rollback_phase_base};
pub use registry::RollbackPlannerRegistry;
pub use types::{PhaseStepGroup, PhaseStepNode, PhaseStepType, StepStatus, WorkflowPhase};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollbackError {
  /// Two planners registered for the same deployment type.
  #[error("rollback planner for deployment type {deployment_type} registered twice")]
  DuplicatePlanner {
    deployment_type: larkspur_config::DeploymentType,
  },

  /// A phase step kind failed stencil validation.
  #[error(transparent)]
  Stencil(#[from] larkspur_stencil::StencilError),
}
