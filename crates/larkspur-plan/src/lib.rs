//! Larkspur Plan
//!
//! This crate provides the compiled plan representation for Larkspur.
//! A plan is the validated, expanded form of a pipeline stage that is
//! ready to be handed to the execution runtime.
//!
//! Key differences from `larkspur-config`:
//! - Subtrees are expanded into typed [`PlanNode`]s with generated or
//!   propagated ids
//! - Every node carries an execution strategy and an on-success link
//! - Work not yet expanded is represented as a [`Dependency`] with a typed
//!   metadata side-channel, so a runtime can drive expansion incrementally

mod dependency;
mod error;
mod graph;
mod node;
mod response;

pub use dependency::{Dependency, DependencyKind, DependencyMetadata, metadata_keys};
pub use error::PlanError;
pub use graph::PlanGraph;
pub use node::{ExecutionStrategy, NodeKind, PlanNode};
pub use response::PlanCreationResponse;
