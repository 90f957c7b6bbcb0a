//! Larkspur Resolver
//!
//! This crate turns the raw service/environment subtrees of a stage into an
//! effective specification the node factory can expand:
//!
//! - [`StageResolver`] follows `useFromStage` references to sibling stages,
//!   substituting the originating stage's subtree while keeping generated
//!   ids scoped to the referencing stage. A visited-identifier set makes
//!   any reference cycle (including direct self-reference) a hard error.
//! - [`OverrideMerger`] flattens the override layers onto the base
//!   specification with a fixed, order-sensitive precedence: named override
//!   sets the stage opted into, then inline stage overrides, then the
//!   environment's global override, then the per-service override entity.
//!   Later layers win per field; collections merge per identifier.

mod error;
mod merge;
mod resolver;

pub use error::ResolveError;
pub use merge::{EffectiveSpec, OverrideLayer, OverrideMerger};
pub use resolver::{ResolvedEnvironment, ResolvedService, StageResolver};
