//! Larkspur Compiler
//!
//! Turns a resolved, merged stage specification into an executable plan
//! graph:
//!
//! ```text
//! PlanCompiler
//! ├── compile(pipeline) - all stages, independent stages in parallel
//! └── compile_stage(stage) - RAW -> RESOLVED -> MERGED -> EXPANDED -> WIRED
//!                            (-> ROLLBACK-AUGMENTED for stateful types)
//!
//! NodeFactory
//! ├── seed(effective_spec) - service root node + initial dependency
//! └── expand(dependency) - one typed creator per dependency kind
//!
//! Worklist
//! ├── drain() - in-process fixed point over pending dependencies
//! └── step() - single-step expansion for runtimes that drive it themselves
//! ```
//!
//! The worklist is sequential within one stage because later dependencies
//! read side-channel metadata produced by earlier ones; independent stages
//! share nothing mutable and compile concurrently.

mod compiler;
mod error;
mod factory;
mod wire;
mod worklist;

pub use compiler::{CompiledPipeline, CompiledStage, CompilerScope, PlanCompiler};
pub use error::CompileError;
pub use factory::{NodeFactory, SeededPlan};
pub use wire::wire;
pub use worklist::Worklist;
