//! Engine module - the compile/run pipeline pieces
//!
//! - `workspace`: per-request temporary directory with guaranteed cleanup
//! - `compiler`: the compile step
//! - `classifier`: raw outcomes to `ExecutionResult`, diagnostic cleaning
//!
//! The engine module does NOT:
//! - Spawn processes itself (that's the runner's job)
//! - Generate programs (that's the harness's job)

pub mod classifier;
pub mod compiler;
pub mod workspace;

pub use classifier::ExecutionResult;
pub use workspace::Workspace;
