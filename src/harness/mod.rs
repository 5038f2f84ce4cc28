//! Harness module - turns a submission into a runnable Java program
//!
//! - `preprocess`: bare-class detection and `Solution` visibility rewrite
//! - `payload`: the `{method, tests}` test payload, decoded with serde_json
//! - `signature`: scan of the `Solution` class for parameter types
//! - `marshal`: payload values rendered as typed Java expressions
//! - `packed`: large values encoded as string constants
//! - `generator`: the final program text
//!
//! Conversion that cannot be decided statically happens at run time in
//! `files/SolutionHarness.java`, which is appended to every wrapped program.

pub mod generator;
pub mod java;
pub mod marshal;
pub mod packed;
pub mod payload;
pub mod preprocess;
pub mod signature;

pub use generator::{generate, GeneratedProgram};
