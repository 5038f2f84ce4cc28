//! Jobs module - one unit of work per incoming request
//!
//! - `run`: compile and run one submission, wrapping bare `Solution`
//!   classes with the generated test harness

pub mod run;

pub use run::{process_run_job, RunJob};
