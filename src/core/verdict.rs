use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one execution request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    CompileError,
    CompileTimeout,
    RuntimeError,
    RunTimeout,
    OutputLimitExceeded,
    SystemError,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Success => "success",
            Verdict::CompileError => "compile_error",
            Verdict::CompileTimeout => "compile_timeout",
            Verdict::RuntimeError => "runtime_error",
            Verdict::RunTimeout => "run_timeout",
            Verdict::OutputLimitExceeded => "output_limit_exceeded",
            Verdict::SystemError => "system_error",
        };
        write!(f, "{}", s)
    }
}
