//! Runner module - Process execution abstraction layer
//!
//! This module provides a unified interface for running one child process:
//! - `LocalRunner`: spawns the process on the host with wall-clock timeout,
//!   combined output cap, process-group kill and optional POSIX rlimits
//!
//! The runner module does NOT:
//! - Create or clean up workspaces
//! - Interpret outcomes as compile errors, timeouts, etc. (that's the classifier's job)
//! - Know about languages or the test harness

pub mod limits;
pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use limits::ResourceLimits;
pub use local::LocalRunner;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name (resolved against PATH)
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        Self::new(program).with_args(iter.cloned())
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Limits for one execution
#[derive(Debug, Clone, PartialEq)]
pub struct RunLimits {
    /// Wall-clock limit in milliseconds
    pub time_ms: u64,
    /// Combined stdout+stderr cap in bytes
    pub output_bytes: usize,
    /// POSIX resource limits applied in the child
    pub resources: ResourceLimits,
}

impl RunLimits {
    pub fn new(time_ms: u64, output_bytes: usize) -> Self {
        Self {
            time_ms,
            output_bytes,
            resources: ResourceLimits::default(),
        }
    }

    pub fn with_resources(mut self, resources: ResourceLimits) -> Self {
        self.resources = resources;
        self
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self::new(3_000, 1024 * 1024)
    }
}

/// How the process ended (raw, no verdict interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by a signal it did not expect (crash, rlimit)
    Signaled(i32),
    /// Wall-clock limit exceeded; the process group was killed
    TimedOut,
    /// Combined output cap exceeded; the process group was killed
    OutputLimitExceeded,
    /// The program could not be started at all
    SpawnFailed,
}

/// Signal used to terminate a process group on timeout or overflow
pub const KILL_SIGNAL: i32 = 9;

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Stdout content (possibly truncated at the output cap)
    pub stdout: String,
    /// Stderr content (possibly truncated at the output cap)
    pub stderr: String,
    /// Execution status
    pub status: RunStatus,
}

impl RunOutcome {
    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Shell-style exit code: signals map to 128 + signal, spawn failures to 1
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Exited(code) => code,
            RunStatus::Signaled(sig) => 128 + sig,
            RunStatus::TimedOut | RunStatus::OutputLimitExceeded => 128 + KILL_SIGNAL,
            RunStatus::SpawnFailed => 1,
        }
    }

    /// Whether the process was killed for exceeding its wall-clock limit
    pub fn timed_out(&self) -> bool {
        matches!(self.status, RunStatus::TimedOut)
    }

    /// Outcome for a program that could not be started
    pub fn spawn_failed(program: &str, error: &std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Failed to start {}: {}", program, error),
            status: RunStatus::SpawnFailed,
        }
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits and optional stdin
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_vec() {
        let cmd = CommandSpec::from_vec(&[
            "javac".to_string(),
            "-encoding".to_string(),
            "UTF-8".to_string(),
            "Main.java".to_string(),
        ]);

        assert_eq!(cmd.program, "javac");
        assert_eq!(cmd.args, vec!["-encoding", "UTF-8", "Main.java"]);
        assert_eq!(cmd.to_vec().len(), 4);
    }

    #[test]
    fn test_exit_code_mapping() {
        let outcome = |status| RunOutcome {
            stdout: String::new(),
            stderr: String::new(),
            status,
        };

        assert_eq!(outcome(RunStatus::Exited(0)).exit_code(), 0);
        assert_eq!(outcome(RunStatus::Exited(3)).exit_code(), 3);
        assert_eq!(outcome(RunStatus::Signaled(11)).exit_code(), 139);
        assert_eq!(outcome(RunStatus::TimedOut).exit_code(), 137);
        assert_eq!(outcome(RunStatus::OutputLimitExceeded).exit_code(), 137);
        assert_eq!(outcome(RunStatus::SpawnFailed).exit_code(), 1);

        assert!(outcome(RunStatus::TimedOut).timed_out());
        assert!(!outcome(RunStatus::OutputLimitExceeded).timed_out());
        assert!(!outcome(RunStatus::SpawnFailed).timed_out());
    }

    #[test]
    fn test_spawn_failed_message() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let outcome = RunOutcome::spawn_failed("javac", &err);

        assert_eq!(outcome.status, RunStatus::SpawnFailed);
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.stderr.starts_with("Failed to start javac"));
    }
}
