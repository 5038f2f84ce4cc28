//! Run job - one compile-and-run request
//!
//! Flow: validate -> generate program -> create workspace -> write source
//! -> compile -> (on success) run -> classify -> remove workspace.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::core::languages::LanguageConfig;
use crate::engine::classifier::{classify_compile, classify_run, DiagnosticCleaner};
use crate::engine::compiler::{compile_limits, compile_user_code, run_limits};
use crate::engine::{ExecutionResult, Workspace};
use crate::error::RequestError;
use crate::harness::{generate, GeneratedProgram};
use crate::runner::{CommandSpec, Runner};

#[derive(Debug, Clone)]
pub struct RunJob {
    pub source: String,
    /// Console input, or the JSON test payload for bare `Solution` classes
    pub stdin: String,
}

impl RunJob {
    /// Reject input before any filesystem or process work
    pub fn validate(&self, config: &RunnerConfig) -> Result<(), RequestError> {
        if self.source.trim().is_empty() {
            return Err(RequestError::MissingSource);
        }
        if self.source.len() > config.max_source_bytes {
            return Err(RequestError::SourceTooLarge {
                max_bytes: config.max_source_bytes,
            });
        }
        Ok(())
    }
}

/// Execute a validated job. Never fails: internal errors become an
/// `Internal error: ...` result.
pub async fn process_run_job(
    job: &RunJob,
    lang_config: &LanguageConfig,
    config: &RunnerConfig,
    runner: &dyn Runner,
) -> ExecutionResult {
    match execute(job, lang_config, config, runner).await {
        Ok(result) => {
            info!(
                "Run finished: verdict={}, exit_code={}, timed_out={}",
                result.verdict, result.exit_code, result.timed_out
            );
            result
        }
        Err(e) => {
            error!("Run job failed: {:#}", e);
            ExecutionResult::internal_error(e)
        }
    }
}

async fn execute(
    job: &RunJob,
    lang_config: &LanguageConfig,
    config: &RunnerConfig,
    runner: &dyn Runner,
) -> Result<ExecutionResult> {
    let program = if lang_config.harness {
        generate(&job.source, &job.stdin)
    } else {
        GeneratedProgram::legacy(&job.source)
    };

    info!(
        "Running {} submission ({} bytes, {:?} mode)",
        lang_config.name,
        job.source.len(),
        program.mode
    );

    let workspace = Workspace::create(&config.workspace_root)?;
    let result = run_in_workspace(&workspace, &program, job, lang_config, config, runner).await;
    workspace.close();
    result
}

async fn run_in_workspace(
    workspace: &Workspace,
    program: &GeneratedProgram,
    job: &RunJob,
    lang_config: &LanguageConfig,
    config: &RunnerConfig,
    runner: &dyn Runner,
) -> Result<ExecutionResult> {
    workspace
        .write_source(&lang_config.source_file, &program.source)
        .await?;

    let compile = compile_user_code(runner, workspace.path(), lang_config, config).await?;
    if !compile.success {
        if let Some(outcome) = &compile.outcome {
            let cleaner = DiagnosticCleaner::new(
                &workspace.path_variants(),
                &lang_config.source_file,
                program.line_map(),
            );
            let timeout_ms = compile_limits(lang_config, config).time_ms;
            if let Some(failure) = classify_compile(outcome, &cleaner, timeout_ms) {
                warn!(
                    "Compilation failed ({}, exit code {}): {}",
                    failure.verdict, failure.exit_code, outcome.stderr
                );
                debug!("Generated source:\n{}", program.source);
                return Ok(failure);
            }
        }
    }

    let spec = CommandSpec::from_vec(&lang_config.run_command).with_work_dir(workspace.path());
    let outcome = runner
        .run(
            &spec,
            &run_limits(lang_config, config),
            program.run_stdin(&job.stdin),
        )
        .await
        .context("Failed to run program")?;

    Ok(classify_run(outcome))
}
