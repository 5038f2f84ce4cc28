//! Compile step
//!
//! Runs the language's compiler inside the workspace with its own timeout,
//! output cap and resource limits.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::config::RunnerConfig;
use crate::core::languages::LanguageConfig;
use crate::runner::{CommandSpec, RunLimits, RunOutcome, Runner};

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    /// Raw compiler outcome (None for languages without a compile step)
    pub outcome: Option<RunOutcome>,
}

/// Run `compile_cmd` in `source_dir`
pub async fn compile_in_workspace(
    runner: &dyn Runner,
    source_dir: &Path,
    compile_cmd: &[String],
    limits: &RunLimits,
) -> Result<CompileResult> {
    if compile_cmd.is_empty() {
        return Ok(CompileResult {
            success: true,
            outcome: None,
        });
    }

    debug!("Compiling with {:?} in {}", compile_cmd, source_dir.display());

    let spec = CommandSpec::from_vec(compile_cmd).with_work_dir(source_dir);
    let outcome = runner
        .run(&spec, limits, None)
        .await
        .with_context(|| format!("Failed to run compiler {}", spec.program))?;

    Ok(CompileResult {
        success: outcome.is_success(),
        outcome: Some(outcome),
    })
}

/// Compile user code with the limits configured for `lang_config`
pub async fn compile_user_code(
    runner: &dyn Runner,
    source_dir: &Path,
    lang_config: &LanguageConfig,
    config: &RunnerConfig,
) -> Result<CompileResult> {
    let compile_cmd = match &lang_config.compile_command {
        Some(cmd) => cmd,
        None => {
            // Interpreted language, no compilation needed
            return Ok(CompileResult {
                success: true,
                outcome: None,
            });
        }
    };

    compile_in_workspace(runner, source_dir, compile_cmd, &compile_limits(lang_config, config))
        .await
}

pub fn compile_limits(lang_config: &LanguageConfig, config: &RunnerConfig) -> RunLimits {
    RunLimits::new(
        lang_config.compile_timeout_ms(config.compile_timeout_ms),
        config.max_output_bytes,
    )
    .with_resources(config.compile_limits.clone())
}

pub fn run_limits(lang_config: &LanguageConfig, config: &RunnerConfig) -> RunLimits {
    RunLimits::new(
        lang_config.run_timeout_ms(config.run_timeout_ms),
        config.max_output_bytes,
    )
    .with_resources(config.run_limits.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{LocalRunner, RunStatus};

    fn java() -> LanguageConfig {
        LanguageConfig {
            name: "java".to_string(),
            source_file: "Main.java".to_string(),
            compile_command: Some(vec!["sh".to_string(), "-c".to_string(), "exit 0".to_string()]),
            run_command: vec!["java".to_string(), "Main".to_string()],
            harness: true,
            compile_timeout_ms: Some(10_000),
            run_timeout_ms: None,
        }
    }

    #[test]
    fn test_limits_follow_language_overrides() {
        let config = RunnerConfig::default();
        let lang = java();

        assert_eq!(compile_limits(&lang, &config).time_ms, 10_000);
        assert_eq!(run_limits(&lang, &config).time_ms, 3_000);
        assert_eq!(run_limits(&lang, &config).output_bytes, 1024 * 1024);
        assert_eq!(run_limits(&lang, &config).resources, config.run_limits);
    }

    #[tokio::test]
    async fn test_no_compile_command_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut lang = java();
        lang.compile_command = None;

        let result = tokio_test::assert_ok!(
            compile_user_code(&LocalRunner::new(), dir.path(), &lang, &RunnerConfig::default()).await
        );
        assert!(result.success);
        assert!(result.outcome.is_none());
    }

    #[tokio::test]
    async fn test_compiler_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Main.java"), "broken").unwrap();
        let cmd = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo \"Main.java:1: error: nope\" >&2; exit 1".to_string(),
        ];

        let result = tokio_test::assert_ok!(
            compile_in_workspace(&LocalRunner::new(), dir.path(), &cmd, &RunLimits::default()).await
        );

        assert!(!result.success);
        let outcome = result.outcome.unwrap();
        assert_eq!(outcome.status, RunStatus::Exited(1));
        assert_eq!(outcome.stderr, "Main.java:1: error: nope\n");
    }
}
