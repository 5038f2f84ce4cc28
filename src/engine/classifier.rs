//! Result classification and diagnostic cleaning
//!
//! Turns the raw compile and run outcomes into the caller-facing
//! `ExecutionResult`. Compiler diagnostics are rewritten so they never show
//! workspace paths or the generated file name.

use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use crate::core::verdict::Verdict;
use crate::harness::generator::LineMap;
use crate::runner::{RunOutcome, RunStatus};

/// JVM banner lines that are noise in diagnostics
const JVM_BANNERS: &[&str] = &["Picked up JAVA_TOOL_OPTIONS", "Picked up _JAVA_OPTIONS"];

/// Externally visible result of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
    /// Used for logging only
    #[serde(skip)]
    pub verdict: Verdict,
}

impl ExecutionResult {
    /// Result for a failure inside the service itself
    pub fn internal_error(message: impl std::fmt::Display) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Internal error: {}", message),
            exit_code: 1,
            timed_out: false,
            verdict: Verdict::SystemError,
        }
    }
}

/// Rewrites compiler output for one workspace and generated program
#[derive(Debug)]
pub struct DiagnosticCleaner {
    /// Workspace path spellings, longest first
    paths: Vec<String>,
    source_file: String,
    location: Option<Regex>,
    lines: LineMap,
}

impl DiagnosticCleaner {
    pub fn new(workspace_paths: &[PathBuf], source_file: &str, lines: LineMap) -> Self {
        let mut paths: Vec<String> = workspace_paths
            .iter()
            .map(|p| p.to_string_lossy().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        paths.sort_by_key(|p| std::cmp::Reverse(p.len()));
        paths.dedup();

        let location = Regex::new(&format!(r"^{}:(\d+):", regex::escape(source_file))).ok();

        Self {
            paths,
            source_file: source_file.to_string(),
            location,
            lines,
        }
    }

    pub fn clean(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for path in &self.paths {
            redacted = redacted.replace(&format!("{}/", path), "");
            redacted = redacted.replace(path.as_str(), "");
        }

        let mut lines = Vec::new();
        // javac echoes the offending source line right after each location
        let mut source_echo = false;
        for line in redacted.lines() {
            if JVM_BANNERS.iter().any(|banner| line.starts_with(banner)) {
                continue;
            }
            if std::mem::take(&mut source_echo) {
                lines.push(line.to_string());
                continue;
            }
            match self.relabel_location(line) {
                Some(relabelled) => {
                    source_echo = true;
                    lines.push(relabelled);
                }
                None => lines.push(line.replace(&self.source_file, "source")),
            }
        }

        let mut cleaned = lines.join("\n");
        if redacted.ends_with('\n') && !cleaned.is_empty() {
            cleaned.push('\n');
        }
        cleaned
    }

    /// `Main.java:12: error: ...` -> `Line 9: error: ...`; None for other lines
    fn relabel_location(&self, line: &str) -> Option<String> {
        let caps = self.location.as_ref()?.captures(line)?;
        let whole = caps.get(0)?;
        let file_line = caps.get(1)?.as_str().parse::<usize>().ok()?;

        let label = match self.lines.user_line(file_line) {
            Some(user_line) => format!("Line {}:", user_line),
            None => format!("Line {} (generated harness):", file_line),
        };
        Some(format!("{}{}", label, &line[whole.end()..]))
    }
}

/// Classify the compile step. Returns None when compilation succeeded.
pub fn classify_compile(
    outcome: &RunOutcome,
    cleaner: &DiagnosticCleaner,
    timeout_ms: u64,
) -> Option<ExecutionResult> {
    let verdict = match outcome.status {
        RunStatus::Exited(0) => return None,
        RunStatus::Exited(_) | RunStatus::Signaled(_) | RunStatus::OutputLimitExceeded => {
            Verdict::CompileError
        }
        RunStatus::TimedOut => Verdict::CompileTimeout,
        RunStatus::SpawnFailed => Verdict::SystemError,
    };

    let mut stderr = cleaner.clean(&outcome.stderr);
    if verdict == Verdict::CompileTimeout {
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str(&format!("Compilation timed out after {} ms", timeout_ms));
    }

    Some(ExecutionResult {
        stdout: cleaner.clean(&outcome.stdout),
        stderr,
        exit_code: outcome.exit_code(),
        timed_out: outcome.timed_out(),
        verdict,
    })
}

/// Classify the run step; output passes through unchanged
pub fn classify_run(outcome: RunOutcome) -> ExecutionResult {
    let verdict = match outcome.status {
        RunStatus::Exited(0) => Verdict::Success,
        RunStatus::Exited(_) | RunStatus::Signaled(_) => Verdict::RuntimeError,
        RunStatus::TimedOut => Verdict::RunTimeout,
        RunStatus::OutputLimitExceeded => Verdict::OutputLimitExceeded,
        RunStatus::SpawnFailed => Verdict::SystemError,
    };

    ExecutionResult {
        exit_code: outcome.exit_code(),
        timed_out: outcome.timed_out(),
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::generate;

    const WORKSPACE: &str = "/tmp/coderunner-java-Ab12Cd";

    fn outcome(status: RunStatus, stdout: &str, stderr: &str) -> RunOutcome {
        RunOutcome {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            status,
        }
    }

    fn legacy_cleaner() -> DiagnosticCleaner {
        let program = generate("public class Main {\n}\n", "");
        DiagnosticCleaner::new(&[PathBuf::from(WORKSPACE)], "Main.java", program.line_map())
    }

    #[test]
    fn test_paths_and_file_name_are_removed() {
        let cleaner = legacy_cleaner();
        let raw = format!(
            "{0}/Main.java:2: error: ';' expected\n    int x = 1\n             ^\nNote: {0}/Main.java uses unchecked operations.\n1 error\n",
            WORKSPACE
        );

        let cleaned = cleaner.clean(&raw);
        assert_eq!(
            cleaned,
            "Line 2: error: ';' expected\n    int x = 1\n             ^\nNote: source uses unchecked operations.\n1 error\n"
        );
        assert!(!cleaned.contains(WORKSPACE));
    }

    #[test]
    fn test_wrapped_line_numbers_refer_to_user_code() {
        let source = "class Solution {\n    int f() { return }\n}\n";
        let program = generate(source, r#"{"method":"f","tests":[]}"#);
        let cleaner =
            DiagnosticCleaner::new(&[PathBuf::from(WORKSPACE)], "Main.java", program.line_map());

        assert_eq!(
            cleaner.clean("Main.java:5: error: illegal start of expression"),
            "Line 2: error: illegal start of expression"
        );
        assert_eq!(
            cleaner.clean("Main.java:12: error: cannot find symbol"),
            "Line 12 (generated harness): error: cannot find symbol"
        );
    }

    #[test]
    fn test_echoed_source_lines_are_kept_verbatim() {
        let cleaner = legacy_cleaner();
        let raw = format!(
            "{}/Main.java:2: error: cannot find symbol\n        log(\"see Main.java\");\n        ^\n  symbol:   method log(String)\n1 error\n",
            WORKSPACE
        );

        assert_eq!(
            cleaner.clean(&raw),
            "Line 2: error: cannot find symbol\n        log(\"see Main.java\");\n        ^\n  symbol:   method log(String)\n1 error\n"
        );
    }

    #[test]
    fn test_jvm_banners_are_dropped() {
        let cleaner = legacy_cleaner();
        let cleaned = cleaner.clean(
            "Picked up JAVA_TOOL_OPTIONS: -Xmx256m\nMain.java:1: error: class X is public\n1 error\n",
        );
        assert_eq!(cleaned, "Line 1: error: class X is public\n1 error\n");
    }

    #[test]
    fn test_compile_failure_is_classified() {
        let cleaner = legacy_cleaner();
        let result = classify_compile(
            &outcome(
                RunStatus::Exited(1),
                "",
                &format!("{}/Main.java:1: error: boom\n", WORKSPACE),
            ),
            &cleaner,
            5000,
        )
        .unwrap();

        assert_eq!(result.verdict, Verdict::CompileError);
        assert_eq!(result.exit_code, 1);
        assert!(!result.timed_out);
        assert_eq!(result.stderr, "Line 1: error: boom\n");
    }

    #[test]
    fn test_compile_success_yields_nothing() {
        let cleaner = legacy_cleaner();
        assert!(classify_compile(&outcome(RunStatus::Exited(0), "", ""), &cleaner, 5000).is_none());
    }

    #[test]
    fn test_compile_timeout_is_noted() {
        let cleaner = legacy_cleaner();
        let result =
            classify_compile(&outcome(RunStatus::TimedOut, "", ""), &cleaner, 5000).unwrap();

        assert_eq!(result.verdict, Verdict::CompileTimeout);
        assert!(result.timed_out);
        assert_eq!(result.exit_code, 137);
        assert_eq!(result.stderr, "Compilation timed out after 5000 ms");
    }

    #[test]
    fn test_missing_compiler_is_a_system_error() {
        let cleaner = legacy_cleaner();
        let result = classify_compile(
            &outcome(RunStatus::SpawnFailed, "", "Failed to start javac: No such file or directory"),
            &cleaner,
            5000,
        )
        .unwrap();

        assert_eq!(result.verdict, Verdict::SystemError);
        assert_eq!(result.exit_code, 1);
        assert!(!result.timed_out);
    }

    #[test]
    fn test_run_outcomes() {
        let ok = classify_run(outcome(RunStatus::Exited(0), "Test 1: [0, 1]\n", ""));
        assert_eq!(ok.verdict, Verdict::Success);
        assert_eq!(ok.stdout, "Test 1: [0, 1]\n");
        assert_eq!(ok.exit_code, 0);

        let crashed = classify_run(outcome(RunStatus::Exited(1), "", "Exception in thread \"main\""));
        assert_eq!(crashed.verdict, Verdict::RuntimeError);
        assert_eq!(crashed.exit_code, 1);

        let slow = classify_run(outcome(RunStatus::TimedOut, "partial", ""));
        assert_eq!(slow.verdict, Verdict::RunTimeout);
        assert!(slow.timed_out);
        assert_eq!(slow.stdout, "partial");

        let noisy = classify_run(outcome(RunStatus::OutputLimitExceeded, "yyyy", "Output limit exceeded (4 bytes)"));
        assert_eq!(noisy.verdict, Verdict::OutputLimitExceeded);
        assert_eq!(noisy.exit_code, 137);
        assert!(!noisy.timed_out);
    }

    #[test]
    fn test_result_serializes_in_camel_case() {
        let result = classify_run(outcome(RunStatus::Exited(0), "hi\n", ""));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "stdout": "hi\n",
                "stderr": "",
                "exitCode": 0,
                "timedOut": false
            })
        );
    }

    #[test]
    fn test_internal_error_shape() {
        let result = ExecutionResult::internal_error("disk full");
        assert_eq!(result.stderr, "Internal error: disk full");
        assert_eq!(result.exit_code, 1);
        assert!(!result.timed_out);
    }
}
