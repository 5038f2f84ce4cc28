//! Harness program generation
//!
//! Wrapped submissions become one compilation unit:
//!
//! ```text
//! import java.util.*;
//! import java.lang.reflect.*;
//!
//! <user code, Solution made package-private>
//!
//! public class Main { ... one harness.run(...) per test ... }
//!
//! <files/SolutionHarness.java>
//! ```

use serde_json::Value;
use tracing::debug;

use super::java;
use super::marshal::{marshal, untyped};
use super::packed::{packed_argument, value_count, PACK_THRESHOLD};
use super::payload::{ArgValue, TestCase, TestPayload};
use super::preprocess::preprocess;
use super::signature::{overloads, scan_solution_methods, MethodSignature};

const PRELUDE: &str = "import java.util.*;\nimport java.lang.reflect.*;\n\n";
const PRELUDE_LINES: usize = 3;
const HARNESS_CLASS: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/SolutionHarness.java"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessMode {
    /// Compiled as submitted; stdin is piped to the program
    Legacy,
    /// Solution wrapped with one generated call per test case
    Harness,
    /// Solution wrapped, but there was no usable payload
    UsageHint,
}

/// Program text ready to be written to the workspace
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    pub source: String,
    pub mode: HarnessMode,
    /// Lines inserted before the user's first line
    pub line_offset: usize,
    /// Number of lines that came from the user
    pub user_lines: usize,
}

impl GeneratedProgram {
    /// Source compiled exactly as submitted
    pub fn legacy(source: &str) -> Self {
        Self {
            source: source.to_string(),
            mode: HarnessMode::Legacy,
            line_offset: 0,
            user_lines: source.lines().count(),
        }
    }

    /// Stdin for the run step; wrapped programs carry their input in the source
    pub fn run_stdin<'a>(&self, stdin: &'a str) -> Option<&'a str> {
        match self.mode {
            HarnessMode::Legacy if !stdin.is_empty() => Some(stdin),
            _ => None,
        }
    }

    pub fn line_map(&self) -> LineMap {
        LineMap {
            offset: self.line_offset,
            user_lines: self.user_lines,
        }
    }
}

/// Where the user's lines sit inside the generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMap {
    pub offset: usize,
    pub user_lines: usize,
}

impl LineMap {
    /// Map a line of the generated file back to the user's source, if it came from there
    pub fn user_line(&self, file_line: usize) -> Option<usize> {
        let line = file_line.checked_sub(self.offset)?;
        (1..=self.user_lines).contains(&line).then_some(line)
    }
}

/// Build the program for one request
pub fn generate(source: &str, stdin: &str) -> GeneratedProgram {
    let preprocessed = preprocess(source);
    if !preprocessed.wrap {
        return GeneratedProgram::legacy(source);
    }

    let methods = scan_solution_methods(&preprocessed.source);
    let (main_body, mode) = match TestPayload::parse(stdin) {
        Ok(Some(payload)) => (harness_main(&payload, &methods), HarnessMode::Harness),
        Ok(None) => (usage_main(&methods, None), HarnessMode::UsageHint),
        Err(e) => {
            debug!("Invalid test payload: {}", e);
            (usage_main(&methods, Some(&e.to_string())), HarnessMode::UsageHint)
        }
    };

    let mut program = String::with_capacity(
        PRELUDE.len() + preprocessed.source.len() + main_body.len() + HARNESS_CLASS.len() + 64,
    );
    program.push_str(PRELUDE);
    program.push_str(&preprocessed.source);
    if !preprocessed.source.ends_with('\n') {
        program.push('\n');
    }
    program.push('\n');
    program.push_str("public class Main {\n    public static void main(String[] args) {\n");
    program.push_str(&main_body);
    program.push_str("    }\n}\n\n");
    program.push_str(HARNESS_CLASS);

    GeneratedProgram {
        source: program,
        mode,
        line_offset: PRELUDE_LINES,
        user_lines: preprocessed.source.lines().count(),
    }
}

fn harness_main(payload: &TestPayload, methods: &[MethodSignature]) -> String {
    let mut body = format!(
        "        SolutionHarness harness = SolutionHarness.forMethod({});\n        if (harness == null) {{\n            return;\n        }}\n",
        java::string_literal(&payload.method)
    );

    for (i, test) in payload.tests.iter().enumerate() {
        let index = i + 1;
        match test_arguments(test, &payload.method, methods) {
            Ok(args) => body.push_str(&format!(
                "        harness.run({}, () -> new Object[] {{{}}});\n",
                index,
                args.join(", ")
            )),
            Err(message) => body.push_str(&format!(
                "        harness.fail({}, {});\n",
                index,
                java::string_literal(&message)
            )),
        }
    }
    body
}

/// Java expressions for one test's arguments, or the per-test failure message
fn test_arguments(
    test: &TestCase,
    method: &str,
    methods: &[MethodSignature],
) -> Result<Vec<String>, String> {
    let candidates = overloads(methods, method, test.args.len());
    // Typed rendering needs a single unambiguous overload; otherwise the
    // runtime marshaler picks one.
    let signature = match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    };

    test.args
        .iter()
        .enumerate()
        .map(|(j, raw)| argument(raw, signature, j).map_err(|e| format!("argument {}: {}", j + 1, e)))
        .collect()
}

fn argument(raw: &Value, signature: Option<&MethodSignature>, position: usize) -> Result<String, String> {
    let value = ArgValue::try_from(raw).map_err(|e| e.to_string())?;
    let ty = signature.and_then(|s| s.params.get(position));
    // Large values would overflow the 64 KB method limit as initializers
    if value_count(&value) > PACK_THRESHOLD {
        return packed_argument(&value, ty).map_err(|e| e.to_string());
    }
    match ty {
        Some(ty) => marshal(&value, ty).map_err(|e| e.to_string()),
        None => Ok(untyped(&value)),
    }
}

fn usage_main(methods: &[MethodSignature], invalid_payload: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(reason) = invalid_payload {
        body.push_str(&format!(
            "        System.err.println({});\n",
            java::string_literal(&format!("Invalid test payload: {}", reason))
        ));
    }

    let preferred = methods
        .iter()
        .find(|m| m.is_public && m.name != "main")
        .map(|m| java::string_literal(&m.name))
        .unwrap_or_else(|| "null".to_string());
    body.push_str(&format!("        SolutionHarness.printUsage({});\n", preferred));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SUM: &str = "public class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        return new int[] {0, 1};\n    }\n}\n";

    #[test]
    fn test_legacy_source_is_untouched() {
        let source = "public class Main {\n    public static void main(String[] a) {}\n}\n";
        let program = generate(source, "1 2\n");

        assert_eq!(program.mode, HarnessMode::Legacy);
        assert_eq!(program.source, source);
        assert_eq!(program.line_offset, 0);
        assert_eq!(program.run_stdin("1 2\n"), Some("1 2\n"));
        assert_eq!(program.run_stdin(""), None);
    }

    #[test]
    fn test_wraps_solution_with_typed_arguments() {
        let payload = r#"{"method":"twoSum","tests":[{"args":[[2,7,11,15],9]}]}"#;
        let program = generate(TWO_SUM, payload);

        assert_eq!(program.mode, HarnessMode::Harness);
        assert_eq!(program.run_stdin(payload), None);
        assert!(program.source.starts_with(PRELUDE));
        assert!(program.source.contains("\nclass Solution {"));
        assert!(!program.source.contains("public class Solution"));
        assert!(program
            .source
            .contains("SolutionHarness harness = SolutionHarness.forMethod(\"twoSum\");"));
        assert!(program
            .source
            .contains("harness.run(1, () -> new Object[] {new int[] {2, 7, 11, 15}, 9});"));
        assert!(program.source.contains("final class SolutionHarness"));
    }

    #[test]
    fn test_bad_test_becomes_a_failure_line_and_others_still_run() {
        let payload = r#"{"method":"twoSum","tests":[
            {"args":[[1,2],3]},
            {"args":["oops",3]},
            {"args":[[3,4],7]}
        ]}"#;
        let program = generate(TWO_SUM, payload);

        assert!(program
            .source
            .contains("harness.run(1, () -> new Object[] {new int[] {1, 2}, 3});"));
        assert!(program
            .source
            .contains("harness.fail(2, \"argument 1: expected int[] but got String\");"));
        assert!(program
            .source
            .contains("harness.run(3, () -> new Object[] {new int[] {3, 4}, 7});"));
    }

    #[test]
    fn test_arity_mismatch_is_left_to_the_runtime() {
        let payload = r#"{"method":"twoSum","tests":[{"args":[[1,2]]}]}"#;
        let program = generate(TWO_SUM, payload);

        assert!(program
            .source
            .contains("harness.run(1, () -> new Object[] {new Object[] {1, 2}});"));
    }

    #[test]
    fn test_object_arguments_fail_only_their_test() {
        let payload = r#"{"method":"twoSum","tests":[{"args":[{"a":1},2]}]}"#;
        let program = generate(TWO_SUM, payload);

        assert!(program.source.contains(
            "harness.fail(1, \"argument 1: objects are not supported as test arguments\");"
        ));
    }

    #[test]
    fn test_payload_strings_are_escaped() {
        let source = "class Solution {\n    public String echo(String s) { return s; }\n}\n";
        let payload = r#"{"method":"echo","tests":[{"args":["a\"b\\c\nd"]}]}"#;
        let program = generate(source, payload);

        assert!(program
            .source
            .contains(r#"harness.run(1, () -> new Object[] {"a\"b\\c\nd"});"#));
    }

    #[test]
    fn test_large_arrays_are_packed_into_string_constants() {
        let nums: Vec<i64> = (0..100_000).collect();
        let payload = serde_json::json!({
            "method": "twoSum",
            "tests": [{ "args": [nums, 7] }, { "args": [[1, 2], 3] }]
        });
        let program = generate(TWO_SUM, &payload.to_string());

        assert!(program
            .source
            .contains("harness.run(1, () -> new Object[] {SolutionHarness.unpack(int[].class, \"a100000;i0;i1;i2;"));
        assert!(program.source.contains("i99999;\"), 7});"));
        assert!(program
            .source
            .contains("harness.run(2, () -> new Object[] {new int[] {1, 2}, 3});"));
        assert!(!program.source.contains("new int[] {0, 1, 2"));
    }

    #[test]
    fn test_large_argument_errors_fail_only_their_test() {
        let mut nums: Vec<serde_json::Value> = (0..300).map(|n| serde_json::json!(n)).collect();
        nums[250] = serde_json::json!("x");
        let payload = serde_json::json!({ "method": "twoSum", "tests": [{ "args": [nums, 7] }] });
        let program = generate(TWO_SUM, &payload.to_string());

        assert!(program.source.contains(
            "harness.fail(1, \"argument 1: element 250: cannot parse \\\"x\\\" as int\");"
        ));
    }

    #[test]
    fn test_blank_payload_prints_usage() {
        let program = generate(TWO_SUM, "  ");

        assert_eq!(program.mode, HarnessMode::UsageHint);
        assert!(program
            .source
            .contains("SolutionHarness.printUsage(\"twoSum\");"));
        assert!(!program.source.contains("Invalid test payload"));
    }

    #[test]
    fn test_usage_names_first_public_method() {
        let source = "class Solution {\n    private int helper(int x) { return x; }\n    public static void main(String[] a) {}\n    public int solve(int[] a) { return a.length; }\n}\n";
        let program = generate(source, "");

        assert!(program.source.contains("SolutionHarness.printUsage(\"solve\");"));
    }

    #[test]
    fn test_invalid_payload_is_reported_before_usage() {
        let program = generate(TWO_SUM, "{not json");

        assert_eq!(program.mode, HarnessMode::UsageHint);
        assert!(program
            .source
            .contains("System.err.println(\"Invalid test payload: "));
        assert!(program.source.contains("SolutionHarness.printUsage(\"twoSum\");"));
    }

    #[test]
    fn test_line_mapping() {
        let program = generate(TWO_SUM, "");

        assert_eq!(program.line_offset, 3);
        assert_eq!(program.user_lines, 5);
        assert_eq!(program.line_map().user_line(4), Some(1));
        assert_eq!(program.line_map().user_line(8), Some(5));
        assert_eq!(program.line_map().user_line(3), None);
        assert_eq!(program.line_map().user_line(9), None);

        let user_first_line = program.source.lines().nth(3).unwrap();
        assert_eq!(user_first_line, "class Solution {");
    }
}
