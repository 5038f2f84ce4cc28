//! Bare-class detection and visibility rewrite
//!
//! A submission is a "bare class" when it declares `class Solution` and no
//! `public class Main`. Such a submission gets a generated `public class Main`
//! appended, so `Solution` must not be public: Java allows one public
//! top-level type per file.

use regex::Regex;
use std::sync::LazyLock;

static SOLUTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+Solution\b").unwrap());
static PUBLIC_MAIN_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bpublic\s+(?:(?:final|abstract|strictfp)\s+)*class\s+Main\b").unwrap()
});
static PUBLIC_SOLUTION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bpublic\s+((?:(?:final|abstract|strictfp)\s+)*)class\s+Solution\b").unwrap()
});

/// Source after preprocessing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub source: String,
    /// Whether the generated entry point will be wrapped around it
    pub wrap: bool,
}

pub fn is_bare_class(source: &str) -> bool {
    SOLUTION_CLASS.is_match(source) && !PUBLIC_MAIN_CLASS.is_match(source)
}

/// Detect the bare-class style and make `Solution` package-private.
/// Anything else passes through unchanged.
pub fn preprocess(source: &str) -> Preprocessed {
    if !is_bare_class(source) {
        return Preprocessed {
            source: source.to_string(),
            wrap: false,
        };
    }

    Preprocessed {
        source: PUBLIC_SOLUTION_CLASS
            .replace_all(source, "${1}class Solution")
            .into_owned(),
        wrap: true,
    }
}
