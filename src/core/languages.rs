//! Language configuration for compilation and execution

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Configuration for a supported programming language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    /// Canonical language name (e.g., "java")
    pub name: String,
    /// Name of the source file (e.g., "Main.java")
    pub source_file: String,
    /// Compile command (None if not needed)
    pub compile_command: Option<Vec<String>>,
    /// Run command
    pub run_command: Vec<String>,
    /// Whether bare `Solution` classes are wrapped with the generated test harness
    pub harness: bool,
    /// Compile timeout override in milliseconds
    pub compile_timeout_ms: Option<u64>,
    /// Run timeout override in milliseconds
    pub run_timeout_ms: Option<u64>,
}

impl LanguageConfig {
    /// Compile timeout for this language, falling back to the global one
    pub fn compile_timeout_ms(&self, default_ms: u64) -> u64 {
        self.compile_timeout_ms.unwrap_or(default_ms)
    }

    /// Run timeout for this language, falling back to the global one
    pub fn run_timeout_ms(&self, default_ms: u64) -> u64 {
        self.run_timeout_ms.unwrap_or(default_ms)
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    harness: bool,
    compile_timeout_ms: Option<u64>,
    run_timeout_ms: Option<u64>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Table of supported languages, keyed by lowercase name and alias
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    /// Load the language table bundled with the binary
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml_str(content)
    }

    /// Load a language table from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid language config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut languages = HashMap::new();

        for (name, raw) in raw_configs {
            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                anyhow::bail!("Empty run_command for {}", name);
            }

            let compile_command = raw
                .compile_command
                .map(|cmd| into_command(&cmd))
                .filter(|cmd| !cmd.is_empty());

            let config = LanguageConfig {
                name: name.to_lowercase(),
                source_file: raw.source_file,
                compile_command,
                run_command,
                harness: raw.harness,
                compile_timeout_ms: raw.compile_timeout_ms,
                run_timeout_ms: raw.run_timeout_ms,
            };

            // Add main language name
            languages.insert(name.to_lowercase(), config.clone());

            // Add aliases
            for alias in raw.aliases {
                languages.insert(alias.to_lowercase(), config.clone());
            }
        }

        Ok(Self { languages })
    }

    /// Get language configuration by language name or alias
    pub fn get(&self, language: &str) -> Option<&LanguageConfig> {
        self.languages.get(&language.to_lowercase())
    }

    /// Get all supported language names and aliases, sorted
    pub fn supported(&self) -> Vec<String> {
        let mut names: Vec<String> = self.languages.keys().cloned().collect();
        names.sort();
        names
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
