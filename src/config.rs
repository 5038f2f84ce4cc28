//! Runner configuration
//!
//! Loaded once at startup from environment variables (a `.env` file is honoured)
//! and passed around explicitly. Nothing here changes after startup.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::runner::ResourceLimits;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Address the HTTP server binds to
    pub host: String,
    pub port: u16,
    /// Compile time limit in milliseconds (default: 5000ms)
    pub compile_timeout_ms: u64,
    /// Run time limit in milliseconds (default: 3000ms)
    pub run_timeout_ms: u64,
    /// Combined stdout+stderr cap per step in bytes (default: 1 MiB)
    pub max_output_bytes: usize,
    /// Largest accepted source in bytes (default: 100KB)
    pub max_source_bytes: usize,
    /// Parent directory for per-request workspaces
    pub workspace_root: PathBuf,
    /// POSIX limits applied to the compiled program
    pub run_limits: ResourceLimits,
    /// POSIX limits applied to the compiler
    pub compile_limits: ResourceLimits,
    /// Alternative language table (None = bundled table)
    pub languages_config: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            compile_timeout_ms: 5_000,
            run_timeout_ms: 3_000,
            max_output_bytes: 1024 * 1024,
            max_source_bytes: 100_000,
            workspace_root: std::env::temp_dir(),
            run_limits: ResourceLimits {
                file_size_mb: Some(16),
                ..ResourceLimits::default()
            },
            compile_limits: ResourceLimits {
                file_size_mb: Some(16),
                ..ResourceLimits::default()
            },
            languages_config: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from the environment, using defaults for unset variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let file_size_mb = optional(&lookup, "FILE_SIZE_LIMIT_MB")?.or(Some(16));

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            compile_timeout_ms: parse_or(&lookup, "COMPILE_TIMEOUT_MS", defaults.compile_timeout_ms)?,
            run_timeout_ms: parse_or(&lookup, "RUN_TIMEOUT_MS", defaults.run_timeout_ms)?,
            max_output_bytes: parse_or(&lookup, "MAX_OUTPUT_BYTES", defaults.max_output_bytes)?,
            max_source_bytes: parse_or(&lookup, "MAX_SOURCE_BYTES", defaults.max_source_bytes)?,
            workspace_root: lookup("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            run_limits: ResourceLimits {
                cpu_time_secs: optional(&lookup, "RUN_CPU_LIMIT_SECS")?,
                memory_mb: optional(&lookup, "RUN_MEMORY_LIMIT_MB")?,
                file_size_mb,
            },
            compile_limits: ResourceLimits {
                file_size_mb,
                ..ResourceLimits::default()
            },
            languages_config: lookup("LANGUAGES_CONFIG").map(PathBuf::from),
        })
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(optional(lookup, key)?.unwrap_or(default))
}

fn optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_reference_limits() {
        let config = RunnerConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.compile_timeout_ms, 5_000);
        assert_eq!(config.run_timeout_ms, 3_000);
        assert_eq!(config.max_output_bytes, 1_048_576);
        assert_eq!(config.max_source_bytes, 100_000);
        assert_eq!(config.run_limits.file_size_mb, Some(16));
        assert_eq!(config.run_limits.memory_mb, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = RunnerConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("RUN_TIMEOUT_MS", "1500"),
            ("RUN_MEMORY_LIMIT_MB", "512"),
            ("RUN_CPU_LIMIT_SECS", "2"),
            ("WORKSPACE_ROOT", "/var/tmp/runner"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.run_timeout_ms, 1500);
        assert_eq!(config.run_limits.memory_mb, Some(512));
        assert_eq!(config.run_limits.cpu_time_secs, Some(2));
        assert_eq!(config.compile_limits.memory_mb, None);
        assert_eq!(config.workspace_root, PathBuf::from("/var/tmp/runner"));
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = tokio_test::assert_err!(RunnerConfig::from_lookup(lookup_from(&[(
            "RUN_TIMEOUT_MS",
            "soon"
        )])));
        assert!(format!("{:#}", err).contains("RUN_TIMEOUT_MS"));
    }
}
