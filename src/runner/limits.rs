//! POSIX resource limits applied in the child before exec
//!
//! These are the only ceilings besides wall-clock time and output size;
//! there are no namespaces or cgroups.

use nix::sys::resource::{setrlimit, Resource};

/// Resource limits for one child process (None = inherit)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU seconds (RLIMIT_CPU)
    pub cpu_time_secs: Option<u64>,
    /// Address space in MB (RLIMIT_AS). The JVM reserves far more virtual
    /// memory than it touches, so keep this generous or pair it with -Xmx.
    pub memory_mb: Option<u64>,
    /// Largest file the process may write, in MB (RLIMIT_FSIZE)
    pub file_size_mb: Option<u64>,
}

impl ResourceLimits {
    /// (resource, value) pairs to install; soft and hard limits are equal
    pub fn rlimits(&self) -> Vec<(Resource, u64)> {
        let mut limits = Vec::new();
        if let Some(secs) = self.cpu_time_secs {
            limits.push((Resource::RLIMIT_CPU, secs));
        }
        if let Some(mb) = self.memory_mb {
            limits.push((Resource::RLIMIT_AS, mb.saturating_mul(1024 * 1024)));
        }
        if let Some(mb) = self.file_size_mb {
            limits.push((Resource::RLIMIT_FSIZE, mb.saturating_mul(1024 * 1024)));
        }
        limits
    }
}

/// Install the given limits in the current process.
///
/// Runs between fork and exec, so it only makes the setrlimit syscall.
pub fn apply(limits: &[(Resource, u64)]) -> std::io::Result<()> {
    for &(resource, value) in limits {
        setrlimit(resource, value as nix::libc::rlim_t, value as nix::libc::rlim_t)
            .map_err(std::io::Error::from)?;
    }
    Ok(())
}
