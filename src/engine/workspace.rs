//! Per-request workspace
//!
//! One uniquely named directory per request holding the generated source
//! and compiler output. The directory is removed when the `Workspace` is
//! dropped, so every exit path (early return, `?`, panic) cleans up.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const PREFIX: &str = "coderunner-java-";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh directory under `root`
    pub fn create(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(root)
            .with_context(|| format!("Failed to create workspace in {}", root.display()))?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path spellings that may show up in tool output
    pub fn path_variants(&self) -> Vec<PathBuf> {
        let mut variants = vec![self.path().to_path_buf()];
        if let Ok(canonical) = self.path().canonicalize() {
            if !variants.contains(&canonical) {
                variants.push(canonical);
            }
        }
        variants
    }

    /// Write the single source file
    pub async fn write_source(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(file_name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Remove the directory now, logging instead of failing
    pub fn close(self) {
        let path = self.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed workspace {}", path.display()),
            Err(e) => warn!("Failed to clean up workspace {}: {}", path.display(), e),
        }
    }
}
