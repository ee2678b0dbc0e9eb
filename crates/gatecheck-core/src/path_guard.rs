//! Confines a requested filename to one designated directory.
//!
//! Only the final segment of the requested name is ever used. Names that
//! try to climb (`..`) or are absolute are reported as [`Rejection::PathEscape`]
//! rather than being silently rebased, and the canonical result is checked
//! against the canonical base so symlinks cannot leave it either.
//!
//! The guard never opens the file; it only performs the canonicalization and
//! `stat` needed to decide. Existence errors are reported only for names that
//! already passed the containment check.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Rejection, ValidationResult};

#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Canonical base directory.
    base: PathBuf,
}

impl PathGuard {
    /// Canonicalize `base_dir` once; it must exist and be a directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = base_dir.as_ref();
        let base = std::fs::canonicalize(path).map_err(|e| ConfigError::BaseDir {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !base.is_dir() {
            return Err(ConfigError::BaseDir {
                path: path.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        tracing::info!(event = "path_guard_init", base = %base.display());
        Ok(Self { base })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Resolve `requested` to a canonical file path inside the base directory.
    pub fn resolve(&self, requested: &str) -> ValidationResult<PathBuf> {
        let candidate = self.lexical_candidate(requested)?;
        let canonical = std::fs::canonicalize(&candidate).map_err(|_| reject(Rejection::NotFound))?;
        self.check_contained(&canonical).map_err(reject)?;

        match std::fs::metadata(&canonical) {
            Ok(meta) if meta.is_file() => Ok(canonical),
            _ => Err(reject(Rejection::NotFound)),
        }
    }

    /// Async variant bounded by `timeout`; expiry is reported as `NotFound`.
    pub async fn resolve_within(
        &self,
        requested: &str,
        timeout: Duration,
    ) -> ValidationResult<PathBuf> {
        let candidate = self.lexical_candidate(requested)?;

        let checked = tokio::time::timeout(timeout, async {
            let canonical = tokio::fs::canonicalize(&candidate)
                .await
                .map_err(|_| Rejection::NotFound)?;
            self.check_contained(&canonical)?;
            match tokio::fs::metadata(&canonical).await {
                Ok(meta) if meta.is_file() => Ok(canonical),
                _ => Err(Rejection::NotFound),
            }
        })
        .await;

        match checked {
            Ok(Ok(path)) => Ok(path),
            Ok(Err(r)) => Err(reject(r)),
            Err(_elapsed) => {
                tracing::debug!(
                    guard = "path",
                    reason = Rejection::NotFound.code(),
                    timed_out = true,
                    "existence check timed out"
                );
                Err(Rejection::NotFound)
            }
        }
    }

    /// Base joined with the final segment of `requested`, before any I/O.
    fn lexical_candidate(&self, requested: &str) -> ValidationResult<PathBuf> {
        let name = final_segment(requested).map_err(reject)?;
        Ok(self.base.join(name))
    }

    fn check_contained(&self, canonical: &Path) -> ValidationResult<()> {
        // The directory itself is not a file.
        if canonical == self.base {
            return Err(Rejection::NotFound);
        }
        // Component-wise: `/srv/uploads-evil` does not start with `/srv/uploads`.
        if !canonical.starts_with(&self.base) {
            return Err(Rejection::PathEscape);
        }
        Ok(())
    }
}

/// One-shot form: canonicalize `base_dir` and resolve `name` against it.
///
/// An unusable base directory is reported as `NotFound` (fail-closed).
pub fn resolve(base_dir: impl AsRef<Path>, name: &str) -> ValidationResult<PathBuf> {
    let guard = PathGuard::new(base_dir).map_err(|_| Rejection::NotFound)?;
    guard.resolve(name)
}

/// Strip directory components, refusing names that are absolute or climb.
fn final_segment(requested: &str) -> ValidationResult<&str> {
    if requested.is_empty() || requested.contains('\0') {
        return Err(Rejection::InvalidArgument);
    }
    if requested.starts_with('/') || requested.starts_with('\\') || has_drive_prefix(requested) {
        return Err(Rejection::PathEscape);
    }

    let mut last = "";
    for segment in requested.split(['/', '\\']) {
        if segment == ".." {
            return Err(Rejection::PathEscape);
        }
        last = segment;
    }

    if last.is_empty() {
        return Err(Rejection::InvalidArgument);
    }
    Ok(last)
}

/// `C:\x` and `C:/x` everywhere. Drive-relative `C:x` only means a drive on
/// Windows; elsewhere it is an ordinary filename.
fn has_drive_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 2 || !b[0].is_ascii_alphabetic() || b[1] != b':' {
        return false;
    }
    cfg!(windows) || matches!(b.get(2), Some(b'/' | b'\\'))
}

fn reject(r: Rejection) -> Rejection {
    tracing::debug!(guard = "path", reason = r.code(), "rejected");
    r
}
