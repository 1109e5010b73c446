use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use serde::Serialize;

use crate::cache::sha256_file;
use crate::error::RegistryError;

/// Snapshot of the local artifact (useful for health checks and debugging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDiagnostics {
    pub path: PathBuf,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ArtifactDiagnostics {
    /// Compute size and checksum of the file at `path`, if any.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        if !path.is_file() {
            return Ok(Self::absent(path));
        }
        let (digest, size) = sha256_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            present: true,
            size_bytes: Some(size),
            sha256: Some(digest),
        })
    }

    fn absent(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            present: false,
            size_bytes: None,
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    path: PathBuf,
    len: u64,
    modified: SystemTime,
}

/// Keeps the last computed diagnostics and only hashes the artifact again when its size or
/// modification time changes.
#[derive(Debug, Default)]
pub struct DiagnosticsCache {
    last: Mutex<Option<(FileStamp, ArtifactDiagnostics)>>,
}

impl DiagnosticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self, path: &Path) -> Result<ArtifactDiagnostics, RegistryError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Ok(ArtifactDiagnostics::absent(path)),
        };
        // Without a modification time there is nothing to key on.
        let Ok(modified) = metadata.modified() else {
            return ArtifactDiagnostics::from_path(path);
        };
        let stamp = FileStamp {
            path: path.to_path_buf(),
            len: metadata.len(),
            modified,
        };

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, diagnostics)) = last.as_ref() {
            if *cached == stamp {
                return Ok(diagnostics.clone());
            }
        }
        let diagnostics = ArtifactDiagnostics::from_path(path)?;
        *last = Some((stamp, diagnostics.clone()));
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn digest_is_reused_until_the_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"hello").unwrap();
        let cache = DiagnosticsCache::new();

        let first = cache.diagnostics(&path).unwrap();
        assert_eq!(first.sha256.as_deref(), Some(HELLO));

        // Same size and modification time: the stored digest is served without rehashing.
        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        fs::write(&path, b"hellO").unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        assert_eq!(cache.diagnostics(&path).unwrap(), first);

        fs::write(&path, b"hello!").unwrap();
        let changed = cache.diagnostics(&path).unwrap();
        assert_eq!(changed.size_bytes, Some(6));
        assert_ne!(changed.sha256, first.sha256);

        fs::remove_file(&path).unwrap();
        assert!(!cache.diagnostics(&path).unwrap().present);
    }

    #[test]
    fn reports_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let diag = ArtifactDiagnostics::from_path(&dir.path().join("missing.json")).unwrap();
        assert!(!diag.present);
        assert_eq!(
            serde_json::to_value(&diag).unwrap()["present"],
            serde_json::Value::Bool(false)
        );
        assert!(serde_json::to_value(&diag).unwrap().get("sha256").is_none());
    }

    #[test]
    fn reports_checksum_of_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"hello").unwrap();

        let diag = ArtifactDiagnostics::from_path(&path).unwrap();
        assert!(diag.present);
        assert_eq!(diag.size_bytes, Some(5));
        assert_eq!(
            diag.sha256.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }
}
