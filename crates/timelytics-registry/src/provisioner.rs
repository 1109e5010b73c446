use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use timelytics_core::ArtifactDecode;

use crate::cache::{
    ArtifactPin, file_is_valid, rejected_path, rejection_record_path, sha256_file,
};
use crate::diagnostics::{ArtifactDiagnostics, DiagnosticsCache};
use crate::download::download_to;
use crate::error::RegistryError;
use crate::store::RemoteStore;

/// Artifact present on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    path: PathBuf,
    size_bytes: u64,
    downloaded: bool,
}

impl LocalArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Whether this call fetched the artifact from the remote store.
    pub fn downloaded(&self) -> bool {
        self.downloaded
    }
}

/// Downloaded artifact that failed to decode, persisted next to the artifact path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub remote_id: String,
    pub sha256: String,
    pub details: String,
}

impl Rejection {
    /// A rejection holds until the remote id or the pinned checksum changes.
    fn applies_to(&self, remote_id: &str, pin: &ArtifactPin) -> bool {
        self.remote_id == remote_id
            && pin
                .sha256
                .as_ref()
                .is_none_or(|expected| *expected == self.sha256)
    }

    /// Read the rejection recorded for `path`, if any. An unreadable record is ignored.
    pub fn load(path: &Path) -> Result<Option<Self>, RegistryError> {
        let record = rejection_record_path(path)?;
        let bytes = match fs::read(&record) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(rejection) => Ok(Some(rejection)),
            Err(e) => {
                tracing::warn!("ignoring unreadable rejection record {}: {e}", record.display());
                Ok(None)
            }
        }
    }

    fn store(&self, path: &Path) -> Result<PathBuf, RegistryError> {
        let record = rejection_record_path(path)?;
        let bytes = serde_json::to_vec_pretty(self).map_err(std::io::Error::from)?;
        fs::write(&record, bytes)?;
        Ok(record)
    }
}

/// Make sure a trusted copy of `remote_id` exists at `path`.
///
/// A file already at `path` that passes [file_is_valid] is reused without touching the network.
/// Otherwise the blob is fetched from `store`; on failure `path` is left untouched. A blob that
/// was already rejected for `remote_id` is not fetched again, see [Rejection].
pub fn ensure_local(
    store: &dyn RemoteStore,
    path: &Path,
    remote_id: &str,
    pin: &ArtifactPin,
) -> Result<LocalArtifact, RegistryError> {
    if file_is_valid(path, pin)? {
        let size_bytes = fs::metadata(path)?.len();
        tracing::debug!("artifact already present at {}", path.display());
        return Ok(LocalArtifact {
            path: path.to_path_buf(),
            size_bytes,
            downloaded: false,
        });
    }

    if let Some(rejection) = Rejection::load(path)? {
        if rejection.applies_to(remote_id, pin) {
            return Err(RegistryError::Rejected {
                id: rejection.remote_id,
                sha256: rejection.sha256,
                details: rejection.details,
                record: rejection_record_path(path)?.display().to_string(),
            });
        }
    }

    if path.exists() {
        tracing::warn!(
            "artifact at {} does not match its pin, downloading again",
            path.display()
        );
    }
    tracing::info!(
        "Downloading model from {} to {}",
        store.describe(remote_id),
        path.display()
    );
    let size_bytes = download_to(store, remote_id, path, pin)?;
    tracing::info!(bytes = size_bytes, "Model artifact downloaded");

    Ok(LocalArtifact {
        path: path.to_path_buf(),
        size_bytes,
        downloaded: true,
    })
}

/// Provisioner for a single artifact: one remote id mapped to one local path.
#[derive(Clone)]
pub struct Provisioner {
    store: Arc<dyn RemoteStore>,
    path: PathBuf,
    remote_id: String,
    pin: ArtifactPin,
    diagnostics: Arc<DiagnosticsCache>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("path", &self.path)
            .field("remote_id", &self.remote_id)
            .field("pin", &self.pin)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        path: impl Into<PathBuf>,
        remote_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            path: path.into(),
            remote_id: remote_id.into(),
            pin: ArtifactPin::default(),
            diagnostics: Arc::new(DiagnosticsCache::new()),
        }
    }

    pub fn with_pin(mut self, pin: ArtifactPin) -> Self {
        self.pin = pin;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn pin(&self) -> &ArtifactPin {
        &self.pin
    }

    /// See [ensure_local].
    pub fn ensure_local(&self) -> Result<LocalArtifact, RegistryError> {
        ensure_local(self.store.as_ref(), &self.path, &self.remote_id, &self.pin)
    }

    /// Ensure the artifact is local, then decode it.
    ///
    /// An artifact that fails to decode is moved aside to a hidden `.rejected` sibling. When it
    /// came from the remote store, a [Rejection] is recorded so the same blob is not downloaded
    /// again; a local file is simply replaced by a download on the next call.
    pub fn load<T: ArtifactDecode>(&self) -> Result<T, RegistryError> {
        let local = self.ensure_local()?;
        let file = File::open(local.path())?;
        match T::decode(file) {
            Ok(value) => {
                self.clear_rejection();
                Ok(value)
            }
            Err(e) => {
                let details = e.into().to_string();
                self.reject(&local, &details);
                Err(RegistryError::Decode(details))
            }
        }
    }

    fn reject(&self, local: &LocalArtifact, details: &str) {
        let rejection = if local.downloaded() {
            match sha256_file(&self.path) {
                Ok((sha256, _)) => Some(Rejection {
                    remote_id: self.remote_id.clone(),
                    sha256,
                    details: details.to_string(),
                }),
                Err(e) => {
                    tracing::error!("could not hash rejected artifact: {e}");
                    None
                }
            }
        } else {
            None
        };

        let moved = rejected_path(&self.path).and_then(|rejected| {
            fs::rename(&self.path, &rejected)?;
            Ok(rejected)
        });
        match moved {
            Ok(rejected) => tracing::warn!(
                "artifact at {} failed to decode, moved to {}",
                self.path.display(),
                rejected.display()
            ),
            Err(e) => tracing::error!(
                "artifact at {} failed to decode and could not be moved aside: {e}",
                self.path.display()
            ),
        }

        if let Some(rejection) = rejection {
            match rejection.store(&self.path) {
                Ok(record) => tracing::warn!(
                    "{} will not be downloaded again until {} is removed",
                    self.store.describe(&self.remote_id),
                    record.display()
                ),
                Err(e) => tracing::error!("could not record rejected artifact: {e}"),
            }
        }
    }

    fn clear_rejection(&self) {
        if let Ok(record) = rejection_record_path(&self.path) {
            match fs::remove_file(&record) {
                Ok(()) => tracing::debug!("removed stale rejection record {}", record.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("could not remove {}: {e}", record.display()),
            }
        }
    }

    /// Size and sha256 of the local artifact. The digest is only recomputed when the file's
    /// size or modification time changes.
    pub fn diagnostics(&self) -> Result<ArtifactDiagnostics, RegistryError> {
        self.diagnostics.diagnostics(&self.path)
    }
}
