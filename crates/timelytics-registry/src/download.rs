use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::Digest;

use crate::cache::{ArtifactPin, partial_path};
use crate::error::RegistryError;
use crate::store::RemoteStore;

/// Removes the partial file unless the download completed.
struct PartialFile {
    path: PathBuf,
    keep: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Download `remote_id` into `dest`, verifying it against `pin`.
///
/// Bytes are streamed into a sibling `.partial` file and only renamed over `dest` once the
/// download is complete and verified, so `dest` never holds a truncated artifact.
pub fn download_to(
    store: &dyn RemoteStore,
    remote_id: &str,
    dest: &Path,
    pin: &ArtifactPin,
) -> Result<u64, RegistryError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut partial = PartialFile {
        path: partial_path(dest)?,
        keep: false,
    };

    let mut resp = store.fetch(remote_id)?;
    let mut file = File::create(&partial.path)?;
    let mut hasher = sha2::Sha256::new();
    let mut buf = [0u8; 1024 * 64];
    let mut total = 0u64;

    loop {
        let read = resp.read(&mut buf).map_err(|e| RegistryError::DownloadFailed {
            id: remote_id.to_string(),
            details: e.to_string(),
        })?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read])?;
        hasher.update(&buf[..read]);
        total += read as u64;
    }
    file.sync_all()?;
    drop(file);

    if total == 0 {
        return Err(RegistryError::EmptyArtifact {
            id: remote_id.to_string(),
        });
    }
    if let Some(expected) = pin.size_bytes {
        if total != expected {
            return Err(RegistryError::SizeMismatch {
                path: dest.display().to_string(),
                expected,
                actual: total,
            });
        }
    }
    let digest = format!("{:x}", hasher.finalize());
    if let Some(expected) = &pin.sha256 {
        if &digest != expected {
            return Err(RegistryError::ChecksumMismatch {
                path: dest.display().to_string(),
                expected: expected.clone(),
                actual: digest,
            });
        }
    }

    if dest.exists() {
        fs::remove_file(dest)?;
    }
    fs::rename(&partial.path, dest)?;
    partial.keep = true;

    tracing::debug!(bytes = total, sha256 = %digest, "artifact written to {}", dest.display());
    Ok(total)
}
