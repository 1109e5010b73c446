use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::Digest;

use crate::error::RegistryError;

/// Expected identity of the artifact. Any field left unset is not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPin {
    /// Size in bytes.
    pub size_bytes: Option<u64>,
    /// Normalized lowercase sha256 hex digest.
    pub sha256: Option<String>,
}

impl ArtifactPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Pin a sha256 checksum, accepting an optional `sha256:` prefix.
    pub fn with_sha256(mut self, checksum: &str) -> Result<Self, RegistryError> {
        self.sha256 = Some(normalize_checksum(checksum)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.size_bytes.is_none() && self.sha256.is_none()
    }
}

/// Check whether the file at `path` can be trusted as the artifact.
///
/// A missing or empty file is never valid. Pinned size and checksum are enforced when present.
pub fn file_is_valid(path: &Path, pin: &ArtifactPin) -> Result<bool, RegistryError> {
    if !path.is_file() {
        return Ok(false);
    }
    let metadata = fs::metadata(path)?;
    if metadata.len() == 0 {
        return Ok(false);
    }
    if let Some(expected) = pin.size_bytes {
        if metadata.len() != expected {
            return Ok(false);
        }
    }
    if let Some(expected) = &pin.sha256 {
        let (digest, _) = sha256_file(path)?;
        if &digest != expected {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Compute SHA256 checksum of a file.
pub fn sha256_file(path: &Path) -> Result<(String, u64), RegistryError> {
    let mut file = File::open(path)?;
    let mut hasher = sha2::Sha256::new();
    let mut buf = [0u8; 1024 * 64];
    let mut total = 0u64;
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
        total += read as u64;
    }
    let digest = format!("{:x}", hasher.finalize());
    Ok((digest, total))
}

/// Normalize a checksum string (strip prefixes, lowercase).
pub fn normalize_checksum(value: &str) -> Result<String, RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidChecksum(
            "checksum is empty".to_string(),
        ));
    }
    let lower = trimmed.to_ascii_lowercase();
    let digest = match lower.strip_prefix("sha256:") {
        Some(rest) => rest,
        None if lower.contains(':') => {
            return Err(RegistryError::InvalidChecksum(format!(
                "unsupported checksum format: {trimmed}"
            )));
        }
        None => lower.as_str(),
    };
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RegistryError::InvalidChecksum(format!(
            "expected 64 hex characters: {trimmed}"
        )));
    }
    Ok(digest.to_string())
}

/// Sibling path a download is streamed into before being renamed over `dest`.
pub fn partial_path(dest: &Path) -> Result<PathBuf, RegistryError> {
    sibling_path(dest, "partial")
}

/// Sibling path an artifact that failed to decode is moved to.
pub fn rejected_path(dest: &Path) -> Result<PathBuf, RegistryError> {
    sibling_path(dest, "rejected")
}

/// Sibling path of the record describing a rejected download.
pub fn rejection_record_path(dest: &Path) -> Result<PathBuf, RegistryError> {
    sibling_path(dest, "rejected.json")
}

fn sibling_path(dest: &Path, suffix: &str) -> Result<PathBuf, RegistryError> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| RegistryError::InvalidPath(format!("missing file name: {}", dest.display())))?
        .to_string_lossy();
    Ok(dest.with_file_name(format!(".{file_name}.{suffix}")))
}
