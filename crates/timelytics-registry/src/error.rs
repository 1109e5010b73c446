/// Errors returned by the artifact provisioner.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote store could not deliver the artifact.
    #[error("Download failed for {id}: {details}")]
    DownloadFailed { id: String, details: String },
    /// The remote store delivered zero bytes.
    #[error("Downloaded artifact {id} is empty")]
    EmptyArtifact { id: String },
    /// The configured checksum is not a sha256 hex digest.
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),
    /// The remote URL template is unusable.
    #[error("Invalid remote URL template: {0}")]
    InvalidUrl(String),
    /// No default location could be resolved for the artifact.
    #[error("Artifact directory unavailable")]
    CacheDirUnavailable,
    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// A file checksum does not match the pin.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
    /// A file size does not match the pin.
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },
    /// Error while decoding the local artifact.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The remote artifact was already downloaded once and failed to decode.
    #[error(
        "Artifact {id} (sha256 {sha256}) was rejected earlier: {details}. Delete {record} or configure another artifact to download it again"
    )]
    Rejected {
        id: String,
        sha256: String,
        details: String,
        record: String,
    },
}

impl RegistryError {
    /// Whether the error comes from talking to the remote store rather than from local state or
    /// artifact content.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            RegistryError::DownloadFailed { .. } | RegistryError::Http(_)
        )
    }

    /// Whether the error means the artifact bytes themselves are unusable.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            RegistryError::Decode(_)
                | RegistryError::Rejected { .. }
                | RegistryError::EmptyArtifact { .. }
                | RegistryError::ChecksumMismatch { .. }
                | RegistryError::SizeMismatch { .. }
        )
    }
}
