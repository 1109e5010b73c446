//! Download-if-absent provisioning for Timelytics model artifacts.
//!
//! A [Provisioner] maps one remote artifact id to one local path. The local copy is trusted only
//! when it passes content checks (non-empty, and matching the [ArtifactPin] when one is set), and
//! downloads land on disk atomically.

mod builder;
mod cache;
mod diagnostics;
mod download;
mod error;
mod provisioner;
mod store;

pub use builder::{DEFAULT_ARTIFACT_NAME, ProvisionerBuilder, default_artifact_path};
pub use cache::{ArtifactPin, file_is_valid, normalize_checksum, sha256_file};
pub use diagnostics::{ArtifactDiagnostics, DiagnosticsCache};
pub use error::RegistryError;
pub use provisioner::{LocalArtifact, Provisioner, Rejection, ensure_local};
pub use store::{DEFAULT_TIMEOUT, GOOGLE_DRIVE_URL, HttpStore, RemoteStore};
