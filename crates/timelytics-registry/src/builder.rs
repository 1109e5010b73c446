use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};

use crate::cache::ArtifactPin;
use crate::error::RegistryError;
use crate::provisioner::Provisioner;
use crate::store::{DEFAULT_TIMEOUT, GOOGLE_DRIVE_URL, HttpStore, RemoteStore};

/// File name of the artifact when no explicit path is given.
pub const DEFAULT_ARTIFACT_NAME: &str = "voting_model.json";

/// Builder for a [Provisioner] backed by an HTTP store.
#[derive(Debug, Clone)]
pub struct ProvisionerBuilder {
    remote_id: String,
    path: Option<PathBuf>,
    url_template: Option<String>,
    timeout: Option<Duration>,
    pin: ArtifactPin,
}

impl ProvisionerBuilder {
    /// Create a new builder for the artifact identified by `remote_id`.
    pub fn new(remote_id: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            path: None,
            url_template: None,
            timeout: None,
            pin: ArtifactPin::default(),
        }
    }

    /// Store the artifact at a specific path (platform cache directory by default).
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use a specific URL template containing `{id}` (Google Drive by default).
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// Bound the duration of the download request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_pin(mut self, pin: ArtifactPin) -> Self {
        self.pin = pin;
        self
    }

    /// Build the provisioner.
    pub fn build(self) -> Result<Provisioner, RegistryError> {
        let store = HttpStore::new(
            self.url_template.as_deref().unwrap_or(GOOGLE_DRIVE_URL),
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;
        self.build_with_store(Arc::new(store))
    }

    /// Build the provisioner on top of an arbitrary store.
    pub fn build_with_store(
        self,
        store: Arc<dyn RemoteStore>,
    ) -> Result<Provisioner, RegistryError> {
        let path = match self.path {
            Some(path) => path,
            None => default_artifact_path()?,
        };
        if path.file_name().is_none() {
            return Err(RegistryError::InvalidPath(format!(
                "artifact path must name a file: {}",
                path.display()
            )));
        }
        Ok(Provisioner::new(store, path, self.remote_id).with_pin(self.pin))
    }
}

/// Get the default location of the artifact.
pub fn default_artifact_path() -> Result<PathBuf, RegistryError> {
    if let Some(project) = ProjectDirs::from("io", "timelytics", "timelytics") {
        return Ok(project.cache_dir().join(DEFAULT_ARTIFACT_NAME));
    }
    if let Some(base) = BaseDirs::new() {
        return Ok(base.cache_dir().join("timelytics").join(DEFAULT_ARTIFACT_NAME));
    }
    Err(RegistryError::CacheDirUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_and_pin_are_kept() {
        let pin = ArtifactPin::new().with_size(42);
        let provisioner = ProvisionerBuilder::new("abc")
            .with_path("/srv/models/voting_model.json")
            .with_pin(pin.clone())
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(
            provisioner.path(),
            std::path::Path::new("/srv/models/voting_model.json")
        );
        assert_eq!(provisioner.remote_id(), "abc");
        assert_eq!(provisioner.pin(), &pin);
    }

    #[test]
    fn bad_template_fails_the_build() {
        let err = ProvisionerBuilder::new("abc")
            .with_path("/tmp/model.json")
            .with_url_template("http://localhost/model.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl(_)));
    }

    #[test]
    fn path_must_name_a_file() {
        let err = ProvisionerBuilder::new("abc")
            .with_path("/")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
    }
}
