//! Command line and environment configuration of the model artifact, shared by every binary
//! that serves predictions.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use timelytics_registry::{ArtifactPin, Provisioner, ProvisionerBuilder, RegistryError};

/// Remote id of the published voting ensemble.
pub const DEFAULT_REMOTE_ID: &str = "1reTM7fTqgScx6X0ddwHOvwACAEy_3Asd";

#[derive(Args, Debug, Clone)]
/// Where the model artifact lives and how to fetch it.
pub struct ModelArgs {
    /// Local path of the artifact. Defaults to the platform cache directory.
    #[arg(long, env = "TIMELYTICS_MODEL_PATH")]
    pub model_path: Option<PathBuf>,
    /// Id of the artifact in the remote store.
    #[arg(long, env = "TIMELYTICS_REMOTE_ID", default_value = DEFAULT_REMOTE_ID)]
    pub remote_id: String,
    /// Download URL template containing `{id}`. Defaults to Google Drive.
    #[arg(long, env = "TIMELYTICS_REMOTE_URL")]
    pub remote_url: Option<String>,
    /// Expected sha256 of the artifact, optionally prefixed with `sha256:`.
    #[arg(long, env = "TIMELYTICS_MODEL_SHA256")]
    pub sha256: Option<String>,
    /// Expected size of the artifact in bytes.
    #[arg(long, env = "TIMELYTICS_MODEL_SIZE")]
    pub size_bytes: Option<u64>,
    #[arg(long, env = "TIMELYTICS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    pub download_timeout_secs: u64,
}

impl ModelArgs {
    pub fn pin(&self) -> Result<ArtifactPin, RegistryError> {
        let mut pin = ArtifactPin::new();
        if let Some(size) = self.size_bytes {
            pin = pin.with_size(size);
        }
        if let Some(sha256) = &self.sha256 {
            pin = pin.with_sha256(sha256)?;
        }
        Ok(pin)
    }

    /// Build the provisioner these arguments describe.
    pub fn provisioner(&self) -> Result<Provisioner, RegistryError> {
        let mut builder = ProvisionerBuilder::new(&self.remote_id)
            .with_timeout(Duration::from_secs(self.download_timeout_secs))
            .with_pin(self.pin()?);
        if let Some(path) = &self.model_path {
            builder = builder.with_path(path);
        }
        if let Some(template) = &self.remote_url {
            builder = builder.with_url_template(template);
        }
        builder.build()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        model: ModelArgs,
    }

    #[test]
    fn test_parse_model_args() {
        let args = vec![
            "timelytics",
            "--model-path",
            "/srv/models/voting_model.json",
            "--remote-url",
            "http://localhost:9000/artifacts/{id}",
            "--size-bytes",
            "1024",
            "--download-timeout-secs",
            "5",
        ];
        let cli = TestCli::try_parse_from(args).unwrap();
        assert_eq!(
            cli.model.model_path,
            Some(PathBuf::from("/srv/models/voting_model.json"))
        );
        assert_eq!(cli.model.remote_id, DEFAULT_REMOTE_ID);
        assert_eq!(cli.model.download_timeout_secs, 5);

        let provisioner = cli.model.provisioner().unwrap();
        assert_eq!(provisioner.path(), cli.model.model_path.as_deref().unwrap());
        assert_eq!(provisioner.pin().size_bytes, Some(1024));
    }

    #[test]
    fn test_invalid_checksum_is_rejected() {
        let args = vec!["timelytics", "--sha256", "md5:abcd"];
        let cli = TestCli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.model.provisioner(),
            Err(RegistryError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let args = vec![
            "timelytics",
            "--model-path",
            "model.json",
            "--remote-url",
            "http://localhost/model.json",
        ];
        let cli = TestCli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.model.provisioner(),
            Err(RegistryError::InvalidUrl(_))
        ));
    }
}
