use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use timelytics_core::EnsembleModel;
use timelytics_registry::{Provisioner, RegistryError};

/// Why the model could not be made available.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The artifact is not on disk after the provisioning attempt.
    #[error("Model file is missing at {}: {source}", .path.display())]
    ArtifactMissing { path: PathBuf, source: RegistryError },
    /// The remote store could not be reached or refused the artifact.
    #[error("Model download failed: {0}")]
    Download(#[source] RegistryError),
    /// The artifact is on disk but is not a usable model.
    #[error("Error loading model: {0}")]
    ArtifactCorrupt(String),
}

impl LoadError {
    fn classify(err: RegistryError, path: &Path) -> Self {
        if err.is_network() {
            LoadError::Download(err)
        } else if err.is_content() {
            LoadError::ArtifactCorrupt(err.to_string())
        } else {
            LoadError::ArtifactMissing {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    /// Message shown to the person using the form.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::ArtifactMissing { .. } => {
                "Model file is missing! Please check the download.".to_string()
            }
            LoadError::Download(err) => {
                format!("Model file is missing! Downloading it failed: {err}")
            }
            LoadError::ArtifactCorrupt(details) => format!("Error loading model: {details}"),
        }
    }
}

type LoadResult = Result<Arc<EnsembleModel>, Arc<LoadError>>;

/// Process-wide holder of the deserialized model.
///
/// Callers that race on the same load attempt share a single deserialization and all observe
/// the same model or the same error. A successful load is kept for the life of the cache; a
/// failed attempt is retired once it completes, so a later request provisions again.
pub struct ModelCache {
    provisioner: Provisioner,
    attempt: Mutex<Arc<OnceLock<LoadResult>>>,
    loads: AtomicUsize,
}

impl ModelCache {
    pub fn new(provisioner: Provisioner) -> Self {
        Self {
            provisioner,
            attempt: Mutex::new(Arc::new(OnceLock::new())),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the model, provisioning and deserializing it on first use.
    pub fn get_model(&self) -> Result<Arc<EnsembleModel>, Arc<LoadError>> {
        let attempt = self.current_attempt();
        let result = attempt.get_or_init(|| self.load()).clone();
        if result.is_err() {
            self.retire(&attempt);
        }
        result
    }

    /// Whether a model is ready to serve without touching disk.
    pub fn is_loaded(&self) -> bool {
        self.current_attempt()
            .get()
            .is_some_and(|result| result.is_ok())
    }

    /// Number of deserializations performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    fn current_attempt(&self) -> Arc<OnceLock<LoadResult>> {
        self.attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn retire(&self, failed: &Arc<OnceLock<LoadResult>>) {
        let mut current = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::ptr_eq(&current, failed) {
            *current = Arc::new(OnceLock::new());
        }
    }

    fn load(&self) -> LoadResult {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let path = self.provisioner.path();
        tracing::info!("Loading model from {}", path.display());

        match self.provisioner.load::<EnsembleModel>() {
            Ok(model) => {
                tracing::info!(
                    name = model.name().unwrap_or("unnamed"),
                    estimators = model.estimators().len(),
                    "Model loaded"
                );
                Ok(Arc::new(model))
            }
            Err(err) => {
                let err = LoadError::classify(err, path);
                tracing::error!("{err}");
                Err(Arc::new(err))
            }
        }
    }
}
