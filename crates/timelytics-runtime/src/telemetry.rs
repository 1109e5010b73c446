use tracing::Level;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::registry;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to initialize telemetry subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// HTTP stacks underneath the server and the downloader.
const NOISY_TARGETS: [&str; 3] = ["hyper", "h2", "rustls"];

/// Install the process-wide subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set. Panics are logged before the previous hook
/// runs.
pub fn install(default_directive: &str) -> Result<(), TelemetryError> {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(filter_fn(|m| {
            if let Some(path) = m.module_path() {
                if NOISY_TARGETS.iter().any(|t| path.starts_with(t)) && *m.level() >= Level::DEBUG
                {
                    return false;
                }
            }
            true
        }));

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = registry().with(env_filter).with(layer);

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC => {info}");
        hook(info);
    }));

    match subscriber.try_init() {
        Ok(()) => Ok(()),
        Err(err) => Err(TelemetryError::Init(err)),
    }
}
