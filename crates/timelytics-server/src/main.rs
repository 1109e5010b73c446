//! Timelytics
//!
//! Web form predicting Order-to-Delivery wait times with a pre-trained voting ensemble.

use std::sync::Arc;

use clap::Parser;
use timelytics_runtime::ModelCache;
use timelytics_runtime::cli::ModelArgs;
use timelytics_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "timelytics", version, about = "Order-to-Delivery wait time forecasting")]
struct Cli {
    /// Host to bind to
    #[arg(long, env = "TIMELYTICS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "TIMELYTICS_PORT", default_value_t = 8501)]
    port: u16,

    /// Load the model at startup instead of on the first prediction
    #[arg(long, env = "TIMELYTICS_EAGER")]
    eager: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    timelytics_runtime::telemetry::install("info,tower_http=debug")?;

    let provisioner = cli.model.provisioner()?;
    info!("Timelytics v{}", env!("CARGO_PKG_VERSION"));
    info!("  Model path: {}", provisioner.path().display());
    info!("  Remote id:  {}", provisioner.remote_id());

    let cache = Arc::new(ModelCache::new(provisioner));
    if cli.eager {
        let cache = cache.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(err) = cache.get_model() {
                tracing::warn!("Model warm-up failed, will retry on first request: {err}");
            }
        });
    }

    let app = timelytics_server::app(Arc::new(AppState::new(cache)));

    let listener = bind(&cli.host, cli.port).await?;
    info!("Starting server on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Bind to `host`, which may be a name such as `localhost` or a bare IPv6 address.
async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host.trim_start_matches('[').trim_end_matches(']'), port)).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
