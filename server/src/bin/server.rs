//! QR art server binary.
//!
//! Starts the axum web server and waits for Ctrl+C.

use tracing_subscriber::EnvFilter;

use qr_art_server::app::SharedState;
use qr_art_server::server;
use qr_art_server::shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting QR art server");

    let config = qr_art_server::init_config();
    let state = SharedState::new(config)?;

    let s = state.clone();
    tokio::spawn(async move { shutdown::wait_for_signal(s).await });

    tracing::info!(
        port = state.server_port(),
        "Server running. Press Ctrl+C to stop."
    );
    server::start_server(state).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
