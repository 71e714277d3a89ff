use crate::app::SharedState;

/// Wait for Ctrl+C, then run the shutdown sequence.
pub async fn wait_for_signal(state: SharedState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    graceful_shutdown(&state);
}

pub fn graceful_shutdown(state: &SharedState) {
    tracing::info!("Shutdown sequence started");
    state.shutdown_token().cancel();
    tracing::info!("Shutdown: server stop requested");
}
