//! HTTP front end for the `qr-art` renderer.

pub mod app;
pub mod config;
pub mod server;
pub mod services;
pub mod shutdown;

#[cfg(test)]
mod test_support;

use config::ServerConfig;

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load .env and build the runtime config from the environment.
pub fn init_config() -> ServerConfig {
    load_dotenv();
    let config = ServerConfig::load();
    tracing::info!(
        addr = %config.bind_addr(),
        art_fetch_timeout_secs = config.art_fetch_timeout.as_secs(),
        art_max_bytes = config.art_max_bytes,
        box_size = config.render.box_size,
        quiet = config.render.quiet,
        "Configuration loaded"
    );
    config
}
