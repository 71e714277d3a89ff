use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Application shared state accessible from axum handlers.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    config: ServerConfig,
    /// HTTP client for artwork downloads
    http: reqwest::Client,
    /// Cancelled once on shutdown
    shutdown_token: CancellationToken,
}

impl SharedState {
    pub fn new(config: ServerConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.art_fetch_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SharedStateInner {
                config,
                http,
                shutdown_token: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn server_port(&self) -> u16 {
        self.inner.config.port
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }
}
