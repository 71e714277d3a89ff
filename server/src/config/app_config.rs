//! Runtime server configuration loaded from environment variables.

use std::time::Duration;

use qr_art::RenderConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ART_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_ART_MAX_BYTES: usize = 20 * 1024 * 1024;

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub art_fetch_timeout: Duration,
    pub art_max_bytes: usize,
    /// Base render settings; request parameters are applied on top.
    pub render: RenderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            art_fetch_timeout: Duration::from_secs(DEFAULT_ART_FETCH_TIMEOUT_SECS),
            art_max_bytes: DEFAULT_ART_MAX_BYTES,
            render: RenderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let g = |key: &str| -> String { lookup(key).unwrap_or_default().trim().to_string() };

        let host = {
            let h = g("SERVER_HOST");
            if h.is_empty() { DEFAULT_HOST.into() } else { h }
        };
        let timeout_secs = parse_u64(&g("ART_FETCH_TIMEOUT_SECS"), DEFAULT_ART_FETCH_TIMEOUT_SECS);

        Self {
            host,
            port: parse_u16(&g("SERVER_PORT"), DEFAULT_PORT),
            art_fetch_timeout: Duration::from_secs(timeout_secs.max(1)),
            art_max_bytes: parse_usize(&g("ART_MAX_BYTES"), DEFAULT_ART_MAX_BYTES),
            render: RenderConfig::default(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_u16(s: &str, default: u16) -> u16 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_usize(s: &str, default: usize) -> usize {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
