//! Configuration loading from the environment.

pub mod app_config;

pub use app_config::ServerConfig;
