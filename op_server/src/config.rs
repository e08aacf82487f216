//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use open_play::{db::DatabaseConfig, GroupPolicy};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Group admission policy applied to every event
    pub group_size: u32,
    /// Shared secret gating the organizer endpoints
    pub admin_token: String,
    /// Prometheus exporter bind address, if metrics are enabled
    pub metrics_bind: Option<SocketAddr>,
    /// Attempt cap for retrying conflicted operations
    pub max_retry_attempts: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SERVER_BIND`: bind address (default `127.0.0.1:8080`)
    /// - `DATABASE_URL` and the `DB_*` pool variables (see [`DatabaseConfig`])
    /// - `GROUP_SIZE`: players admitted together (default 4)
    /// - `ADMIN_TOKEN`: organizer endpoint secret
    /// - `METRICS_BIND`: Prometheus exporter address (unset disables it)
    /// - `MAX_RETRY_ATTEMPTS`: conflict retry cap (default 5)
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("SERVER_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
                .parse()
                .expect("Invalid SERVER_BIND address"),
            database: DatabaseConfig::from_env(),
            group_size: std::env::var("GROUP_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| GroupPolicy::default().group_size()),
            admin_token: std::env::var("ADMIN_TOKEN")
                .unwrap_or_else(|_| "default_admin_token_change_in_production".to_string()),
            metrics_bind: std::env::var("METRICS_BIND")
                .ok()
                .map(|v| v.parse().expect("Invalid METRICS_BIND address")),
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}
