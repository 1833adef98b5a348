//! Upstream backend descriptors and per-backend statistics

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default RADIUS authentication port
pub const DEFAULT_AUTH_PORT: u16 = 1812;

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend host (IP address)
    pub host: String,

    /// Backend authentication port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for this backend
    pub secret: String,

    /// Optional display name (defaults to the host)
    #[serde(default)]
    pub name: Option<String>,

    /// Enable/disable this backend
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_port() -> u16 {
    DEFAULT_AUTH_PORT
}

fn default_enabled() -> bool {
    true
}

impl BackendConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        let _: SocketAddr = address.parse().map_err(|e| {
            ConfigError::Invalid(format!("Invalid backend address '{}': {}", address, e))
        })?;

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Backend '{}' has an empty shared secret",
                self.name.as_deref().unwrap_or(&self.host)
            )));
        }

        Ok(())
    }
}

/// Per-backend outcome counters
#[derive(Debug, Default)]
pub struct BackendStats {
    pub requests: AtomicU64,
    pub accepts: AtomicU64,
    pub rejects: AtomicU64,
    pub timeouts: AtomicU64,
    pub errors: AtomicU64,
}

impl BackendStats {
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.accepts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reject(&self) {
        self.rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn accepts(&self) -> u64 {
        self.accepts.load(Ordering::Relaxed)
    }

    pub fn rejects(&self) -> u64 {
        self.rejects.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Runtime backend descriptor
///
/// Immutable for the lifetime of a dispatch call; only the statistics
/// counters mutate.
pub struct Backend {
    /// Display name (for logging and audit)
    pub name: String,
    /// Resolved socket address
    pub address: SocketAddr,
    /// Shared secret bytes
    secret: Vec<u8>,
    /// Outcome counters
    stats: BackendStats,
}

impl Backend {
    /// Build a runtime backend from configuration
    pub fn new(config: BackendConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let address: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("Invalid backend address: {}", e)))?;
        let name = config.name.unwrap_or_else(|| config.host.clone());

        Ok(Backend {
            name,
            address,
            secret: config.secret.into_bytes(),
            stats: BackendStats::default(),
        })
    }

    /// Shared secret bytes
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Outcome counters
    pub fn stats(&self) -> &BackendStats {
        &self.stats
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}
