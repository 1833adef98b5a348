//! JSON configuration
//!
//! One file drives both halves of the binary: the backend set and deadline
//! for dispatch, and the enrolled token table for local OTP validation.

use crate::backend::BackendConfig;
use crate::error::ConfigError;
use otp_engine::{ChallengeConfig, HotpConfig, Secret, TotpConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// Which code family a token produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Hotp,
    Totp,
    Challenge,
}

/// One enrolled token user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    pub username: String,
    /// Secret material (hex or plain text, see otp-engine secret decoding)
    pub secret: String,
    pub kind: TokenKind,
    /// Imported HOTP counter (ignored for totp/challenge tokens)
    #[serde(default)]
    pub counter: u64,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream authentication backends
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Shared dispatch deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// NAS-IP-Address advertised in proxied requests
    #[serde(default = "default_nas_ip")]
    pub nas_ip: Ipv4Addr,

    /// Enrolled token users
    #[serde(default)]
    pub tokens: Vec<TokenUser>,

    /// HOTP validation policy
    #[serde(default)]
    pub hotp: HotpConfig,

    /// TOTP validation policy
    #[serde(default)]
    pub totp: TotpConfig,

    /// Challenge-response validation policy
    #[serde(default)]
    pub challenge: ChallengeConfig,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,

    /// Audit log file path (JSON lines, optional)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_nas_ip() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backends: Vec::new(),
            timeout_secs: default_timeout_secs(),
            nas_ip: default_nas_ip(),
            tokens: Vec::new(),
            hotp: HotpConfig::default(),
            totp: TotpConfig::default(),
            challenge: ChallengeConfig::default(),
            log_level: None,
            audit_log_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs cannot be 0".to_string(),
            ));
        }

        for backend in &self.backends {
            backend.validate()?;
        }

        for token in &self.tokens {
            if token.username.is_empty() {
                return Err(ConfigError::Invalid(
                    "Token username cannot be empty".to_string(),
                ));
            }
            Secret::parse(&token.secret).map_err(|e| {
                ConfigError::Invalid(format!("Token '{}': {}", token.username, e))
            })?;
        }

        self.hotp
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.totp
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.challenge
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    /// Example configuration written when no config file exists
    pub fn example() -> Self {
        Config {
            backends: vec![
                BackendConfig {
                    host: "127.0.0.1".to_string(),
                    port: 1812,
                    secret: "testing123".to_string(),
                    name: Some("privacyidea".to_string()),
                    enabled: true,
                },
                BackendConfig {
                    host: "127.0.0.1".to_string(),
                    port: 18120,
                    secret: "testing123".to_string(),
                    name: Some("legacy".to_string()),
                    enabled: false,
                },
            ],
            tokens: vec![
                TokenUser {
                    username: "demo".to_string(),
                    secret: "12345678901234567890".to_string(),
                    kind: TokenKind::Hotp,
                    counter: 0,
                },
                TokenUser {
                    username: "go6_demo".to_string(),
                    secret: "97FE185D4658D6A3".to_string(),
                    kind: TokenKind::Challenge,
                    counter: 0,
                },
            ],
            audit_log_path: Some("audit.log".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_config_validates() {
        assert!(Config::example().validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.nas_ip, Ipv4Addr::LOCALHOST);
        assert!(config.backends.is_empty());
        assert_eq!(config.hotp.window, 10);
        assert_eq!(config.totp.time_step, 30);
        assert_eq!(config.challenge.drift_secs, 120);
    }

    #[test]
    fn test_round_trip_through_file() {
        let temp = NamedTempFile::new().unwrap();
        let config = Config::example();
        config.to_file(temp.path()).unwrap();

        let loaded = Config::from_file(temp.path()).unwrap();
        assert_eq!(loaded.backends.len(), 2);
        assert_eq!(loaded.tokens.len(), 2);
        assert_eq!(loaded.tokens[0].kind, TokenKind::Hotp);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_token_secret_rejected() {
        let config = Config {
            tokens: vec![TokenUser {
                username: "broken".to_string(),
                secret: String::new(),
                kind: TokenKind::Hotp,
                counter: 0,
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TokenKind::Challenge).unwrap(),
            "\"challenge\""
        );
    }
}
