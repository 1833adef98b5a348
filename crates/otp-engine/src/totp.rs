//! TOTP (RFC 6238) generation and drift-tolerant validation
//!
//! TOTP is HOTP keyed by a time-step counter: `counter = unix_time / step`.
//! Validation is stateless; clock drift is tolerated by also checking the
//! codes of neighboring time steps.

use crate::error::{OtpError, OtpResult};
use crate::hotp::{code_is_well_formed, hotp};
use crate::secret::Secret;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default time step in seconds
pub const DEFAULT_TIME_STEP: u64 = 30;

/// TOTP validation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Number of code digits (1-10)
    #[serde(default = "default_digits")]
    pub digits: u32,

    /// Time step in seconds
    #[serde(default = "default_time_step")]
    pub time_step: u64,

    /// Drift steps checked during validation, in multiples of the time step
    #[serde(default = "default_drift_steps")]
    pub drift_steps: Vec<i64>,
}

fn default_digits() -> u32 {
    crate::hotp::DEFAULT_DIGITS
}

fn default_time_step() -> u64 {
    DEFAULT_TIME_STEP
}

fn default_drift_steps() -> Vec<i64> {
    vec![-1, 0, 1]
}

impl Default for TotpConfig {
    fn default() -> Self {
        TotpConfig {
            digits: default_digits(),
            time_step: default_time_step(),
            drift_steps: default_drift_steps(),
        }
    }
}

impl TotpConfig {
    /// Validate policy values
    pub fn validate(&self) -> OtpResult<()> {
        if self.digits == 0 || self.digits > 10 {
            return Err(OtpError::InvalidDigits(self.digits));
        }
        if self.time_step == 0 {
            return Err(OtpError::InvalidSecret(
                "time_step cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Generate a TOTP code for a given point in time
pub fn totp(secret: &Secret, at_time: u64, config: &TotpConfig) -> OtpResult<String> {
    config.validate()?;
    hotp(secret, at_time / config.time_step, config.digits)
}

/// Generate a TOTP code for the current time
pub fn totp_now(secret: &Secret, config: &TotpConfig) -> OtpResult<String> {
    totp(secret, unix_now(), config)
}

/// Validate a presented code against the configured drift window
///
/// Each drift step shifts the reference time by `drift * time_step` before
/// deriving the counter; the first match accepts. No state is kept.
pub fn validate_totp(
    secret: &Secret,
    presented: &str,
    at_time: u64,
    config: &TotpConfig,
) -> OtpResult<bool> {
    config.validate()?;

    if !code_is_well_formed(presented, config.digits) {
        return Ok(false);
    }

    for &drift in &config.drift_steps {
        let shifted = at_time.saturating_add_signed(drift * config.time_step as i64);
        if totp(secret, shifted, config)? == presented {
            return Ok(true);
        }
    }

    Ok(false)
}
