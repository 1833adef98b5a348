//! Challenge-response codes for DIGIPASS-style hardware tokens
//!
//! Models the observed behavior of GO6-family tokens: an 8-byte challenge is
//! MACed with the token's key material (DES/3DES key bytes used as an HMAC
//! key) and reduced with the same dynamic truncation as HOTP. The real
//! vendor algorithm is proprietary and undocumented; this is a pragmatic
//! model, not a cryptographic equivalent, and anything validated against it
//! must have been generated by the same model.
//!
//! The token rolls its challenge from the clock: the uppercase 8-digit hex
//! rendering of the unix timestamp. Validation therefore recomputes the
//! challenge over a window of nearby times, plus one fixed
//! application-code-derived challenge when configured.

use crate::error::{OtpError, OtpResult};
use crate::hotp::{code_is_well_formed, hmac_sha1, truncate};
use crate::secret::Secret;
use serde::{Deserialize, Serialize};

/// Challenge length in bytes after normalization
pub const CHALLENGE_LEN: usize = 8;

/// Challenge-response validation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Number of code digits (1-10)
    #[serde(default = "default_digits")]
    pub digits: u32,

    /// Half-width of the time window tried during validation, in seconds
    #[serde(default = "default_drift_secs")]
    pub drift_secs: u64,

    /// Increment between tried times, in seconds
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,

    /// Fixed application-code challenge also tried during validation
    #[serde(default)]
    pub application_code: Option<String>,
}

fn default_digits() -> u32 {
    crate::hotp::DEFAULT_DIGITS
}

fn default_drift_secs() -> u64 {
    120
}

fn default_step_secs() -> u64 {
    30
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        ChallengeConfig {
            digits: default_digits(),
            drift_secs: default_drift_secs(),
            step_secs: default_step_secs(),
            application_code: None,
        }
    }
}

impl ChallengeConfig {
    /// Validate policy values
    pub fn validate(&self) -> OtpResult<()> {
        if self.digits == 0 || self.digits > 10 {
            return Err(OtpError::InvalidDigits(self.digits));
        }
        if self.step_secs == 0 {
            return Err(OtpError::InvalidSecret(
                "step_secs cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalize a challenge to exactly 8 bytes
///
/// Exactly 8 hex digits decode as hex; any other string contributes its
/// ASCII bytes, truncated or zero-padded to 8.
pub fn normalize_challenge(challenge: &str) -> [u8; CHALLENGE_LEN] {
    // 8 hex digits decode to 4 raw bytes, which then get zero-padded like
    // any other short challenge
    let raw: Vec<u8> = if challenge.len() == CHALLENGE_LEN {
        hex::decode(challenge).unwrap_or_else(|_| challenge.as_bytes().to_vec())
    } else {
        challenge.as_bytes().to_vec()
    };

    let mut out = [0u8; CHALLENGE_LEN];
    for (dst, src) in out.iter_mut().zip(raw) {
        *dst = src;
    }
    out
}

/// Render the rolling time-derived challenge for a unix timestamp
pub fn time_challenge(at_time: u64) -> String {
    format!("{:08X}", at_time)
}

/// Compute the response code for a challenge
pub fn challenge_response(secret: &Secret, challenge: &str, digits: u32) -> OtpResult<String> {
    if digits == 0 || digits > 10 {
        return Err(OtpError::InvalidDigits(digits));
    }

    let normalized = normalize_challenge(challenge);
    let code = truncate(&hmac_sha1(secret, &normalized), digits);
    Ok(format!("{:0width$}", code, width = digits as usize))
}

/// Validate a presented code against rolling time challenges
///
/// Recomputes the response for every challenge in
/// `at_time - drift ..= at_time + drift` at `step_secs` increments, then the
/// fixed application-code challenge if one is configured. Stateless.
pub fn validate_challenge(
    secret: &Secret,
    presented: &str,
    at_time: u64,
    config: &ChallengeConfig,
) -> OtpResult<bool> {
    config.validate()?;

    if !code_is_well_formed(presented, config.digits) {
        return Ok(false);
    }

    let start = at_time.saturating_sub(config.drift_secs);
    let end = at_time.saturating_add(config.drift_secs);

    let mut tried = start;
    while tried <= end {
        let challenge = time_challenge(tried);
        if challenge_response(secret, &challenge, config.digits)? == presented {
            return Ok(true);
        }
        tried = match tried.checked_add(config.step_secs) {
            Some(next) => next,
            None => break,
        };
    }

    if let Some(ref app_code) = config.application_code {
        if challenge_response(secret, app_code, config.digits)? == presented {
            return Ok(true);
        }
    }

    Ok(false)
}
