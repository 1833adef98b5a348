//! HOTP (RFC 4226) generation and bounded-window validation
//!
//! The code is HMAC-SHA1 over the big-endian 8-byte counter, reduced to a
//! short decimal string via dynamic truncation:
//!
//! ```text
//! offset = digest[19] & 0x0F
//! code   = BE_u32(digest[offset..offset+4]) & 0x7FFFFFFF mod 10^digits
//! ```
//!
//! Validation searches a forward counter window to tolerate a client that
//! has generated codes the server never saw; a match resynchronizes the
//! stored counter to one past the matched value.

use crate::error::{OtpError, OtpResult};
use crate::secret::Secret;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Default code length
pub const DEFAULT_DIGITS: u32 = 6;

/// Default forward validation window
pub const DEFAULT_WINDOW: u64 = 10;

/// HOTP validation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotpConfig {
    /// Number of code digits (1-10)
    #[serde(default = "default_digits")]
    pub digits: u32,

    /// Forward counter window tried during validation
    #[serde(default = "default_window")]
    pub window: u64,
}

fn default_digits() -> u32 {
    DEFAULT_DIGITS
}

fn default_window() -> u64 {
    DEFAULT_WINDOW
}

impl Default for HotpConfig {
    fn default() -> Self {
        HotpConfig {
            digits: default_digits(),
            window: default_window(),
        }
    }
}

impl HotpConfig {
    /// Validate policy values
    pub fn validate(&self) -> OtpResult<()> {
        if self.digits == 0 || self.digits > 10 {
            return Err(OtpError::InvalidDigits(self.digits));
        }
        Ok(())
    }
}

/// Outcome of an HOTP validation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotpValidation {
    /// Whether the presented code matched within the window
    pub accepted: bool,
    /// Counter value to persist: matched counter + 1 on acceptance,
    /// unchanged on rejection
    pub new_counter: u64,
}

/// Generate an HOTP code for a counter value
pub fn hotp(secret: &Secret, counter: u64, digits: u32) -> OtpResult<String> {
    if digits == 0 || digits > 10 {
        return Err(OtpError::InvalidDigits(digits));
    }

    let code = truncate(&hmac_sha1(secret, &counter.to_be_bytes()), digits);
    Ok(format!("{:0width$}", code, width = digits as usize))
}

/// Compute HMAC-SHA1 keyed by the secret
pub(crate) fn hmac_sha1(secret: &Secret, message: &[u8]) -> [u8; 20] {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);

    let mut digest = [0u8; 20];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// RFC 4226 Section 5.3 dynamic truncation
///
/// Widened to u64 so the 10-digit modulus cannot overflow.
pub(crate) fn truncate(digest: &[u8; 20], digits: u32) -> u64 {
    let offset = (digest[19] & 0x0F) as usize;
    let value = u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7FFF_FFFF;

    u64::from(value) % 10u64.pow(digits)
}

/// Check that a presented code has the expected shape
///
/// A malformed code (wrong length, non-digit characters) is a rejection,
/// never an error: guessing garbage must look exactly like guessing wrong.
pub(crate) fn code_is_well_formed(presented: &str, digits: u32) -> bool {
    presented.len() == digits as usize && presented.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a presented code against a forward counter window
///
/// Counters `counter .. counter + window` are tried in increasing order.
/// The first match accepts and resynchronizes `new_counter` to one past the
/// matched value; no match leaves the counter untouched so that failed
/// guesses cannot exhaust the counter space.
pub fn validate_hotp(
    secret: &Secret,
    presented: &str,
    counter: u64,
    config: &HotpConfig,
) -> OtpResult<HotpValidation> {
    config.validate()?;

    if !code_is_well_formed(presented, config.digits) {
        return Ok(HotpValidation {
            accepted: false,
            new_counter: counter,
        });
    }

    for candidate in counter..counter.saturating_add(config.window) {
        if hotp(secret, candidate, config.digits)? == presented {
            return Ok(HotpValidation {
                accepted: true,
                new_counter: candidate + 1,
            });
        }
    }

    Ok(HotpValidation {
        accepted: false,
        new_counter: counter,
    })
}
