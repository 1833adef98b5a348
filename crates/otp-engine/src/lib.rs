//! OTP Engine
//!
//! Deterministic one-time-password generation and bounded-window validation
//! for three code families:
//!
//! - **HOTP** (RFC 4226): counter-driven HMAC-SHA1 codes with forward-window
//!   resynchronization
//! - **TOTP** (RFC 6238): time-step-driven HOTP with clock-drift tolerance
//! - **Challenge-response**: a model of DIGIPASS GO6-style hardware tokens,
//!   validated against rolling time-derived challenges
//!
//! The engine is pure and synchronous. HOTP counter state lives behind the
//! injected [`CounterStore`] abstraction; [`HotpAuthenticator`] combines the
//! two and guarantees that concurrent validations for one user can never
//! both accept the same code.
//!
//! # Example
//!
//! ```rust
//! use otp_engine::{hotp, validate_hotp, HotpConfig, Secret};
//!
//! // The RFC 4226 key "12345678901234567890", hex-encoded: the plain
//! // string is itself valid hex and would decode to different bytes
//! let secret = Secret::parse("3132333435363738393031323334353637383930").unwrap();
//!
//! // RFC 4226 test vector
//! assert_eq!(hotp(&secret, 0, 6).unwrap(), "755224");
//!
//! // Window validation resynchronizes the counter
//! let result = validate_hotp(&secret, "755224", 0, &HotpConfig::default()).unwrap();
//! assert!(result.accepted);
//! assert_eq!(result.new_counter, 1);
//! ```

pub mod authenticator;
pub mod challenge;
pub mod error;
pub mod hotp;
pub mod secret;
pub mod store;
pub mod totp;

pub use authenticator::{AuthenticatorError, HotpAuthenticator};
pub use challenge::{
    challenge_response, normalize_challenge, time_challenge, validate_challenge, ChallengeConfig,
};
pub use error::{OtpError, OtpResult, StoreError};
pub use hotp::{hotp, validate_hotp, HotpConfig, HotpValidation};
pub use secret::Secret;
pub use store::{CounterStore, MemoryCounterStore};
pub use totp::{totp, totp_now, unix_now, validate_totp, TotpConfig};
