//! Secret key material handling
//!
//! Token secrets arrive from enrollment stores as text: either a hex-encoded
//! key (the common case for imported hardware-token seeds) or a plain
//! passphrase. The decoding rule is: even-length valid hex decodes as hex,
//! anything else is taken as raw UTF-8 bytes. This matches the behavior of
//! every deployed generator this engine must interoperate with, even though
//! it means a secret like "cafe" is ambiguous (it decodes as hex here).

use crate::error::OtpError;

/// Decoded secret key material
///
/// The engine receives secrets per call and never persists them.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Decode secret material from its textual form
    ///
    /// Even-length valid hex is decoded as hex; anything else is used as
    /// raw UTF-8 bytes. Empty input is rejected.
    pub fn parse(text: &str) -> Result<Self, OtpError> {
        if text.is_empty() {
            return Err(OtpError::InvalidSecret("secret is empty".to_string()));
        }

        if text.len() % 2 == 0 {
            if let Ok(bytes) = hex::decode(text) {
                return Ok(Secret(bytes));
            }
        }

        Ok(Secret(text.as_bytes().to_vec()))
    }

    /// Wrap raw key bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, OtpError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(OtpError::InvalidSecret("secret is empty".to_string()));
        }
        Ok(Secret(bytes))
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Key material must not leak into logs
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.0.len())
            .finish()
    }
}
