//! Enrolled token registry
//!
//! Binds the configured token table to the OTP engine: one shared counter
//! store for every HOTP user, stateless time-window checks for TOTP and
//! challenge tokens. Validation verdicts come back as plain booleans; audit
//! and logging happen at the caller's boundary.

use crate::config::{Config, TokenKind, TokenUser};
use otp_engine::{
    challenge_response, hotp, time_challenge, totp, validate_challenge, validate_totp,
    AuthenticatorError, ChallengeConfig, CounterStore, HotpAuthenticator, MemoryCounterStore,
    OtpError, Secret, TotpConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Token registry errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Unknown token user: {0}")]
    UnknownUser(String),
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),
    #[error("Validation error: {0}")]
    Authenticator(#[from] AuthenticatorError),
}

/// In-memory registry of enrolled tokens
pub struct TokenRegistry {
    users: HashMap<String, TokenUser>,
    store: Arc<MemoryCounterStore>,
    hotp_auth: HotpAuthenticator,
    totp: TotpConfig,
    challenge: ChallengeConfig,
}

impl TokenRegistry {
    /// Build a registry from configuration, seeding imported HOTP counters
    pub fn new(config: &Config) -> Result<Self, TokenError> {
        let store = Arc::new(MemoryCounterStore::new());
        for token in &config.tokens {
            if token.kind == TokenKind::Hotp {
                store
                    .set_counter(&token.username, token.counter)
                    .map_err(AuthenticatorError::from)?;
            }
        }

        let hotp_auth = HotpAuthenticator::new(config.hotp.clone(), store.clone())?;
        let users = config
            .tokens
            .iter()
            .map(|t| (t.username.clone(), t.clone()))
            .collect();

        Ok(TokenRegistry {
            users,
            store,
            hotp_auth,
            totp: config.totp.clone(),
            challenge: config.challenge.clone(),
        })
    }

    /// Usernames of all enrolled tokens
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(|k| k.as_str())
    }

    /// Current HOTP counter for a user
    pub fn counter(&self, username: &str) -> u64 {
        self.store.get_counter(username).unwrap_or(0)
    }

    /// Generate the code a user's token shows right now
    pub fn current_code(&self, username: &str, at_time: u64) -> Result<String, TokenError> {
        let token = self
            .users
            .get(username)
            .ok_or_else(|| TokenError::UnknownUser(username.to_string()))?;
        let secret = Secret::parse(&token.secret)?;

        let code = match token.kind {
            TokenKind::Hotp => {
                let counter = self.counter(username);
                hotp(&secret, counter, self.hotp_auth.config().digits)?
            }
            TokenKind::Totp => totp(&secret, at_time, &self.totp)?,
            TokenKind::Challenge => {
                challenge_response(&secret, &time_challenge(at_time), self.challenge.digits)?
            }
        };
        Ok(code)
    }

    /// Validate a presented code for a user
    ///
    /// HOTP acceptance advances the stored counter; TOTP and challenge
    /// validation are stateless.
    pub fn validate(
        &self,
        username: &str,
        presented: &str,
        at_time: u64,
    ) -> Result<bool, TokenError> {
        let token = self
            .users
            .get(username)
            .ok_or_else(|| TokenError::UnknownUser(username.to_string()))?;
        let secret = Secret::parse(&token.secret)?;

        let accepted = match token.kind {
            TokenKind::Hotp => self.hotp_auth.validate(username, &secret, presented)?,
            TokenKind::Totp => validate_totp(&secret, presented, at_time, &self.totp)?,
            TokenKind::Challenge => {
                validate_challenge(&secret, presented, at_time, &self.challenge)?
            }
        };
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TokenRegistry {
        let config = Config {
            tokens: vec![
                TokenUser {
                    username: "demo".to_string(),
                    secret: "3132333435363738393031323334353637383930".to_string(),
                    kind: TokenKind::Hotp,
                    counter: 0,
                },
                TokenUser {
                    username: "vasco_demo".to_string(),
                    secret: "3132333435363738393031323334353637383930".to_string(),
                    kind: TokenKind::Totp,
                    counter: 0,
                },
                TokenUser {
                    username: "go6_demo".to_string(),
                    secret: "97FE185D4658D6A3".to_string(),
                    kind: TokenKind::Challenge,
                    counter: 0,
                },
            ],
            ..Default::default()
        };
        TokenRegistry::new(&config).unwrap()
    }

    #[test]
    fn test_hotp_user_validates_and_advances() {
        let registry = registry();
        let code = registry.current_code("demo", 0).unwrap();
        assert_eq!(code, "755224"); // counter 0

        assert!(registry.validate("demo", &code, 0).unwrap());
        assert_eq!(registry.counter("demo"), 1);
        assert_eq!(registry.current_code("demo", 0).unwrap(), "287082");
    }

    #[test]
    fn test_totp_user_validates_at_current_time() {
        let registry = registry();
        let now = 1_700_000_000;
        let code = registry.current_code("vasco_demo", now).unwrap();
        assert!(registry.validate("vasco_demo", &code, now).unwrap());
        assert!(!registry.validate("vasco_demo", &code, now + 300).unwrap());
    }

    #[test]
    fn test_challenge_user_validates_with_drift() {
        let registry = registry();
        let now = 1_700_000_000;
        let code = registry.current_code("go6_demo", now).unwrap();
        assert!(registry.validate("go6_demo", &code, now + 90).unwrap());
    }

    #[test]
    fn test_unknown_user_errors() {
        let registry = registry();
        assert!(matches!(
            registry.validate("nobody", "123456", 0),
            Err(TokenError::UnknownUser(_))
        ));
    }

    #[test]
    fn test_imported_counter_is_seeded() {
        let config = Config {
            tokens: vec![TokenUser {
                username: "imported".to_string(),
                secret: "3132333435363738393031323334353637383930".to_string(),
                kind: TokenKind::Hotp,
                counter: 9,
            }],
            ..Default::default()
        };
        let registry = TokenRegistry::new(&config).unwrap();
        assert_eq!(registry.counter("imported"), 9);
        assert_eq!(registry.current_code("imported", 0).unwrap(), "520489");
    }
}
