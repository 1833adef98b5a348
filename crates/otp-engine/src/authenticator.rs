//! Stateful HOTP validation against an injected counter store
//!
//! Ties the stateless window search to a [`CounterStore`] with a
//! read-validate-CAS loop. The CAS is what enforces the replay invariant:
//! when two validations race on the same user, only one advance lands; the
//! loser re-reads a counter that is already past the matched value and the
//! window search (which only looks forward) rejects the replayed code.

use crate::error::{OtpError, StoreError};
use crate::hotp::{validate_hotp, HotpConfig};
use crate::secret::Secret;
use crate::store::CounterStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Bounded retries for the read-validate-CAS loop
const MAX_CAS_ATTEMPTS: u32 = 4;

/// Errors from stateful HOTP validation
#[derive(Error, Debug)]
pub enum AuthenticatorError {
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// HOTP validator bound to a counter store
pub struct HotpAuthenticator {
    config: HotpConfig,
    store: Arc<dyn CounterStore>,
}

impl HotpAuthenticator {
    /// Create an authenticator over a counter store
    pub fn new(config: HotpConfig, store: Arc<dyn CounterStore>) -> Result<Self, OtpError> {
        config.validate()?;
        Ok(HotpAuthenticator { config, store })
    }

    /// Validation policy in effect
    pub fn config(&self) -> &HotpConfig {
        &self.config
    }

    /// Validate a presented code for a user, advancing the stored counter
    /// exactly once on success
    ///
    /// Failed validations never touch the stored counter, so guessing cannot
    /// exhaust the counter space.
    pub fn validate(
        &self,
        user: &str,
        secret: &Secret,
        presented: &str,
    ) -> Result<bool, AuthenticatorError> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let counter = self.store.get_counter(user)?;
            let result = validate_hotp(secret, presented, counter, &self.config)?;

            if !result.accepted {
                return Ok(false);
            }

            if self
                .store
                .compare_and_swap(user, counter, result.new_counter)?
            {
                debug!(
                    user = user,
                    counter = counter,
                    new_counter = result.new_counter,
                    "HOTP accepted, counter advanced"
                );
                return Ok(true);
            }

            // Lost the race; the winner already consumed a counter value.
            // Re-validate against the fresh counter.
            debug!(user = user, attempt = attempt, "Counter CAS conflict, retrying");
        }

        // Persistent contention: every attempt saw the counter move under
        // it. A competing validation already consumed the code, so this
        // one is a rejection, not a fault.
        warn!(
            user = user,
            attempts = MAX_CAS_ATTEMPTS,
            "Counter CAS retries exhausted, rejecting"
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotp::hotp;
    use crate::store::MemoryCounterStore;

    fn authenticator() -> (HotpAuthenticator, Arc<MemoryCounterStore>) {
        let store = Arc::new(MemoryCounterStore::new());
        let auth = HotpAuthenticator::new(HotpConfig::default(), store.clone()).unwrap();
        (auth, store)
    }

    fn rfc_secret() -> Secret {
        Secret::parse("3132333435363738393031323334353637383930").unwrap()
    }

    #[test]
    fn test_accept_advances_stored_counter() {
        let (auth, store) = authenticator();
        let secret = rfc_secret();
        let code = hotp(&secret, 0, 6).unwrap();

        assert!(auth.validate("alice", &secret, &code).unwrap());
        assert_eq!(store.get_counter("alice").unwrap(), 1);
    }

    #[test]
    fn test_reject_leaves_counter_alone() {
        let (auth, store) = authenticator();
        let secret = rfc_secret();

        assert!(!auth.validate("alice", &secret, "000000").unwrap());
        assert_eq!(store.get_counter("alice").unwrap(), 0);
    }

    #[test]
    fn test_replayed_code_rejected() {
        let (auth, _store) = authenticator();
        let secret = rfc_secret();
        let code = hotp(&secret, 0, 6).unwrap();

        assert!(auth.validate("alice", &secret, &code).unwrap());
        // Counter is now 1; the same code is behind the forward window
        assert!(!auth.validate("alice", &secret, &code).unwrap());
    }

    #[test]
    fn test_concurrent_same_code_single_accept() {
        let (auth, store) = authenticator();
        let auth = Arc::new(auth);
        let secret = rfc_secret();
        let code = hotp(&secret, 0, 6).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let auth = Arc::clone(&auth);
            let secret = secret.clone();
            let code = code.clone();
            handles.push(std::thread::spawn(move || {
                auth.validate("alice", &secret, &code).unwrap()
            }));
        }

        let accepts = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&accepted| accepted)
            .count();
        assert_eq!(accepts, 1);
        assert_eq!(store.get_counter("alice").unwrap(), 1);
    }

    /// Store whose CAS never lands, as if another validator always wins.
    struct ContendedStore;

    impl CounterStore for ContendedStore {
        fn get_counter(&self, _user: &str) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn set_counter(&self, _user: &str, _counter: u64) -> Result<(), StoreError> {
            Ok(())
        }

        fn compare_and_swap(
            &self,
            _user: &str,
            _expected: u64,
            _new: u64,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[test]
    fn test_cas_exhaustion_rejects_instead_of_erroring() {
        let auth =
            HotpAuthenticator::new(HotpConfig::default(), Arc::new(ContendedStore)).unwrap();
        let secret = rfc_secret();
        let code = hotp(&secret, 0, 6).unwrap();

        assert!(!auth.validate("alice", &secret, &code).unwrap());
    }

    #[test]
    fn test_within_window_resync() {
        let (auth, store) = authenticator();
        let secret = rfc_secret();
        let code = hotp(&secret, 5, 6).unwrap();

        assert!(auth.validate("alice", &secret, &code).unwrap());
        assert_eq!(store.get_counter("alice").unwrap(), 6);
    }
}
