//! Counter state storage abstraction
//!
//! HOTP needs one monotonically non-decreasing counter per user identity.
//! The engine itself stays stateless; a [`CounterStore`] is injected and is
//! responsible for atomicity. Compare-and-swap is the primitive: a counter
//! advance only lands if nobody else advanced it first, which is what keeps
//! two concurrent validations from both accepting the same code.

use crate::error::StoreError;
use dashmap::DashMap;

/// Pluggable per-user counter storage
///
/// Implementations must be thread-safe. Unknown users read as counter 0
/// (enrollment with an imported counter happens through `set_counter`).
pub trait CounterStore: Send + Sync {
    /// Read the current counter for a user
    fn get_counter(&self, user: &str) -> Result<u64, StoreError>;

    /// Unconditionally set the counter for a user
    fn set_counter(&self, user: &str, value: u64) -> Result<(), StoreError>;

    /// Atomically move the counter from `expected` to `new`
    ///
    /// Returns `Ok(true)` if the stored value still equaled `expected` and
    /// was replaced, `Ok(false)` if another writer got there first.
    fn compare_and_swap(&self, user: &str, expected: u64, new: u64) -> Result<bool, StoreError>;
}

/// In-memory counter store
///
/// Per-user atomicity comes from the dashmap entry lock held across the
/// compare-and-swap.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, u64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        MemoryCounterStore {
            counters: DashMap::new(),
        }
    }

    /// Number of users with stored counters
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl CounterStore for MemoryCounterStore {
    fn get_counter(&self, user: &str) -> Result<u64, StoreError> {
        Ok(self.counters.get(user).map(|c| *c).unwrap_or(0))
    }

    fn set_counter(&self, user: &str, value: u64) -> Result<(), StoreError> {
        self.counters.insert(user.to_string(), value);
        Ok(())
    }

    fn compare_and_swap(&self, user: &str, expected: u64, new: u64) -> Result<bool, StoreError> {
        let mut entry = self.counters.entry(user.to_string()).or_insert(0);
        if *entry == expected {
            *entry = new;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
