//! In-flight mutation guard
//!
//! A second mutation on the same `collection/id` while one is running fails
//! fast with `OperationInProgress`. The ticket releases the key on drop.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<DashMap<String, ()>>,
}

/// Held for the duration of one mutation
#[derive(Debug)]
pub struct InFlightTicket {
    keys: Arc<DashMap<String, ()>>,
    key: String,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `collection/id`, or fail if already claimed
    pub fn acquire(&self, collection: &str, id: &str) -> AppResult<InFlightTicket> {
        let key = format!("{}/{}", collection, id);
        match self.keys.entry(key.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(key = %key, "Rejected concurrent mutation");
                Err(AppError::in_progress(key))
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightTicket {
                    keys: self.keys.clone(),
                    key,
                })
            }
        }
    }

    pub fn is_busy(&self, collection: &str, id: &str) -> bool {
        self.keys.contains_key(&format!("{}/{}", collection, id))
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_second_claim_fails_until_release() {
        let guard = InFlightGuard::new();
        let ticket = guard.acquire("orders", "o1").unwrap();
        let err = guard.acquire("orders", "o1").unwrap_err();
        assert_eq!(err.code, ErrorCode::OperationInProgress);
        assert!(guard.acquire("orders", "o2").is_ok());

        drop(ticket);
        assert!(!guard.is_busy("orders", "o1"));
        assert!(guard.acquire("orders", "o1").is_ok());
    }
}
