//! In-process key-value store
//!
//! Clones share the same map, so a test can keep a handle while the store
//! owns another. An optional byte quota mimics the browser's
//! quota-exceeded failure.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Shared {
    entries: RefCell<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    writes: Cell<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    shared: Rc<Shared>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            shared: Rc::new(Shared {
                quota_bytes: Some(bytes),
                ..Shared::default()
            }),
        }
    }

    /// Number of successful `set_item` calls so far
    pub fn write_count(&self) -> usize {
        self.shared.writes.get()
    }

    pub fn len(&self) -> usize {
        self.shared.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.shared
            .entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.shared.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.shared.quota_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.shared
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.shared.writes.set(self.shared.writes.get() + 1);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.shared.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.write_count(), 1);
        b.remove_item("k").unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let store = MemoryStorage::with_quota(10);
        store.set_item("k", "12345").unwrap();
        // Overwriting frees the old value first
        store.set_item("k", "123456789").unwrap();
        let err = store.set_item("k2", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_count(), 2);
    }
}
