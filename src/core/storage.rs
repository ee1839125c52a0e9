//=========================================================================
// Durable Local Storage
//=========================================================================
//
// Synchronous key→string storage behind the persistence middleware.
//
// Browser embeddings back this with localStorage. Tests and native
// harnesses use the in-memory implementation below.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

//=== StorageError ========================================================

/// Failure raised by a [`KeyValueStore`] write.
///
/// Quota errors are recoverable: the persistence middleware logs them and
/// continues without durable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend has no room left for the value.
    QuotaExceeded { key: String },

    /// Backend-specific failure (corrupt storage, access denied, ...).
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExceeded { key } => write!(f, "Storage quota exceeded writing '{}'", key),
            Self::Backend(cause) => write!(f, "Storage backend error: {}", cause),
        }
    }
}

impl std::error::Error for StorageError {}

//=== KeyValueStore =======================================================

/// Plain key→string storage with synchronous access.
///
/// Reads report absence as `None`. Writes may fail with
/// [`StorageError::QuotaExceeded`]; callers must treat that as non-fatal.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

//=== MemoryStore =========================================================

/// In-memory [`KeyValueStore`] with an optional byte quota.
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            quota_bytes: None,
        }
    }

    /// Creates a store that rejects writes once total stored bytes
    /// (keys plus values) would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

//=========================================================================
// Tests
//=========================================================================
