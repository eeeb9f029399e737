use crux_kv::error::KeyValueError;
use crux_kv::KeyValue;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// The durable slots the app persists. Each maps to one storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageSlot {
    Favorites,
    RecentSearches,
    DarkMode,
}

impl StorageSlot {
    pub const ALL: [StorageSlot; 3] = [
        StorageSlot::Favorites,
        StorageSlot::RecentSearches,
        StorageSlot::DarkMode,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            StorageSlot::Favorites => "favorites",
            StorageSlot::RecentSearches => "recent_searches",
            StorageSlot::DarkMode => "dark_mode",
        }
    }

    /// Looks a storage key up. Used by shells and tests that only see the key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }

    /// Serializes `value` for this slot, refusing anything over [`MAX_VALUE_SIZE`].
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, KvError> {
        let bytes = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
            message: e.to_string(),
            key: Some(self.key().to_string()),
        })?;
        if bytes.len() > MAX_VALUE_SIZE {
            return Err(KvError::ValueTooLarge {
                size: bytes.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        Ok(bytes)
    }

    /// Decodes a stored value; absent values yield `Ok(None)`.
    pub fn decode<T: DeserializeOwned>(self, stored: Option<Vec<u8>>) -> Result<Option<T>, KvError> {
        let Some(bytes) = stored else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KvError::Serialization {
                message: e.to_string(),
                key: Some(self.key().to_string()),
            })
    }

    pub fn read<F>(self, kv: &KeyValue<Event>, make_event: F)
    where
        F: FnOnce(KvResult) -> Event + Send + Sync + 'static,
    {
        kv.get(self.key().to_string(), move |result| {
            make_event(result.map_err(KvError::from))
        });
    }

    pub fn write<F>(self, kv: &KeyValue<Event>, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(KvResult) -> Event + Send + Sync + 'static,
    {
        tracing::debug!(slot = self.key(), bytes = value.len(), "persisting slot");
        kv.set(self.key().to_string(), value, move |result| {
            make_event(result.map_err(KvError::from))
        });
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String, key: Option<String> },
}

impl From<KeyValueError> for KvError {
    fn from(e: KeyValueError) -> Self {
        KvError::Storage {
            message: e.to_string(),
        }
    }
}

/// Stored bytes for a read, the replaced bytes for a write.
pub type KvResult = Result<Option<Vec<u8>>, KvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            StorageSlot::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(keys.len(), StorageSlot::ALL.len());
        for slot in StorageSlot::ALL {
            assert_eq!(StorageSlot::from_key(slot.key()), Some(slot));
        }
        assert_eq!(StorageSlot::from_key("nope"), None);
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(StorageSlot::DarkMode.encode(&true).unwrap(), b"true".to_vec());
    }

    #[test]
    fn test_encode_rejects_oversized_value() {
        let huge = "x".repeat(MAX_VALUE_SIZE);
        assert!(matches!(
            StorageSlot::RecentSearches.encode(&huge),
            Err(KvError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_missing_value() {
        let decoded: Option<bool> = StorageSlot::DarkMode.decode(None).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_decode_corrupt_value() {
        let result: Result<Option<Vec<String>>, _> =
            StorageSlot::RecentSearches.decode(Some(b"{not json".to_vec()));
        assert!(matches!(
            result,
            Err(KvError::Serialization { key: Some(ref k), .. }) if k == "recent_searches"
        ));
    }

    #[test]
    fn test_shell_error_becomes_storage_error() {
        let error: KvError = KeyValueError::Timeout.into();
        assert!(matches!(error, KvError::Storage { .. }));
    }
}
