//! Typed JSON slot inside a sled tree.
//!
//! [`JsonSlot<T>`] binds one fixed key to one value type and handles
//! serialization on write and deserialization on read. Every persisted
//! Forest record is a slot.

use std::marker::PhantomData;

use forest_types::{ForestError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

// ---------------------------------------------------------------------------
// JsonSlot
// ---------------------------------------------------------------------------

/// A single key in a sled tree holding a JSON-encoded `T`.
pub struct JsonSlot<'a, T> {
    tree: &'a sled::Tree,
    key: &'static str,
    _marker: PhantomData<T>,
}

impl<'a, T> JsonSlot<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a slot for `key` in `tree`.
    pub(crate) fn new(tree: &'a sled::Tree, key: &'static str) -> Self {
        Self {
            tree,
            key,
            _marker: PhantomData,
        }
    }

    /// Returns the key this slot addresses.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Loads and decodes the value.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::StorageError`] if the read fails or the
    /// stored bytes are not a valid JSON `T`.
    pub fn load(&self) -> Result<Option<T>> {
        let raw = self
            .tree
            .get(self.key)
            .map_err(|e| ForestError::StorageError {
                reason: format!("sled get '{}' failed: {e}", self.key),
            })?;

        match raw {
            None => Ok(None),
            Some(bytes) => decode(self.key, &bytes).map(Some),
        }
    }

    /// Encodes and stores the value, replacing any previous one.
    pub fn store(&self, value: &T) -> Result<()> {
        let encoded = encode(self.key, value)?;
        self.tree
            .insert(self.key, encoded)
            .map_err(|e| ForestError::StorageError {
                reason: format!("sled insert '{}' failed: {e}", self.key),
            })?;
        Ok(())
    }

    /// Removes the value.
    ///
    /// Returns `Ok(true)` if the key existed, `Ok(false)` if it did not.
    pub fn clear(&self) -> Result<bool> {
        let prev = self
            .tree
            .remove(self.key)
            .map_err(|e| ForestError::StorageError {
                reason: format!("sled remove '{}' failed: {e}", self.key),
            })?;
        Ok(prev.is_some())
    }

    /// Returns `true` if a value is stored under the key.
    pub fn exists(&self) -> Result<bool> {
        self.tree
            .contains_key(self.key)
            .map_err(|e| ForestError::StorageError {
                reason: format!("sled contains_key '{}' failed: {e}", self.key),
            })
    }
}

// -- Codec --------------------------------------------------------------

pub(crate) fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ForestError::StorageError {
        reason: format!("failed to encode '{key}': {e}"),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|e| ForestError::StorageError {
        reason: format!("failed to decode '{key}': {e}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
