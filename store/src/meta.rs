//! Metadata storage trait.

use crate::StoreError;

/// Key under which the last allocated vote index is persisted.
pub const LAST_VOTE_INDEX_KEY: &str = "last_vote_index";

/// Trait for storing bookkeeping values that don't belong to a vote round
/// (schema version, the vote index counter).
pub trait MetaStore {
    /// Store a metadata value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a metadata value, `Ok(None)` if the key was never written.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete a metadata entry.
    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// The last allocated vote index, 0 if none was ever allocated.
    fn last_vote_index(&self) -> Result<u64, StoreError> {
        match self.get_meta(LAST_VOTE_INDEX_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization(format!(
                        "{LAST_VOTE_INDEX_KEY} has unexpected byte length {}",
                        bytes.len()
                    ))
                })?;
                Ok(u64::from_le_bytes(arr))
            }
        }
    }

    /// Persist the last allocated vote index.
    fn set_last_vote_index(&self, index: u64) -> Result<(), StoreError> {
        self.put_meta(LAST_VOTE_INDEX_KEY, &index.to_le_bytes())
    }
}
