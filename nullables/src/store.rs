//! Nullable stores: thread-safe in-memory storage for testing.

use arbiter_store::{MetaStore, StoreError, VoteStore};
use arbiter_types::{ConflictVote, VoteIndex};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory vote store.
pub struct NullVoteStore {
    votes: Mutex<BTreeMap<VoteIndex, ConflictVote>>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl NullVoteStore {
    pub fn new() -> Self {
        Self {
            votes: Mutex::new(BTreeMap::new()),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put_vote`/`delete_vote` fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete_vote` fail while puts still succeed.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.votes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }
}

impl Default for NullVoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteStore for NullVoteStore {
    fn get_vote(&self, index: &VoteIndex) -> Result<Option<ConflictVote>, StoreError> {
        Ok(self.votes.lock().unwrap().get(index).cloned())
    }

    fn put_vote(&self, vote: &ConflictVote) -> Result<(), StoreError> {
        self.check_writable()?;
        self.votes.lock().unwrap().insert(vote.index, vote.clone());
        Ok(())
    }

    fn delete_vote(&self, index: &VoteIndex) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("deletes disabled".into()));
        }
        self.votes.lock().unwrap().remove(index);
        Ok(())
    }

    fn iter_votes(&self) -> Result<Vec<ConflictVote>, StoreError> {
        Ok(self.votes.lock().unwrap().values().cloned().collect())
    }
}

/// An in-memory metadata store.
pub struct NullMetaStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl NullMetaStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for NullMetaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaStore for NullMetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
