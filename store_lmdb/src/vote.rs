//! LMDB implementation of VoteStore.
//!
//! Rounds are keyed by the decimal string form of their index and stored as
//! bincode-encoded `ConflictVote` values.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use arbiter_store::{StoreError, VoteStore};
use arbiter_types::{ConflictVote, VoteIndex};

use crate::LmdbError;

pub struct LmdbVoteStore {
    pub(crate) env: Arc<Env>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
}

fn vote_key(index: &VoteIndex) -> Vec<u8> {
    index.to_string().into_bytes()
}

impl VoteStore for LmdbVoteStore {
    fn get_vote(&self, index: &VoteIndex) -> Result<Option<ConflictVote>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .votes_db
            .get(&rtxn, &vote_key(index))
            .map_err(LmdbError::from)?;
        match bytes {
            Some(b) => {
                let vote: ConflictVote = bincode::deserialize(b).map_err(LmdbError::from)?;
                Ok(Some(vote))
            }
            None => Ok(None),
        }
    }

    fn put_vote(&self, vote: &ConflictVote) -> Result<(), StoreError> {
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.votes_db
            .put(&mut wtxn, &vote_key(&vote.index), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_vote(&self, index: &VoteIndex) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.votes_db
            .delete(&mut wtxn, &vote_key(index))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn vote_exists(&self, index: &VoteIndex) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .votes_db
            .get(&rtxn, &vote_key(index))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn iter_votes(&self) -> Result<Vec<ConflictVote>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut votes = Vec::new();
        for item in self.votes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, bytes) = item.map_err(LmdbError::from)?;
            let vote: ConflictVote = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            votes.push(vote);
        }
        // Keys sort as strings ("10" < "9"); callers expect numeric order.
        votes.sort_by_key(|v| v.index);
        Ok(votes)
    }
}
