//! Vote round storage trait.

use crate::StoreError;
use arbiter_types::{ConflictVote, VoteIndex};

/// Trait for storing open vote rounds, keyed by vote index.
pub trait VoteStore {
    /// Get a vote round. Returns `Ok(None)` if no round has this index.
    fn get_vote(&self, index: &VoteIndex) -> Result<Option<ConflictVote>, StoreError>;

    /// Insert or overwrite a vote round.
    fn put_vote(&self, vote: &ConflictVote) -> Result<(), StoreError>;

    /// Delete a vote round. Deleting a missing round is not an error.
    fn delete_vote(&self, index: &VoteIndex) -> Result<(), StoreError>;

    /// Whether a round with this index is currently stored.
    fn vote_exists(&self, index: &VoteIndex) -> Result<bool, StoreError> {
        Ok(self.get_vote(index)?.is_some())
    }

    /// All stored rounds, ordered by index.
    fn iter_votes(&self) -> Result<Vec<ConflictVote>, StoreError>;
}
