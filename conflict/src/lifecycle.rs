//! Vote round lifecycle: index allocation, round opening, commits and reveals.
//!
//! A round moves through `StateCommit -> StateReveal` and is removed by the
//! tally. Each juror commits once and may reveal only what it committed.
//! Once the tally starts settling a round, the round is frozen.

use std::sync::atomic::{AtomicU64, Ordering};

use arbiter_crypto::commit_hash;
use arbiter_store::{MetaStore, VoteStore};
use arbiter_types::{
    AccountAddress, ConflictVote, Hash32, ProviderResponse, Vote, VoteIndex, VoteResult,
    VoteState,
};

use crate::validator::ValidatedConflict;
use crate::ConflictError;

/// Process-wide vote index counter.
///
/// Starts from the last index persisted in the [`MetaStore`] (0 on a fresh
/// store), so the first index ever handed out is 1.
#[derive(Debug, Default)]
pub struct VoteIndexAllocator {
    last: AtomicU64,
}

impl VoteIndexAllocator {
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Restore the counter from its persisted value.
    pub fn restore<M: MetaStore + ?Sized>(meta: &M) -> Result<Self, ConflictError> {
        Ok(Self::starting_after(meta.last_vote_index()?))
    }

    /// The most recently allocated index value.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Hand out the next index that no stored round is using, and persist
    /// the counter.
    pub fn allocate<V, M>(&self, votes: &V, meta: &M) -> Result<VoteIndex, ConflictError>
    where
        V: VoteStore + ?Sized,
        M: MetaStore + ?Sized,
    {
        loop {
            let candidate = VoteIndex::new(self.last.fetch_add(1, Ordering::SeqCst) + 1);
            if votes.vote_exists(&candidate)? {
                continue;
            }
            meta.set_last_vote_index(self.last())?;
            return Ok(candidate);
        }
    }
}

/// Owns open rounds and enforces their state machine.
pub struct VoteLifecycleController<V, M> {
    votes: V,
    meta: M,
    allocator: VoteIndexAllocator,
}

impl<V: VoteStore, M: MetaStore> VoteLifecycleController<V, M> {
    pub fn new(votes: V, meta: M) -> Result<Self, ConflictError> {
        let allocator = VoteIndexAllocator::restore(&meta)?;
        tracing::debug!(last_vote_index = allocator.last(), "restored vote index counter");
        Ok(Self {
            votes,
            meta,
            allocator,
        })
    }

    pub fn votes(&self) -> &V {
        &self.votes
    }

    pub fn last_allocated_index(&self) -> u64 {
        self.allocator.last()
    }

    pub fn allocate_new_vote_index(&self) -> Result<VoteIndex, ConflictError> {
        self.allocator.allocate(&self.votes, &self.meta)
    }

    /// Open a round for a validated conflict.
    ///
    /// `draw_jury` receives the freshly allocated index so jury selection can
    /// be seeded with it. Every juror starts at `NoVote`.
    pub fn open_vote_round<F>(
        &self,
        conflict: &ValidatedConflict,
        vote_start_block: u64,
        draw_jury: F,
    ) -> Result<ConflictVote, ConflictError>
    where
        F: FnOnce(VoteIndex) -> Result<Vec<AccountAddress>, ConflictError>,
    {
        let index = self.allocate_new_vote_index()?;
        let jurors = draw_jury(index)?;
        if jurors.is_empty() {
            return Err(ConflictError::EmptyJury {
                chain_id: conflict.chain_id.clone(),
                epoch: conflict.epoch,
            });
        }

        let vote = ConflictVote {
            index,
            client_address: conflict.client,
            vote_start_block,
            vote_state: VoteState::StateCommit,
            chain_id: conflict.chain_id.clone(),
            api_url: conflict.api_url.clone(),
            request_data: conflict.request_data.clone(),
            request_block: conflict.request_block,
            first_provider: ProviderResponse {
                account: conflict.first.provider,
                response_hash: conflict.first.response_hash,
            },
            second_provider: ProviderResponse {
                account: conflict.second.provider,
                response_hash: conflict.second.response_hash,
            },
            voters_hash: jurors.into_iter().map(|j| (j, Vote::no_vote())).collect(),
            close_progress: None,
        };
        self.votes.put_vote(&vote)?;

        tracing::info!(
            vote_index = %index,
            chain_id = %vote.chain_id,
            jurors = vote.jury_size(),
            "opened vote round"
        );
        Ok(vote)
    }

    pub fn get_vote(&self, index: VoteIndex) -> Result<ConflictVote, ConflictError> {
        self.votes
            .get_vote(&index)?
            .ok_or(ConflictError::UnknownVote(index))
    }

    /// Record a juror's commitment hash.
    pub fn submit_commit(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        hash: Hash32,
    ) -> Result<(), ConflictError> {
        let mut vote = self.get_vote(index)?;
        expect_state(&vote, VoteState::StateCommit)?;

        let entry = vote
            .voters_hash
            .get_mut(juror)
            .ok_or(ConflictError::NotAJuror {
                index,
                juror: *juror,
            })?;
        if entry.result != VoteResult::NoVote {
            return Err(ConflictError::AlreadyCommitted {
                index,
                juror: *juror,
            });
        }
        *entry = Vote {
            hash,
            result: VoteResult::Commit,
        };
        self.votes.put_vote(&vote)?;

        tracing::debug!(vote_index = %index, juror = %juror, "accepted commit");
        Ok(())
    }

    /// Close the commit phase.
    pub fn advance_to_reveal(&self, index: VoteIndex) -> Result<(), ConflictError> {
        let mut vote = self.get_vote(index)?;
        expect_state(&vote, VoteState::StateCommit)?;
        vote.vote_state = VoteState::StateReveal;
        self.votes.put_vote(&vote)?;

        tracing::info!(vote_index = %index, "vote round entered reveal phase");
        Ok(())
    }

    /// Open a juror's commitment.
    ///
    /// The revealed response hash is classified against the two providers'
    /// responses; anything else counts as a vote for neither.
    pub fn submit_reveal(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        nonce: u64,
        response_hash: &Hash32,
    ) -> Result<VoteResult, ConflictError> {
        let mut vote = self.get_vote(index)?;
        expect_state(&vote, VoteState::StateReveal)?;

        let result = if *response_hash == vote.first_provider.response_hash {
            VoteResult::Provider0
        } else if *response_hash == vote.second_provider.response_hash {
            VoteResult::Provider1
        } else {
            VoteResult::None
        };

        let entry = vote
            .voters_hash
            .get_mut(juror)
            .ok_or(ConflictError::NotAJuror {
                index,
                juror: *juror,
            })?;
        if entry.result != VoteResult::Commit {
            return Err(ConflictError::NotCommitted {
                index,
                juror: *juror,
            });
        }
        if commit_hash(nonce, response_hash, juror) != entry.hash {
            return Err(ConflictError::RevealMismatch {
                index,
                juror: *juror,
            });
        }
        entry.result = result;
        self.votes.put_vote(&vote)?;

        tracing::debug!(vote_index = %index, juror = %juror, ?result, "accepted reveal");
        Ok(result)
    }

    pub fn delete_vote(&self, index: VoteIndex) -> Result<(), ConflictError> {
        self.votes.delete_vote(&index)?;
        Ok(())
    }
}

fn expect_state(vote: &ConflictVote, expected: VoteState) -> Result<(), ConflictError> {
    if vote.is_closing() {
        return Err(ConflictError::RoundClosing(vote.index));
    }
    if vote.vote_state != expected {
        return Err(ConflictError::WrongVoteState {
            index: vote.index,
            expected,
            actual: vote.vote_state,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatedSide;
    use arbiter_nullables::{NullMetaStore, NullVoteStore};
    use arbiter_types::ConflictSide;
    use std::collections::HashSet;

    fn juror(i: u8) -> AccountAddress {
        AccountAddress::new([0x40 + i; 20])
    }

    fn validated() -> ValidatedConflict {
        ValidatedConflict {
            client: AccountAddress::new([1; 20]),
            chain_id: "LAV1".into(),
            epoch: 100,
            api_url: "/block".into(),
            request_data: b"{}".to_vec(),
            request_block: 100,
            request_digest: [5; 32],
            first: ValidatedSide {
                side: ConflictSide::First,
                provider: AccountAddress::new([2; 20]),
                response_hash: [0xa0; 32],
            },
            second: ValidatedSide {
                side: ConflictSide::Second,
                provider: AccountAddress::new([3; 20]),
                response_hash: [0xb0; 32],
            },
        }
    }

    fn controller() -> VoteLifecycleController<NullVoteStore, NullMetaStore> {
        VoteLifecycleController::new(NullVoteStore::new(), NullMetaStore::new()).unwrap()
    }

    fn open(c: &VoteLifecycleController<NullVoteStore, NullMetaStore>, jurors: u8) -> VoteIndex {
        c.open_vote_round(&validated(), 200, |_| Ok((0..jurors).map(juror).collect()))
            .unwrap()
            .index
    }

    #[test]
    fn first_index_is_one() {
        let c = controller();
        assert_eq!(c.allocate_new_vote_index().unwrap(), VoteIndex::new(1));
        assert_eq!(c.allocate_new_vote_index().unwrap(), VoteIndex::new(2));
    }

    #[test]
    fn allocation_is_persisted() {
        let meta = NullMetaStore::new();
        let c = VoteLifecycleController::new(NullVoteStore::new(), meta).unwrap();
        c.allocate_new_vote_index().unwrap();
        c.allocate_new_vote_index().unwrap();
        assert_eq!(c.meta.last_vote_index().unwrap(), 2);
    }

    #[test]
    fn restored_counter_continues() {
        let meta = NullMetaStore::new();
        meta.set_last_vote_index(41).unwrap();
        let c = VoteLifecycleController::new(NullVoteStore::new(), meta).unwrap();
        assert_eq!(c.allocate_new_vote_index().unwrap(), VoteIndex::new(42));
    }

    #[test]
    fn open_index_is_skipped() {
        let votes = NullVoteStore::new();
        let meta = NullMetaStore::new();
        let seeded = controller();
        let mut stale = seeded
            .open_vote_round(&validated(), 1, |_| Ok(vec![juror(0)]))
            .unwrap();
        stale.index = VoteIndex::new(1);
        votes.put_vote(&stale).unwrap();
        stale.index = VoteIndex::new(2);
        votes.put_vote(&stale).unwrap();

        let c = VoteLifecycleController::new(votes, meta).unwrap();
        assert_eq!(c.allocate_new_vote_index().unwrap(), VoteIndex::new(3));
    }

    #[test]
    fn allocations_are_distinct() {
        let c = controller();
        let indices: HashSet<VoteIndex> = (0..100)
            .map(|_| c.allocate_new_vote_index().unwrap())
            .collect();
        assert_eq!(indices.len(), 100);
    }

    #[test]
    fn round_opens_with_every_juror_at_no_vote() {
        let c = controller();
        let index = open(&c, 3);
        let vote = c.get_vote(index).unwrap();
        assert_eq!(vote.vote_state, VoteState::StateCommit);
        assert_eq!(vote.jury_size(), 3);
        assert!(vote.voters_hash.values().all(|v| *v == Vote::no_vote()));
        assert_eq!(vote.first_provider.account, AccountAddress::new([2; 20]));
        assert_eq!(vote.vote_start_block, 200);
    }

    #[test]
    fn empty_jury_is_rejected_and_nothing_stored() {
        let c = controller();
        let err = c.open_vote_round(&validated(), 1, |_| Ok(vec![])).unwrap_err();
        assert!(matches!(err, ConflictError::EmptyJury { epoch: 100, .. }));
        assert!(c.votes().is_empty());
    }

    #[test]
    fn failed_write_opens_no_round() {
        let c = controller();
        c.votes().set_fail_writes(true);
        let err = c
            .open_vote_round(&validated(), 1, |_| Ok(vec![juror(0)]))
            .unwrap_err();
        assert!(matches!(err, ConflictError::Store(_)));
        assert!(c.votes().is_empty());
    }

    #[test]
    fn failed_write_leaves_commit_unrecorded() {
        let c = controller();
        let index = open(&c, 2);
        c.votes().set_fail_writes(true);
        assert!(matches!(
            c.submit_commit(index, &juror(0), [7; 32]),
            Err(ConflictError::Store(_))
        ));

        c.votes().set_fail_writes(false);
        let vote = c.get_vote(index).unwrap();
        assert_eq!(vote.voters_hash[&juror(0)], Vote::no_vote());
        c.submit_commit(index, &juror(0), [7; 32]).unwrap();
    }

    #[test]
    fn closing_round_accepts_no_votes() {
        let c = controller();
        let index = open(&c, 2);
        c.submit_commit(index, &juror(0), commit_hash(1, &[0xa0; 32], &juror(0)))
            .unwrap();
        c.advance_to_reveal(index).unwrap();

        let mut vote = c.get_vote(index).unwrap();
        vote.close_progress = Some(Default::default());
        c.votes().put_vote(&vote).unwrap();

        assert!(matches!(
            c.submit_reveal(index, &juror(0), 1, &[0xa0; 32]),
            Err(ConflictError::RoundClosing(i)) if i == index
        ));
        assert!(matches!(
            c.advance_to_reveal(index),
            Err(ConflictError::RoundClosing(_))
        ));
    }

    #[test]
    fn commit_records_hash() {
        let c = controller();
        let index = open(&c, 2);
        c.submit_commit(index, &juror(0), [7; 32]).unwrap();

        let vote = c.get_vote(index).unwrap();
        assert_eq!(
            vote.voters_hash[&juror(0)],
            Vote {
                hash: [7; 32],
                result: VoteResult::Commit
            }
        );
        assert_eq!(vote.voters_hash[&juror(1)], Vote::no_vote());
    }

    #[test]
    fn second_commit_rejected_and_first_preserved() {
        let c = controller();
        let index = open(&c, 2);
        c.submit_commit(index, &juror(0), [7; 32]).unwrap();
        let err = c.submit_commit(index, &juror(0), [8; 32]).unwrap_err();
        assert!(matches!(err, ConflictError::AlreadyCommitted { .. }));

        let stored = &c.get_vote(index).unwrap().voters_hash[&juror(0)];
        assert_eq!(stored.hash, [7; 32]);
        assert_eq!(stored.result, VoteResult::Commit);
    }

    #[test]
    fn commit_errors() {
        let c = controller();
        assert!(matches!(
            c.submit_commit(VoteIndex::new(9), &juror(0), [1; 32]),
            Err(ConflictError::UnknownVote(_))
        ));

        let index = open(&c, 1);
        assert!(matches!(
            c.submit_commit(index, &juror(5), [1; 32]),
            Err(ConflictError::NotAJuror { .. })
        ));

        c.advance_to_reveal(index).unwrap();
        assert!(matches!(
            c.submit_commit(index, &juror(0), [1; 32]),
            Err(ConflictError::WrongVoteState {
                expected: VoteState::StateCommit,
                actual: VoteState::StateReveal,
                ..
            })
        ));
    }

    #[test]
    fn advance_twice_is_wrong_state() {
        let c = controller();
        let index = open(&c, 1);
        c.advance_to_reveal(index).unwrap();
        assert!(matches!(
            c.advance_to_reveal(index),
            Err(ConflictError::WrongVoteState { .. })
        ));
    }

    #[test]
    fn reveal_classifies_response() {
        let c = controller();
        let index = open(&c, 3);
        let choices = [[0xa0; 32], [0xb0; 32], [0xcc; 32]];
        for (i, choice) in choices.iter().enumerate() {
            let j = juror(i as u8);
            c.submit_commit(index, &j, commit_hash(i as u64, choice, &j)).unwrap();
        }
        c.advance_to_reveal(index).unwrap();

        let results: Vec<VoteResult> = choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                c.submit_reveal(index, &juror(i as u8), i as u64, choice)
                    .unwrap()
            })
            .collect();
        assert_eq!(
            results,
            vec![VoteResult::Provider0, VoteResult::Provider1, VoteResult::None]
        );
        assert_eq!(
            c.get_vote(index).unwrap().voters_hash[&juror(1)].result,
            VoteResult::Provider1
        );
    }

    #[test]
    fn reveal_must_match_commit() {
        let c = controller();
        let index = open(&c, 1);
        let j = juror(0);
        c.submit_commit(index, &j, commit_hash(9, &[0xa0; 32], &j)).unwrap();
        c.advance_to_reveal(index).unwrap();

        assert!(matches!(
            c.submit_reveal(index, &j, 9, &[0xb0; 32]),
            Err(ConflictError::RevealMismatch { .. })
        ));
        assert!(matches!(
            c.submit_reveal(index, &j, 10, &[0xa0; 32]),
            Err(ConflictError::RevealMismatch { .. })
        ));
        c.submit_reveal(index, &j, 9, &[0xa0; 32]).unwrap();
        assert!(matches!(
            c.submit_reveal(index, &j, 9, &[0xa0; 32]),
            Err(ConflictError::NotCommitted { .. })
        ));
    }

    #[test]
    fn reveal_before_reveal_phase_is_wrong_state() {
        let c = controller();
        let index = open(&c, 1);
        assert!(matches!(
            c.submit_reveal(index, &juror(0), 1, &[0xa0; 32]),
            Err(ConflictError::WrongVoteState { .. })
        ));
    }

    #[test]
    fn reveal_without_commit_rejected() {
        let c = controller();
        let index = open(&c, 2);
        c.advance_to_reveal(index).unwrap();
        assert!(matches!(
            c.submit_reveal(index, &juror(1), 1, &[0xa0; 32]),
            Err(ConflictError::NotCommitted { .. })
        ));
    }
}
