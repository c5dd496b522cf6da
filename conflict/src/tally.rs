//! Vote tally: bucket counts, majority decision and round close.

use arbiter_store::{SlashingLedger, VoteStore};
use arbiter_types::params::BPS_DENOMINATOR;
use arbiter_types::{AccountAddress, ConflictParams, ConflictVote, VoteIndex, VoteResult};
use serde::{Deserialize, Serialize};

use crate::punishment::{apply_decision, Settlement};
use crate::ConflictError;

/// Bucket counts for one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub provider0: u64,
    pub provider1: u64,
    /// Votes for neither provider, including jurors that never voted.
    pub none: u64,
    /// Every juror in the round.
    pub total: u64,
    pub provider0_voters: Vec<AccountAddress>,
    pub provider1_voters: Vec<AccountAddress>,
    /// Jurors that revealed a response matching neither provider.
    pub none_voters: Vec<AccountAddress>,
    /// Jurors that did not take part, always punishment candidates.
    pub non_voters: Vec<AccountAddress>,
}

/// Classify every juror's vote.
///
/// Jurors that never committed count towards `none` and are listed as
/// non-voters. A commit left unrevealed is treated the same way when
/// `punish_unrevealed` is set, otherwise it only counts towards `none`.
pub fn tally(round: &ConflictVote, punish_unrevealed: bool) -> VoteTally {
    let mut t = VoteTally {
        total: round.voters_hash.len() as u64,
        ..Default::default()
    };
    for (juror, vote) in &round.voters_hash {
        match vote.result {
            VoteResult::Provider0 => {
                t.provider0 += 1;
                t.provider0_voters.push(*juror);
            }
            VoteResult::Provider1 => {
                t.provider1 += 1;
                t.provider1_voters.push(*juror);
            }
            VoteResult::None => {
                t.none += 1;
                t.none_voters.push(*juror);
            }
            VoteResult::Commit if !punish_unrevealed => t.none += 1,
            VoteResult::Commit | VoteResult::NoVote => {
                t.none += 1;
                t.non_voters.push(*juror);
            }
        }
    }
    t
}

/// Which side the jury found correct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Provider 0 answered correctly, provider 1 is at fault.
    FirstProviderCorrect,
    /// Provider 1 answered correctly, provider 0 is at fault.
    SecondProviderCorrect,
    /// Neither answered correctly, both are at fault.
    NeitherCorrect,
}

/// The decision reached from a tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    /// Whether the deciding bucket reached the majority threshold.
    pub strong_majority: bool,
    /// Non-voting jurors to punish; empty without a strong majority.
    pub punished_jurors: Vec<AccountAddress>,
    pub faulty_providers: Vec<AccountAddress>,
    /// The provider found correct, if any.
    pub correct_provider: Option<AccountAddress>,
    /// Jurors that voted for the verdict.
    pub correct_voters: Vec<AccountAddress>,
}

impl Decision {
    /// Every account the decision punishes, jurors first.
    pub fn punishment_set(&self) -> Vec<AccountAddress> {
        self.punished_jurors
            .iter()
            .chain(&self.faulty_providers)
            .copied()
            .collect()
    }
}

/// `bucket / total < majority_bps / 10_000`, in exact integer arithmetic.
pub fn below_threshold(bucket: u64, total: u64, majority_bps: u32) -> bool {
    (bucket as u128) * (BPS_DENOMINATOR as u128) < (majority_bps as u128) * (total as u128)
}

/// Apply the bucket precedence rule.
///
/// Provider 0 wins only if it beats both other buckets. Failing that,
/// provider 1 wins if it beats the none bucket; it is not compared with
/// provider 0. Otherwise both providers are at fault.
pub fn decide(round: &ConflictVote, tally: &VoteTally, majority_bps: u32) -> Decision {
    let first = round.first_provider.account;
    let second = round.second_provider.account;

    let (verdict, bucket, faulty, correct_provider, correct_voters) =
        if tally.provider0 > tally.provider1 && tally.provider0 > tally.none {
            (
                Verdict::FirstProviderCorrect,
                tally.provider0,
                vec![second],
                Some(first),
                &tally.provider0_voters,
            )
        } else if tally.provider1 > tally.none {
            (
                Verdict::SecondProviderCorrect,
                tally.provider1,
                vec![first],
                Some(second),
                &tally.provider1_voters,
            )
        } else {
            (
                Verdict::NeitherCorrect,
                tally.none,
                vec![first, second],
                None,
                &tally.none_voters,
            )
        };

    let strong_majority = !below_threshold(bucket, tally.total, majority_bps);
    Decision {
        verdict,
        strong_majority,
        punished_jurors: if strong_majority {
            tally.non_voters.clone()
        } else {
            Vec::new()
        },
        faulty_providers: faulty,
        correct_provider,
        correct_voters: correct_voters.clone(),
    }
}

/// Everything that happened when a round closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyOutcome {
    pub index: VoteIndex,
    pub tally: VoteTally,
    pub decision: Decision,
    pub settlement: Settlement,
}

/// Closes rounds and settles them through the slashing ledger.
pub struct VoteTallyEngine {
    params: ConflictParams,
}

impl VoteTallyEngine {
    pub fn new(params: ConflictParams) -> Self {
        Self { params }
    }

    /// Tally a round, apply its punishments and rewards, then delete it.
    ///
    /// If any ledger call fails the error is returned and the round stays
    /// stored with the calls made so far, so closing it again finishes the
    /// settlement without repeating them.
    pub fn close_vote<V, L>(
        &self,
        votes: &V,
        ledger: &L,
        index: VoteIndex,
    ) -> Result<TallyOutcome, ConflictError>
    where
        V: VoteStore + ?Sized,
        L: SlashingLedger + ?Sized,
    {
        let mut round = votes
            .get_vote(&index)?
            .ok_or(ConflictError::UnknownVote(index))?;

        let tally = tally(&round, self.params.punish_unrevealed);
        let decision = decide(&round, &tally, self.params.majority_bps);
        tracing::info!(
            vote_index = %index,
            provider0 = tally.provider0,
            provider1 = tally.provider1,
            none = tally.none,
            total = tally.total,
            verdict = ?decision.verdict,
            strong_majority = decision.strong_majority,
            "tallied vote round"
        );

        let settlement = match apply_decision(votes, ledger, &mut round, &decision, &self.params) {
            Ok(settlement) => settlement,
            Err(e) => {
                tracing::warn!(vote_index = %index, error = %e, "punishment failed, keeping round");
                return Err(e);
            }
        };

        votes.delete_vote(&index)?;
        Ok(TallyOutcome {
            index,
            tally,
            decision,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_types::{ProviderResponse, Vote, VoteState};
    use std::collections::BTreeMap;
    use arbiter_types::VoteResult::{NoVote, None as NoneVote, Provider0, Provider1};

    const P0: AccountAddress = AccountAddress::new([0xa0; 20]);
    const P1: AccountAddress = AccountAddress::new([0xb0; 20]);

    fn juror(i: u8) -> AccountAddress {
        AccountAddress::new([0x40 + i; 20])
    }

    fn round_with(results: &[VoteResult]) -> ConflictVote {
        let voters_hash: BTreeMap<AccountAddress, Vote> = results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                (
                    juror(i as u8),
                    Vote {
                        hash: [i as u8; 32],
                        result: *result,
                    },
                )
            })
            .collect();
        ConflictVote {
            index: VoteIndex::new(1),
            client_address: AccountAddress::new([1; 20]),
            vote_start_block: 0,
            vote_state: VoteState::StateReveal,
            chain_id: "LAV1".into(),
            api_url: String::new(),
            request_data: Vec::new(),
            request_block: 100,
            first_provider: ProviderResponse {
                account: P0,
                response_hash: [0xa0; 32],
            },
            second_provider: ProviderResponse {
                account: P1,
                response_hash: [0xb0; 32],
            },
            voters_hash,
            close_progress: None,
        }
    }

    #[test]
    fn five_juror_majority_for_first_provider() {
        let round = round_with(&[Provider0, Provider0, Provider0, Provider1, NoVote]);
        let t = tally(&round, true);
        assert_eq!((t.provider0, t.provider1, t.none, t.total), (3, 1, 1, 5));

        let d = decide(&round, &t, 5_000);
        assert_eq!(d.verdict, Verdict::FirstProviderCorrect);
        assert!(d.strong_majority);
        assert_eq!(d.punishment_set(), vec![juror(4), P1]);
        assert_eq!(d.correct_provider, Some(P0));
    }

    #[test]
    fn four_juror_tie_with_non_voters_blames_both() {
        let round = round_with(&[Provider0, Provider0, NoVote, NoVote]);
        let t = tally(&round, true);
        assert_eq!((t.provider0, t.none), (2, 2));

        let d = decide(&round, &t, 5_000);
        assert_eq!(d.verdict, Verdict::NeitherCorrect);
        assert_eq!(d.punishment_set(), vec![juror(2), juror(3), P0, P1]);
        assert_eq!(d.correct_provider, None);
    }

    #[test]
    fn weak_majority_spares_non_voters() {
        let round = round_with(&[Provider1, Provider1, Provider0, NoneVote, NoVote]);
        let t = tally(&round, true);
        // provider1 only ties the none bucket, so neither provider wins.
        let d = decide(&round, &t, 5_000);
        assert_eq!(d.verdict, Verdict::NeitherCorrect);
        assert!(!d.strong_majority);
        assert!(d.punished_jurors.is_empty());
        assert_eq!(d.faulty_providers, vec![P0, P1]);
    }

    #[test]
    fn second_provider_branch_ignores_first_bucket() {
        // provider0 ties provider1, both beat none: provider 0 is blamed.
        let round = round_with(&[Provider0, Provider0, Provider1, Provider1, NoneVote]);
        let d = decide(&round, &tally(&round, true), 5_000);
        assert_eq!(d.verdict, Verdict::SecondProviderCorrect);
        assert_eq!(d.faulty_providers, vec![P0]);
        assert!(!d.strong_majority);
        assert_eq!(d.correct_voters, vec![juror(2), juror(3)]);
    }

    #[test]
    fn threshold_boundary_is_exact() {
        assert!(!below_threshold(1, 2, 5_000));
        assert!(below_threshold(1, 3, 5_000));
        assert!(!below_threshold(2, 3, 6_666));
        assert!(below_threshold(2, 3, 6_667));
    }

    #[test]
    fn unrevealed_commit_handling() {
        let round = round_with(&[Provider0, Provider0, VoteResult::Commit]);
        let punished = tally(&round, true);
        assert_eq!(punished.non_voters, vec![juror(2)]);
        assert_eq!(punished.none, 1);

        let spared = tally(&round, false);
        assert!(spared.non_voters.is_empty());
        assert_eq!(spared.none, 1);
    }

    #[test]
    fn tally_is_independent_of_insertion_order() {
        let a = round_with(&[Provider0, Provider1, NoVote, Provider0]);
        let mut b = a.clone();
        let entries: Vec<_> = b.voters_hash.clone().into_iter().rev().collect();
        b.voters_hash = entries.into_iter().collect();
        assert_eq!(decide(&a, &tally(&a, true), 5_000), decide(&b, &tally(&b, true), 5_000));
    }
}
