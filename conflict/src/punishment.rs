//! Punishment and reward settlement.
//!
//! After a round is decided this module drives the slashing ledger:
//! - Non-voting jurors: jailed, part of the stake bonded as bail, a smaller part slashed
//! - Faulty providers under a strong majority: jailed indefinitely and slashed
//! - Faulty providers without one: jailed for a fixed term, nothing slashed
//!
//! Everything slashed forms a pool that is split between the client, the
//! correct provider and the correct voters. What is left is burned.
//!
//! Each ledger call is recorded on the round as it completes, so a close
//! retried after a ledger failure never repeats a call.

use arbiter_store::{JailTerm, SlashingLedger, VoteStore};
use arbiter_types::params::BPS_DENOMINATOR;
use arbiter_types::{AccountAddress, CloseProgress, ConflictParams, ConflictVote};
use serde::{Deserialize, Serialize};

use crate::tally::Decision;
use crate::ConflictError;

/// How a slashed pool is divided.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    pub client: u128,
    pub provider: u128,
    /// Paid to each correct voter.
    pub per_voter: u128,
    pub burned: u128,
}

fn share(pool: u128, bps: u32) -> u128 {
    pool * bps as u128 / BPS_DENOMINATOR as u128
}

/// Divide `pool` by the configured shares.
///
/// The provider share is only paid when a provider was found correct, and
/// the voters' share is split evenly. Unpaid shares and rounding dust are
/// burned, so the parts always add up to `pool`.
pub fn split_pool(
    pool: u128,
    params: &ConflictParams,
    has_correct_provider: bool,
    correct_voters: usize,
) -> RewardSplit {
    let client = share(pool, params.client_reward_bps);
    let provider = if has_correct_provider {
        share(pool, params.provider_reward_bps)
    } else {
        0
    };
    let per_voter = match correct_voters {
        0 => 0,
        n => share(pool, params.voters_reward_bps) / n as u128,
    };
    let paid = client + provider + per_voter * correct_voters as u128;
    RewardSplit {
        client,
        provider,
        per_voter,
        burned: pool - paid,
    }
}

/// Punishment applied to a single account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub account: AccountAddress,
    pub term: JailTerm,
    pub bonded: u128,
    pub slashed: u128,
}

/// What the ledger did for one decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Every punished account, jurors first, in ledger call order.
    pub penalties: Vec<Penalty>,
    pub bonded: u128,
    pub slashed: u128,
    pub split: RewardSplit,
}

impl Settlement {
    pub fn penalty(&self, account: &AccountAddress) -> Option<&Penalty> {
        self.penalties.iter().find(|p| p.account == *account)
    }

    /// The part of this settlement that concerns `account`. The pool split
    /// is left at zero.
    pub fn for_account(&self, account: &AccountAddress) -> Settlement {
        let mut own = Settlement::default();
        if let Some(penalty) = self.penalty(account) {
            own.record(penalty.clone());
        }
        own
    }

    fn record(&mut self, penalty: Penalty) {
        self.bonded += penalty.bonded;
        self.slashed += penalty.slashed;
        self.penalties.push(penalty);
    }
}

/// Ledger progress plus the hook that persists it after each call.
struct Checkpoint<'a> {
    progress: CloseProgress,
    save: &'a mut dyn FnMut(&CloseProgress) -> Result<(), ConflictError>,
}

impl Checkpoint<'_> {
    fn update(&mut self, f: impl FnOnce(&mut CloseProgress)) -> Result<(), ConflictError> {
        f(&mut self.progress);
        (self.save)(&self.progress)
    }

    /// Jail, then optionally bond and slash, skipping calls already made.
    fn punish<L: SlashingLedger + ?Sized>(
        &mut self,
        ledger: &L,
        account: &AccountAddress,
        term: JailTerm,
        bond_bps: Option<u32>,
        slash_bps: Option<u32>,
    ) -> Result<Penalty, ConflictError> {
        if !self.progress.account(account).jailed {
            ledger.jail(account, term)?;
            self.update(|p| p.punished.entry(*account).or_default().jailed = true)?;
        }
        if let Some(bps) = bond_bps.filter(|_| self.progress.account(account).bonded.is_none()) {
            let amount = ledger.bond(account, bps)?;
            self.update(|p| p.punished.entry(*account).or_default().bonded = Some(amount))?;
        }
        if let Some(bps) = slash_bps.filter(|_| self.progress.account(account).slashed.is_none()) {
            let amount = ledger.slash(account, bps)?;
            self.update(|p| p.punished.entry(*account).or_default().slashed = Some(amount))?;
        }
        let done = self.progress.account(account);
        Ok(Penalty {
            account: *account,
            term,
            bonded: done.bonded.unwrap_or(0),
            slashed: done.slashed.unwrap_or(0),
        })
    }

    fn pay_out<L: SlashingLedger + ?Sized>(
        &mut self,
        ledger: &L,
        client: &AccountAddress,
        provider: Option<&AccountAddress>,
        voters: &[AccountAddress],
        split: &RewardSplit,
    ) -> Result<(), ConflictError> {
        let payees = std::iter::once((client, split.client))
            .chain(provider.map(|p| (p, split.provider)))
            .chain(voters.iter().map(|v| (v, split.per_voter)));
        for (payee, amount) in payees {
            if amount == 0 || self.progress.rewarded.contains(payee) {
                continue;
            }
            ledger.reward(payee, amount)?;
            self.update(|p| {
                p.rewarded.insert(*payee);
            })?;
        }
        if split.burned > 0 && !self.progress.burned {
            ledger.burn(split.burned)?;
            self.update(|p| p.burned = true)?;
        }
        Ok(())
    }
}

/// Apply a decision through the ledger. Stops at the first failing call.
///
/// Progress is written to the round in `votes` after every ledger call, so
/// calling this again for the same round only makes the calls still missing.
/// The first write also marks the round as closing.
pub fn apply_decision<V, L>(
    votes: &V,
    ledger: &L,
    round: &mut ConflictVote,
    decision: &Decision,
    params: &ConflictParams,
) -> Result<Settlement, ConflictError>
where
    V: VoteStore + ?Sized,
    L: SlashingLedger + ?Sized,
{
    let index = round.index;
    let client = round.client_address;
    let resumed = round.close_progress.is_some();
    let progress = round.close_progress.clone().unwrap_or_default();
    if resumed {
        tracing::info!(vote_index = %index, "resuming interrupted settlement");
    }

    let mut save = |progress: &CloseProgress| -> Result<(), ConflictError> {
        round.close_progress = Some(progress.clone());
        votes.put_vote(round)?;
        Ok(())
    };
    if !resumed {
        save(&progress)?;
    }
    let mut cp = Checkpoint {
        progress,
        save: &mut save,
    };

    let mut settlement = Settlement::default();
    for juror in &decision.punished_jurors {
        let penalty = cp.punish(
            ledger,
            juror,
            JailTerm::For(params.non_voter_jail_secs),
            Some(params.non_voter_bail_bps),
            Some(params.non_voter_slash_bps),
        )?;
        settlement.record(penalty);
        tracing::info!(vote_index = %index, juror = %juror, "punished non-voting juror");
    }

    for provider in &decision.faulty_providers {
        let penalty = if decision.strong_majority {
            cp.punish(
                ledger,
                provider,
                JailTerm::Indefinite,
                None,
                Some(params.faulty_provider_slash_bps),
            )?
        } else {
            let term = JailTerm::For(params.suspect_provider_jail_secs);
            cp.punish(ledger, provider, term, None, None)?
        };
        settlement.record(penalty);
        tracing::info!(
            vote_index = %index,
            provider = %provider,
            strong_majority = decision.strong_majority,
            "punished faulty provider"
        );
    }

    settlement.split = split_pool(
        settlement.slashed,
        params,
        decision.correct_provider.is_some(),
        decision.correct_voters.len(),
    );
    cp.pay_out(
        ledger,
        &client,
        decision.correct_provider.as_ref(),
        &decision.correct_voters,
        &settlement.split,
    )?;
    Ok(settlement)
}

/// Punish a provider caught contradicting itself. No jury is involved.
pub fn punish_provider_directly<L: SlashingLedger + ?Sized>(
    provider: &AccountAddress,
    client: &AccountAddress,
    params: &ConflictParams,
    ledger: &L,
) -> Result<Settlement, ConflictError> {
    let mut save = |_: &CloseProgress| -> Result<(), ConflictError> { Ok(()) };
    let mut cp = Checkpoint {
        progress: CloseProgress::default(),
        save: &mut save,
    };
    let mut settlement = Settlement::default();
    settlement.record(cp.punish(
        ledger,
        provider,
        JailTerm::Indefinite,
        None,
        Some(params.faulty_provider_slash_bps),
    )?);
    settlement.split = split_pool(settlement.slashed, params, false, 0);
    cp.pay_out(ledger, client, None, &[], &settlement.split)?;
    Ok(settlement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::Verdict;
    use arbiter_nullables::{LedgerCall, NullSlashingLedger, NullVoteStore};
    use arbiter_types::{ProviderResponse, VoteIndex, VoteState};
    use std::collections::BTreeMap;

    const CLIENT: AccountAddress = AccountAddress::new([1; 20]);
    const P0: AccountAddress = AccountAddress::new([0xa0; 20]);
    const P1: AccountAddress = AccountAddress::new([0xb0; 20]);
    const J0: AccountAddress = AccountAddress::new([0x40; 20]);
    const J1: AccountAddress = AccountAddress::new([0x41; 20]);
    const J2: AccountAddress = AccountAddress::new([0x42; 20]);

    fn round() -> ConflictVote {
        ConflictVote {
            index: VoteIndex::new(3),
            client_address: CLIENT,
            vote_start_block: 0,
            vote_state: VoteState::StateReveal,
            chain_id: "LAV1".into(),
            api_url: String::new(),
            request_data: Vec::new(),
            request_block: 0,
            first_provider: ProviderResponse {
                account: P0,
                response_hash: [0; 32],
            },
            second_provider: ProviderResponse {
                account: P1,
                response_hash: [1; 32],
            },
            voters_hash: BTreeMap::new(),
            close_progress: None,
        }
    }

    fn stored_round(votes: &NullVoteStore) -> ConflictVote {
        let round = round();
        votes.put_vote(&round).unwrap();
        round
    }

    fn strong_decision() -> Decision {
        Decision {
            verdict: Verdict::FirstProviderCorrect,
            strong_majority: true,
            punished_jurors: vec![J2],
            faulty_providers: vec![P1],
            correct_provider: Some(P0),
            correct_voters: vec![J0, J1],
        }
    }

    fn slashes_of(ledger: &NullSlashingLedger, account: AccountAddress) -> usize {
        ledger
            .calls()
            .iter()
            .filter(|c| matches!(c, LedgerCall::Slash(a, _) if *a == account))
            .count()
    }

    fn ledger() -> NullSlashingLedger {
        let ledger = NullSlashingLedger::new();
        for (addr, stake) in [(P0, 10_000), (P1, 10_000), (J0, 1_000), (J1, 1_000), (J2, 1_000)] {
            ledger.set_stake(addr, stake);
        }
        ledger
    }

    #[test]
    fn split_without_correct_provider_burns_its_share() {
        let params = ConflictParams::default();
        let split = split_pool(10_000, &params, false, 2);
        assert_eq!(split.client, 5_000);
        assert_eq!(split.provider, 0);
        assert_eq!(split.per_voter, 1_000);
        assert_eq!(split.burned, 3_000);
    }

    #[test]
    fn split_dust_is_burned() {
        let params = ConflictParams::default();
        let split = split_pool(101, &params, true, 3);
        // 50 + 10 + 3 * 6 = 78 paid
        assert_eq!((split.client, split.provider, split.per_voter), (50, 10, 6));
        assert_eq!(split.burned, 23);
    }

    #[test]
    fn strong_majority_settlement() {
        let ledger = ledger();
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        let params = ConflictParams::default();
        let s = apply_decision(&votes, &ledger, &mut round, &strong_decision(), &params).unwrap();

        // 5% of the juror's 1_000 plus all of P1's 10_000.
        assert_eq!(s.slashed, 10_050);
        assert_eq!(s.bonded, 200);
        assert_eq!(
            s.penalties,
            vec![
                Penalty {
                    account: J2,
                    term: JailTerm::For(params.non_voter_jail_secs),
                    bonded: 200,
                    slashed: 50,
                },
                Penalty {
                    account: P1,
                    term: JailTerm::Indefinite,
                    bonded: 0,
                    slashed: 10_000,
                },
            ]
        );
        assert_eq!(s.penalty(&P1).map(|p| p.slashed), Some(10_000));
        let own = s.for_account(&J2);
        assert_eq!((own.bonded, own.slashed), (200, 50));
        assert_eq!(own.split, RewardSplit::default());
        assert_eq!(ledger.rewarded(&CLIENT), 5_025);
        assert_eq!(ledger.rewarded(&P0), 1_005);
        assert_eq!(ledger.rewarded(&J0), 1_005);
        assert_eq!(ledger.rewarded(&J1), 1_005);
        assert_eq!(ledger.burned(), 10_050 - 5_025 - 1_005 * 3);
        assert_eq!(ledger.stake_of(&P1), 0);

        let stored = votes.get_vote(&round.index).unwrap().unwrap();
        let progress = stored.close_progress.unwrap();
        assert!(progress.burned);
        assert_eq!(progress.account(&P1).slashed, Some(10_000));
        assert_eq!(progress.rewarded.len(), 4);
    }

    #[test]
    fn retry_after_ledger_failure_skips_completed_calls() {
        let ledger = ledger();
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        let params = ConflictParams::default();
        let decision = strong_decision();

        ledger.fail_on(P1);
        assert!(apply_decision(&votes, &ledger, &mut round, &decision, &params).is_err());
        assert_eq!(slashes_of(&ledger, J2), 1);
        assert!(votes.get_vote(&round.index).unwrap().unwrap().is_closing());

        ledger.clear_failure();
        let mut reloaded = votes.get_vote(&round.index).unwrap().unwrap();
        let s = apply_decision(&votes, &ledger, &mut reloaded, &decision, &params).unwrap();

        assert_eq!(slashes_of(&ledger, J2), 1);
        assert_eq!(slashes_of(&ledger, P1), 1);
        assert_eq!(ledger.jailed(), vec![J2, P1]);
        assert_eq!(ledger.stake_of(&J2), 950);
        // The settlement still reports the juror's slash from the first attempt.
        assert_eq!(s.slashed, 10_050);
        assert_eq!(ledger.rewarded(&CLIENT), 5_025);
    }

    #[test]
    fn completed_settlement_makes_no_further_calls() {
        let ledger = ledger();
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        let params = ConflictParams::default();
        let first = apply_decision(&votes, &ledger, &mut round, &strong_decision(), &params).unwrap();
        let calls = ledger.calls().len();

        let mut reloaded = votes.get_vote(&round.index).unwrap().unwrap();
        let again = apply_decision(&votes, &ledger, &mut reloaded, &strong_decision(), &params).unwrap();
        assert_eq!(ledger.calls().len(), calls);
        assert_eq!(again, first);
    }

    #[test]
    fn unsaved_progress_prevents_ledger_calls() {
        let ledger = ledger();
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        votes.set_fail_writes(true);

        let err = apply_decision(&votes, &ledger, &mut round, &strong_decision(), &ConflictParams::default())
            .unwrap_err();
        assert!(matches!(err, ConflictError::Store(_)));
        assert!(ledger.calls().is_empty());
    }

    #[test]
    fn weak_majority_jails_without_slashing() {
        let ledger = ledger();
        let params = ConflictParams::default();
        let decision = Decision {
            verdict: Verdict::NeitherCorrect,
            strong_majority: false,
            punished_jurors: vec![],
            faulty_providers: vec![P0, P1],
            correct_provider: None,
            correct_voters: vec![],
        };
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        let s = apply_decision(&votes, &ledger, &mut round, &decision, &params).unwrap();
        assert_eq!(s.slashed, 0);
        assert_eq!(
            ledger.calls(),
            vec![
                LedgerCall::Jail(P0, JailTerm::For(params.suspect_provider_jail_secs)),
                LedgerCall::Jail(P1, JailTerm::For(params.suspect_provider_jail_secs)),
            ]
        );
    }

    #[test]
    fn direct_punishment_pays_client_and_burns_rest() {
        let ledger = ledger();
        let params = ConflictParams::default();
        let s = punish_provider_directly(&P0, &CLIENT, &params, &ledger).unwrap();
        assert_eq!(s.slashed, 10_000);
        assert_eq!(s.penalties.len(), 1);
        assert_eq!(s.penalties[0].term, JailTerm::Indefinite);
        assert_eq!(ledger.rewarded(&CLIENT), 5_000);
        assert_eq!(ledger.burned(), 5_000);
        assert_eq!(ledger.jailed(), vec![P0]);
    }

    #[test]
    fn ledger_failure_stops_settlement() {
        let ledger = ledger();
        ledger.fail_on(P1);
        let decision = Decision {
            verdict: Verdict::FirstProviderCorrect,
            strong_majority: true,
            punished_jurors: vec![],
            faulty_providers: vec![P1],
            correct_provider: Some(P0),
            correct_voters: vec![],
        };
        let votes = NullVoteStore::new();
        let mut round = stored_round(&votes);
        let err = apply_decision(&votes, &ledger, &mut round, &decision, &ConflictParams::default())
            .unwrap_err();
        assert!(matches!(err, ConflictError::Store(_)));
        assert!(ledger.calls().is_empty());
    }
}
