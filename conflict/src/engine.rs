//! Conflict engine: connects validation, jury selection, the vote lifecycle
//! and the tally into the interface the host node drives.

use arbiter_crypto::SignatureAttestor;
use arbiter_store::{MetaStore, SlashingLedger, StakeRegistry, VoteStore};
use arbiter_types::{
    AccountAddress, ConflictParams, ConflictVote, FinalizationConflict, Hash32, ResponseConflict,
    VoteIndex, VoteResult,
};
use serde::{Deserialize, Serialize};

use crate::jury::JurySelector;
use crate::lifecycle::VoteLifecycleController;
use crate::punishment::{punish_provider_directly, Settlement};
use crate::tally::{TallyOutcome, VoteTallyEngine};
use crate::validator::ConflictValidator;
use crate::ConflictError;

/// A conflict report as submitted by a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictReport {
    /// Two providers answered the same request differently.
    Response(ResponseConflict),
    /// One provider answered the same request differently twice.
    SameProvider(ResponseConflict),
    /// One provider acknowledged two hashes for the same final block.
    Finalization(FinalizationConflict),
}

impl ConflictReport {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Response(_) => "response",
            Self::SameProvider(_) => "same_provider",
            Self::Finalization(_) => "finalization",
        }
    }
}

/// Why a provider was punished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PunishmentReason {
    /// Found at fault by a jury.
    JuryVerdict,
    /// Signed two different responses to one request.
    SameProviderConflict,
    /// Acknowledged two different hashes for one final block.
    FinalizationConflict,
}

/// Events emitted by the engine for the node to process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictEvent {
    /// A jury vote was opened for a response conflict.
    VoteOpened {
        index: VoteIndex,
        chain_id: String,
        first_provider: AccountAddress,
        second_provider: AccountAddress,
        jurors: Vec<AccountAddress>,
    },
    /// A vote round was tallied, settled and removed.
    VoteClosed { outcome: TallyOutcome },
    /// A provider was punished.
    ///
    /// After a jury verdict the settlement holds this provider's penalty
    /// only; the pool split is reported once on [`ConflictEvent::VoteClosed`].
    ProviderPunished {
        provider: AccountAddress,
        reason: PunishmentReason,
        settlement: Settlement,
    },
}

/// The engine ties together every conflict subsystem.
pub struct ConflictEngine<V, M, R, L, A> {
    params: ConflictParams,
    lifecycle: VoteLifecycleController<V, M>,
    tally: VoteTallyEngine,
    jury: JurySelector,
    registry: R,
    ledger: L,
    attestor: A,
}

impl<V, M, R, L, A> ConflictEngine<V, M, R, L, A>
where
    V: VoteStore,
    M: MetaStore,
    R: StakeRegistry,
    L: SlashingLedger,
    A: SignatureAttestor,
{
    pub fn new(
        params: ConflictParams,
        votes: V,
        meta: M,
        registry: R,
        ledger: L,
        attestor: A,
    ) -> Result<Self, ConflictError> {
        params.validate()?;
        Ok(Self {
            tally: VoteTallyEngine::new(params.clone()),
            params,
            lifecycle: VoteLifecycleController::new(votes, meta)?,
            jury: JurySelector,
            registry,
            ledger,
            attestor,
        })
    }

    pub fn params(&self) -> &ConflictParams {
        &self.params
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn lifecycle(&self) -> &VoteLifecycleController<V, M> {
        &self.lifecycle
    }

    /// Validate a report and act on it.
    ///
    /// A response conflict opens a jury vote starting at `current_block`.
    /// Reports against a single provider are settled immediately.
    pub fn submit_conflict_report(
        &self,
        report: &ConflictReport,
        client: &AccountAddress,
        current_block: u64,
    ) -> Result<Vec<ConflictEvent>, ConflictError> {
        let result = self.handle_report(report, client, current_block);
        if let Err(e) = &result {
            tracing::warn!(kind = report.kind(), client = %client, error = %e, "rejected conflict report");
        }
        result
    }

    fn handle_report(
        &self,
        report: &ConflictReport,
        client: &AccountAddress,
        current_block: u64,
    ) -> Result<Vec<ConflictEvent>, ConflictError> {
        let validator = ConflictValidator::new(&self.registry, &self.attestor);
        match report {
            ConflictReport::Response(conflict) => {
                let validated = validator.validate_response_conflict(conflict, client)?;
                let candidates: Vec<AccountAddress> = self
                    .registry
                    .provider_stake_entries(&validated.chain_id, validated.epoch)?
                    .into_iter()
                    .map(|(addr, _)| addr)
                    .collect();
                let exclude = [validated.first.provider, validated.second.provider, *client];
                let jury_size = self.params.jury_size as usize;

                let vote = self
                    .lifecycle
                    .open_vote_round(&validated, current_block, |index| {
                        let seed = JurySelector::seed(&validated.request_digest, index);
                        Ok(self.jury.select(&candidates, &exclude, &seed, jury_size))
                    })?;
                Ok(vec![ConflictEvent::VoteOpened {
                    index: vote.index,
                    chain_id: vote.chain_id,
                    first_provider: vote.first_provider.account,
                    second_provider: vote.second_provider.account,
                    jurors: vote.voters_hash.into_keys().collect(),
                }])
            }
            ConflictReport::SameProvider(conflict) => {
                let validated = validator.validate_same_provider_conflict(conflict, client)?;
                self.punish_directly(
                    &validated.first.provider,
                    client,
                    PunishmentReason::SameProviderConflict,
                )
            }
            ConflictReport::Finalization(conflict) => {
                let validated = validator.validate_finalization_conflict(conflict, client)?;
                tracing::info!(
                    provider = %validated.provider,
                    block_height = validated.block_height,
                    "provider acknowledged conflicting final block hashes"
                );
                self.punish_directly(
                    &validated.provider,
                    client,
                    PunishmentReason::FinalizationConflict,
                )
            }
        }
    }

    fn punish_directly(
        &self,
        provider: &AccountAddress,
        client: &AccountAddress,
        reason: PunishmentReason,
    ) -> Result<Vec<ConflictEvent>, ConflictError> {
        let settlement = punish_provider_directly(provider, client, &self.params, &self.ledger)?;
        tracing::info!(provider = %provider, ?reason, slashed = %settlement.slashed, "punished provider");
        Ok(vec![ConflictEvent::ProviderPunished {
            provider: *provider,
            reason,
            settlement,
        }])
    }

    pub fn submit_commit(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        hash: Hash32,
    ) -> Result<(), ConflictError> {
        self.lifecycle.submit_commit(index, juror, hash)
    }

    pub fn advance_to_reveal(&self, index: VoteIndex) -> Result<(), ConflictError> {
        self.lifecycle.advance_to_reveal(index)
    }

    pub fn submit_reveal(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        nonce: u64,
        response_hash: &Hash32,
    ) -> Result<VoteResult, ConflictError> {
        self.lifecycle
            .submit_reveal(index, juror, nonce, response_hash)
    }

    /// Tally and settle a round, then remove it.
    pub fn close_vote_round(&self, index: VoteIndex) -> Result<Vec<ConflictEvent>, ConflictError> {
        let outcome = self
            .tally
            .close_vote(self.lifecycle.votes(), &self.ledger, index)?;

        let mut events: Vec<ConflictEvent> = outcome
            .decision
            .faulty_providers
            .iter()
            .map(|provider| ConflictEvent::ProviderPunished {
                provider: *provider,
                reason: PunishmentReason::JuryVerdict,
                settlement: outcome.settlement.for_account(provider),
            })
            .collect();
        tracing::info!(vote_index = %index, verdict = ?outcome.decision.verdict, "closed vote round");
        events.push(ConflictEvent::VoteClosed { outcome });
        Ok(events)
    }

    pub fn vote(&self, index: VoteIndex) -> Result<ConflictVote, ConflictError> {
        self.lifecycle.get_vote(index)
    }

    /// Every round still awaiting its tally.
    pub fn open_votes(&self) -> Result<Vec<ConflictVote>, ConflictError> {
        Ok(self.lifecycle.votes().iter_votes()?)
    }
}
