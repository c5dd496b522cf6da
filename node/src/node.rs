//! The arbiter node: a conflict engine over LMDB storage.

use arbiter_conflict::{ConflictEngine, ConflictEvent, ConflictReport};
use arbiter_crypto::SignatureAttestor;
use arbiter_store::{SlashingLedger, StakeRegistry};
use arbiter_store_lmdb::{LmdbEnvironment, LmdbMetaStore, LmdbVoteStore};
use arbiter_types::{AccountAddress, ConflictVote, Hash32, VoteIndex, VoteResult};

use crate::journal::EventJournal;
use crate::tracing_spans::{conflict_report_span, juror_span, round_span};
use crate::{NodeConfig, NodeError};

type Engine<R, L, A> = ConflictEngine<LmdbVoteStore, LmdbMetaStore, R, L, A>;

/// Hosts a [`ConflictEngine`] whose rounds and vote index counter live in LMDB.
///
/// The stake registry, slashing ledger and signature attestor belong to the
/// host chain and are supplied by the caller.
pub struct ArbiterNode<R, L, A> {
    config: NodeConfig,
    engine: Engine<R, L, A>,
    journal: Option<EventJournal>,
    _env: LmdbEnvironment,
}

impl<R, L, A> ArbiterNode<R, L, A>
where
    R: StakeRegistry,
    L: SlashingLedger,
    A: SignatureAttestor,
{
    /// Open (or create) the node's data directory and build the engine.
    pub fn open(config: NodeConfig, registry: R, ledger: L, attestor: A) -> Result<Self, NodeError> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let env = LmdbEnvironment::open(&config.lmdb_path(), config.lmdb_map_size)?;
        let engine = ConflictEngine::new(
            config.conflict.clone(),
            env.vote_store(),
            env.meta_store(),
            registry,
            ledger,
            attestor,
        )?;
        let journal = if config.journal_events {
            Some(EventJournal::open(config.journal_path())?)
        } else {
            None
        };

        let open_rounds = engine.open_votes()?.len();
        tracing::info!(
            data_dir = %config.data_dir.display(),
            open_rounds,
            last_vote_index = engine.lifecycle().last_allocated_index(),
            "arbiter node started"
        );

        Ok(Self {
            config,
            engine,
            journal,
            _env: env,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine<R, L, A> {
        &self.engine
    }

    pub fn submit_conflict_report(
        &self,
        report: &ConflictReport,
        client: &AccountAddress,
        current_block: u64,
    ) -> Result<Vec<ConflictEvent>, NodeError> {
        let _span = conflict_report_span(report.kind(), client).entered();
        let events = self
            .engine
            .submit_conflict_report(report, client, current_block)?;
        self.record(&events);
        Ok(events)
    }

    pub fn submit_commit(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        hash: Hash32,
    ) -> Result<(), NodeError> {
        let _span = juror_span("commit", index, juror).entered();
        Ok(self.engine.submit_commit(index, juror, hash)?)
    }

    pub fn advance_to_reveal(&self, index: VoteIndex) -> Result<(), NodeError> {
        let _span = round_span("advance_to_reveal", index).entered();
        Ok(self.engine.advance_to_reveal(index)?)
    }

    pub fn submit_reveal(
        &self,
        index: VoteIndex,
        juror: &AccountAddress,
        nonce: u64,
        response_hash: &Hash32,
    ) -> Result<VoteResult, NodeError> {
        let _span = juror_span("reveal", index, juror).entered();
        Ok(self
            .engine
            .submit_reveal(index, juror, nonce, response_hash)?)
    }

    pub fn close_vote_round(&self, index: VoteIndex) -> Result<Vec<ConflictEvent>, NodeError> {
        let _span = round_span("close", index).entered();
        let events = self.engine.close_vote_round(index)?;
        self.record(&events);
        Ok(events)
    }

    pub fn open_votes(&self) -> Result<Vec<ConflictVote>, NodeError> {
        Ok(self.engine.open_votes()?)
    }

    /// Journal events the engine has already committed. A journal failure
    /// cannot undo them, so it is logged rather than returned.
    fn record(&self, events: &[ConflictEvent]) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = journal.append(events) {
            tracing::warn!(
                path = %journal.path().display(),
                events = events.len(),
                error = %e,
                "failed to journal committed events"
            );
        }
    }
}
