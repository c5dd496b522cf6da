use arbiter_crypto::AttestationError;
use arbiter_store::StoreError;
use arbiter_types::{AccountAddress, ConflictSide, TypesError, VoteIndex, VoteState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("requests disagree on {field}: first {first}, second {second}")]
    MismatchedRequest {
        field: &'static str,
        first: String,
        second: String,
    },

    #[error("{side} request is not signed by client {client}: {reason}")]
    InvalidClientSignature {
        side: ConflictSide,
        client: AccountAddress,
        reason: String,
    },

    #[error("client {client} has no stake on {chain_id} at epoch {epoch}")]
    NoClientStake {
        client: AccountAddress,
        chain_id: String,
        epoch: u64,
    },

    #[error("{side} reply signature is invalid: {reason}")]
    InvalidProviderSignature { side: ConflictSide, reason: String },

    #[error("{side} provider {provider} has no stake on {chain_id} at epoch {epoch}")]
    NoProviderStake {
        side: ConflictSide,
        provider: AccountAddress,
        chain_id: String,
        epoch: u64,
    },

    #[error("{side} finalization ack recovers to {found}, reply was signed by {provider}")]
    ProviderIdentityMismatch {
        side: ConflictSide,
        provider: AccountAddress,
        found: String,
    },

    #[error("{side} request block {request_block} is not final at latest block {latest_block}")]
    NotFinalized {
        side: ConflictSide,
        request_block: i64,
        latest_block: i64,
    },

    #[error("replies are identical (response hash {response_hash})")]
    NoConflict { response_hash: String },

    #[error("both sides were served by provider {provider}")]
    SameProvider { provider: AccountAddress },

    #[error("sides were served by different providers: {first} and {second}")]
    DifferentProviders {
        first: AccountAddress,
        second: AccountAddress,
    },

    #[error("no finalized block height with diverging hashes (latest blocks {first_latest} and {second_latest})")]
    NoFinalizationConflict {
        first_latest: i64,
        second_latest: i64,
    },

    #[error("no eligible jurors on {chain_id} at epoch {epoch}")]
    EmptyJury { chain_id: String, epoch: u64 },

    #[error("unknown vote {0}")]
    UnknownVote(VoteIndex),

    #[error("vote {index} is in {actual:?}, expected {expected:?}")]
    WrongVoteState {
        index: VoteIndex,
        expected: VoteState,
        actual: VoteState,
    },

    #[error("vote {0} is being closed")]
    RoundClosing(VoteIndex),

    #[error("{juror} is not a juror of vote {index}")]
    NotAJuror {
        index: VoteIndex,
        juror: AccountAddress,
    },

    #[error("{juror} already committed in vote {index}")]
    AlreadyCommitted {
        index: VoteIndex,
        juror: AccountAddress,
    },

    #[error("{juror} has no unrevealed commit in vote {index}")]
    NotCommitted {
        index: VoteIndex,
        juror: AccountAddress,
    },

    #[error("reveal from {juror} does not match its commit in vote {index}")]
    RevealMismatch {
        index: VoteIndex,
        juror: AccountAddress,
    },

    #[error("invalid parameters: {0}")]
    Params(#[from] TypesError),

    #[error("attestation error: {0}")]
    Attestation(#[from] AttestationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
