//! Fundamental types for the relay conflict arbiter.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, signed relay messages, conflict reports, vote rounds,
//! stake entries and the tunable conflict parameters.

pub mod address;
pub mod error;
pub mod keys;
pub mod params;
pub mod relay;
pub mod stake;
pub mod vote;

pub use address::AccountAddress;
pub use error::TypesError;
pub use keys::RecoverableSignature;
pub use params::ConflictParams;
pub use relay::{
    ConflictRelayData, ConflictSide, FinalizationConflict, RelayReply, RelayRequest,
    ResponseConflict,
};
pub use stake::StakeEntry;
pub use vote::{
    CloseProgress, ConflictVote, ProviderResponse, PunishedAccount, Vote, VoteIndex, VoteResult,
    VoteState,
};

/// A 32-byte Blake2b digest.
pub type Hash32 = [u8; 32];
