//! Relay conflict arbitration.
//!
//! When two providers return conflicting signed responses to the same client
//! request, the engine
//! - validates that the conflict is genuine ([`validator`]),
//! - opens a commit/reveal vote among a jury of staked providers ([`jury`], [`lifecycle`]),
//! - tallies the vote and settles punishments and rewards ([`tally`], [`punishment`]).
//!
//! [`ConflictEngine`] wires these together over the storage, registry and
//! ledger traits of `arbiter-store`.

pub mod engine;
pub mod error;
pub mod jury;
pub mod lifecycle;
pub mod punishment;
pub mod tally;
pub mod validator;

#[cfg(test)]
mod fixtures;

pub use engine::{ConflictEngine, ConflictEvent, ConflictReport, PunishmentReason};
pub use error::ConflictError;
pub use jury::JurySelector;
pub use lifecycle::{VoteIndexAllocator, VoteLifecycleController};
pub use punishment::{
    apply_decision, punish_provider_directly, split_pool, Penalty, RewardSplit, Settlement,
};
pub use tally::{below_threshold, decide, tally, Decision, TallyOutcome, Verdict, VoteTally, VoteTallyEngine};
pub use validator::{
    ConflictValidator, ValidatedConflict, ValidatedFinalizationConflict, ValidatedSide,
};
