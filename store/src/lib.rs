//! Abstract storage and ledger interfaces consumed by the conflict engine.
//!
//! Every backend (LMDB, in-memory for testing) implements these traits.
//! The conflict engine depends only on the traits.

pub mod error;
pub mod meta;
pub mod registry;
pub mod slashing;
pub mod vote;

pub use error::StoreError;
pub use meta::MetaStore;
pub use registry::StakeRegistry;
pub use slashing::{JailTerm, SlashingLedger};
pub use vote::VoteStore;
