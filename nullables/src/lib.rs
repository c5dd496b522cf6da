//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the conflict engine consumes (vote storage, stake
//! registry, slashing ledger) is abstracted behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod ledger;
pub mod registry;
pub mod store;

pub use ledger::{LedgerCall, NullSlashingLedger};
pub use registry::NullStakeRegistry;
pub use store::{NullMetaStore, NullVoteStore};
