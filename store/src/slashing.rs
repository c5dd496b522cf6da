//! Staking ledger interface used to apply punishments and rewards.
//!
//! The conflict engine decides *who* and *how much*; implementations move
//! the balances.

use crate::StoreError;
use arbiter_types::AccountAddress;
use serde::{Deserialize, Serialize};

/// How long an account stays jailed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JailTerm {
    /// Jailed for a number of seconds.
    For(u64),
    /// Jailed until governance intervenes.
    Indefinite,
}

pub trait SlashingLedger {
    /// Jail an account.
    fn jail(&self, address: &AccountAddress, term: JailTerm) -> Result<(), StoreError>;

    /// Bond `fraction_bps` of the account's stake as bail; returns the bonded amount.
    fn bond(&self, address: &AccountAddress, fraction_bps: u32) -> Result<u128, StoreError>;

    /// Slash `fraction_bps` of the account's stake; returns the slashed amount.
    fn slash(&self, address: &AccountAddress, fraction_bps: u32) -> Result<u128, StoreError>;

    /// Credit `amount` to an account.
    fn reward(&self, address: &AccountAddress, amount: u128) -> Result<(), StoreError>;

    /// Destroy `amount` of slashed tokens that were not redistributed.
    fn burn(&self, amount: u128) -> Result<(), StoreError>;
}
