//! Stake entries resolved from the epoch stake registry.

use serde::{Deserialize, Serialize};

/// A client or provider stake at a given epoch. Amounts are raw token units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntry {
    pub stake: u128,
    /// Ceiling on how much delegated stake counts towards this entry.
    pub delegate_limit: u128,
    /// Total stake currently delegated to this entry.
    pub delegate_total: u128,
}

impl StakeEntry {
    pub fn new(stake: u128) -> Self {
        Self {
            stake,
            delegate_limit: 0,
            delegate_total: 0,
        }
    }

    /// Own stake plus delegations, with delegations capped at `delegate_limit`.
    pub fn effective_stake(&self) -> u128 {
        self.stake
            .saturating_add(self.delegate_limit.min(self.delegate_total))
    }
}
