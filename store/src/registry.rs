//! Epoch stake registry interface.

use crate::StoreError;
use arbiter_types::{AccountAddress, StakeEntry};

/// Resolves who was staked where, and when.
///
/// Lookups are time-scoped: a stake entry is only valid for the epoch it was
/// registered in.
pub trait StakeRegistry {
    /// The first block of the epoch that contains `height`.
    fn epoch_start_for_block(&self, chain_id: &str, height: u64) -> Result<u64, StoreError>;

    /// The client stake entry for `address` on `chain_id` at `epoch`, if any.
    fn client_stake_entry(
        &self,
        chain_id: &str,
        address: &AccountAddress,
        epoch: u64,
    ) -> Result<Option<StakeEntry>, StoreError>;

    /// The provider stake entry for `address` on `chain_id` at `epoch`, if any.
    fn provider_stake_entry(
        &self,
        chain_id: &str,
        address: &AccountAddress,
        epoch: u64,
    ) -> Result<Option<StakeEntry>, StoreError>;

    /// All providers staked on `chain_id` at `epoch`. Candidates for a jury.
    fn provider_stake_entries(
        &self,
        chain_id: &str,
        epoch: u64,
    ) -> Result<Vec<(AccountAddress, StakeEntry)>, StoreError>;

    /// Whether `request_block` is final given the provider's reported latest block.
    fn is_finalized_block(&self, chain_id: &str, request_block: i64, latest_block: i64) -> bool;
}
