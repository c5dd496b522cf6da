//! Nullable stake registry: programmable epochs, stakes and finality.

use arbiter_store::{StakeRegistry, StoreError};
use arbiter_types::{AccountAddress, StakeEntry};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type StakeKey = (String, AccountAddress, u64);

/// A deterministic stake registry for testing.
///
/// Epochs are fixed-length block ranges starting at 0. A block is final once
/// the reported latest block is at least `finalization_distance` past it.
pub struct NullStakeRegistry {
    epoch_blocks: u64,
    finalization_distance: i64,
    clients: Mutex<HashMap<StakeKey, StakeEntry>>,
    providers: Mutex<BTreeMap<StakeKey, StakeEntry>>,
}

impl NullStakeRegistry {
    pub fn new(epoch_blocks: u64, finalization_distance: i64) -> Self {
        Self {
            epoch_blocks: epoch_blocks.max(1),
            finalization_distance,
            clients: Mutex::new(HashMap::new()),
            providers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register a client stake for `chain_id` at `epoch`.
    pub fn stake_client(&self, chain_id: &str, address: AccountAddress, epoch: u64, entry: StakeEntry) {
        self.clients
            .lock()
            .unwrap()
            .insert((chain_id.to_string(), address, epoch), entry);
    }

    /// Register a provider stake for `chain_id` at `epoch`.
    pub fn stake_provider(
        &self,
        chain_id: &str,
        address: AccountAddress,
        epoch: u64,
        entry: StakeEntry,
    ) {
        self.providers
            .lock()
            .unwrap()
            .insert((chain_id.to_string(), address, epoch), entry);
    }
}

impl Default for NullStakeRegistry {
    fn default() -> Self {
        Self::new(20, 6)
    }
}

impl StakeRegistry for NullStakeRegistry {
    fn epoch_start_for_block(&self, _chain_id: &str, height: u64) -> Result<u64, StoreError> {
        Ok(height - height % self.epoch_blocks)
    }

    fn client_stake_entry(
        &self,
        chain_id: &str,
        address: &AccountAddress,
        epoch: u64,
    ) -> Result<Option<StakeEntry>, StoreError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .get(&(chain_id.to_string(), *address, epoch))
            .copied())
    }

    fn provider_stake_entry(
        &self,
        chain_id: &str,
        address: &AccountAddress,
        epoch: u64,
    ) -> Result<Option<StakeEntry>, StoreError> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .get(&(chain_id.to_string(), *address, epoch))
            .copied())
    }

    fn provider_stake_entries(
        &self,
        chain_id: &str,
        epoch: u64,
    ) -> Result<Vec<(AccountAddress, StakeEntry)>, StoreError> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .iter()
            .filter(|((chain, _, e), _)| chain == chain_id && *e == epoch)
            .map(|((_, addr, _), entry)| (*addr, *entry))
            .collect())
    }

    fn is_finalized_block(&self, _chain_id: &str, request_block: i64, latest_block: i64) -> bool {
        request_block >= 0 && request_block <= latest_block - self.finalization_distance
    }
}
