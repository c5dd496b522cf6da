//! Nullable slashing ledger: records every call for assertions.

use arbiter_store::{JailTerm, SlashingLedger, StoreError};
use arbiter_types::AccountAddress;
use std::collections::HashMap;
use std::sync::Mutex;

/// A ledger call as observed by the nullable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerCall {
    Jail(AccountAddress, JailTerm),
    Bond(AccountAddress, u32),
    Slash(AccountAddress, u32),
    Reward(AccountAddress, u128),
    Burn(u128),
}

/// An in-memory slashing ledger.
///
/// Accounts without a configured balance have zero stake, so slashing them
/// yields nothing.
pub struct NullSlashingLedger {
    balances: Mutex<HashMap<AccountAddress, u128>>,
    calls: Mutex<Vec<LedgerCall>>,
    fail_on: Mutex<Option<AccountAddress>>,
}

impl NullSlashingLedger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    pub fn set_stake(&self, address: AccountAddress, amount: u128) {
        self.balances.lock().unwrap().insert(address, amount);
    }

    pub fn stake_of(&self, address: &AccountAddress) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Make every call touching `address` fail.
    pub fn fail_on(&self, address: AccountAddress) {
        *self.fail_on.lock().unwrap() = Some(address);
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Accounts jailed so far, in call order.
    pub fn jailed(&self) -> Vec<AccountAddress> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Jail(addr, _) => Some(addr),
                _ => None,
            })
            .collect()
    }

    /// Total rewarded to `address`.
    pub fn rewarded(&self, address: &AccountAddress) -> u128 {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Reward(addr, amount) if addr == *address => Some(amount),
                _ => None,
            })
            .sum()
    }

    pub fn burned(&self) -> u128 {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Burn(amount) => Some(amount),
                _ => None,
            })
            .sum()
    }

    fn check(&self, address: &AccountAddress) -> Result<(), StoreError> {
        if self.fail_on.lock().unwrap().as_ref() == Some(address) {
            return Err(StoreError::Ledger(format!("ledger rejected {address}")));
        }
        Ok(())
    }

    fn fraction_of_stake(&self, address: &AccountAddress, fraction_bps: u32) -> u128 {
        self.stake_of(address) * fraction_bps as u128 / 10_000
    }
}

impl Default for NullSlashingLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SlashingLedger for NullSlashingLedger {
    fn jail(&self, address: &AccountAddress, term: JailTerm) -> Result<(), StoreError> {
        self.check(address)?;
        self.calls.lock().unwrap().push(LedgerCall::Jail(*address, term));
        Ok(())
    }

    fn bond(&self, address: &AccountAddress, fraction_bps: u32) -> Result<u128, StoreError> {
        self.check(address)?;
        self.calls
            .lock()
            .unwrap()
            .push(LedgerCall::Bond(*address, fraction_bps));
        Ok(self.fraction_of_stake(address, fraction_bps))
    }

    fn slash(&self, address: &AccountAddress, fraction_bps: u32) -> Result<u128, StoreError> {
        self.check(address)?;
        let amount = self.fraction_of_stake(address, fraction_bps);
        if let Some(balance) = self.balances.lock().unwrap().get_mut(address) {
            *balance -= amount;
        }
        self.calls
            .lock()
            .unwrap()
            .push(LedgerCall::Slash(*address, fraction_bps));
        Ok(amount)
    }

    fn reward(&self, address: &AccountAddress, amount: u128) -> Result<(), StoreError> {
        self.check(address)?;
        self.calls
            .lock()
            .unwrap()
            .push(LedgerCall::Reward(*address, amount));
        Ok(())
    }

    fn burn(&self, amount: u128) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(LedgerCall::Burn(amount));
        Ok(())
    }
}
