//! Vote rounds opened for accepted conflict reports.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::{AccountAddress, Hash32, TypesError};

/// Identifier of a vote round, a sequential integer starting at 1.
///
/// Stores key rounds by the decimal string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteIndex(u64);

impl VoteIndex {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VoteIndex {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| TypesError::InvalidVoteIndex(s.to_string()))
    }
}

/// A juror's position in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteResult {
    /// The juror has not committed.
    NoVote,
    /// The juror committed a hash that has not been revealed yet.
    Commit,
    /// Revealed: the first provider answered correctly.
    Provider0,
    /// Revealed: the second provider answered correctly.
    Provider1,
    /// Revealed: neither provider answered correctly.
    None,
}

/// A single juror's vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Commitment hash, all zeros until the juror commits.
    pub hash: Hash32,
    pub result: VoteResult,
}

impl Vote {
    /// The vote every juror starts a round with.
    pub fn no_vote() -> Self {
        Self {
            hash: [0u8; 32],
            result: VoteResult::NoVote,
        }
    }
}

/// Phase of a vote round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteState {
    /// Jurors submit commitment hashes.
    StateCommit,
    /// Jurors open their commitments.
    StateReveal,
}

/// A provider named in a conflict and the hash of the response it gave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub account: AccountAddress,
    pub response_hash: Hash32,
}

/// Punishment already applied to one account while closing a round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishedAccount {
    pub jailed: bool,
    /// Amount bonded as bail, once the bond call succeeded.
    pub bonded: Option<u128>,
    /// Amount slashed, once the slash call succeeded.
    pub slashed: Option<u128>,
}

/// Ledger calls already made while closing a round.
///
/// Written back to the store after every call, so a close that failed
/// halfway resumes where it stopped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseProgress {
    pub punished: BTreeMap<AccountAddress, PunishedAccount>,
    pub rewarded: BTreeSet<AccountAddress>,
    pub burned: bool,
}

impl CloseProgress {
    pub fn account(&self, address: &AccountAddress) -> PunishedAccount {
        self.punished.get(address).cloned().unwrap_or_default()
    }
}

/// The record of one vote round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictVote {
    pub index: VoteIndex,
    pub client_address: AccountAddress,
    /// Block height at which the round was opened.
    pub vote_start_block: u64,
    pub vote_state: VoteState,
    pub chain_id: String,
    pub api_url: String,
    pub request_data: Vec<u8>,
    pub request_block: i64,
    pub first_provider: ProviderResponse,
    pub second_provider: ProviderResponse,
    /// The jury, fixed when the round opens.
    pub voters_hash: BTreeMap<AccountAddress, Vote>,
    /// Ledger effects applied so far by a close. Set once closing starts;
    /// the round accepts no further commits or reveals after that.
    #[serde(default)]
    pub close_progress: Option<CloseProgress>,
}

impl ConflictVote {
    pub fn is_closing(&self) -> bool {
        self.close_progress.is_some()
    }

    pub fn jury_size(&self) -> usize {
        self.voters_hash.len()
    }
}
