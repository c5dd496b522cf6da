//! Signed relay messages and the conflict reports built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{AccountAddress, Hash32, RecoverableSignature};

/// A client's signed request to a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// The provider the client addressed this request to.
    pub provider: AccountAddress,
    pub chain_id: String,
    pub session_id: u64,
    pub relay_num: u64,
    pub cu_sum: u64,
    /// Block height at which the relay session was paired.
    pub block_height: u64,
    pub api_id: u32,
    pub api_url: String,
    /// Opaque request payload.
    pub data: Vec<u8>,
    /// The chain block the request refers to. Negative values are
    /// symbolic (latest, earliest, ...).
    pub request_block: i64,
    /// Client signature over every other field.
    pub sig: RecoverableSignature,
}

/// A provider's signed reply to a relay request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    /// Opaque response payload.
    pub data: Vec<u8>,
    /// Latest block the provider reported having seen.
    pub latest_block: i64,
    /// Block hashes the provider asserts are final, keyed by height.
    pub finalized_block_hashes: BTreeMap<i64, Hash32>,
    /// Provider signature over the reply, bound to the request.
    pub sig: RecoverableSignature,
    /// Provider finalization acknowledgment, addressed to the client.
    pub sig_blocks: RecoverableSignature,
}

/// One provider's signed exchange with the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRelayData {
    pub request: RelayRequest,
    pub reply: RelayReply,
}

/// Two providers' signed replies to the same logical request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseConflict {
    pub conflict_relay_data0: ConflictRelayData,
    pub conflict_relay_data1: ConflictRelayData,
}

impl ResponseConflict {
    /// The exchange reported for `side`.
    pub fn side(&self, side: ConflictSide) -> &ConflictRelayData {
        match side {
            ConflictSide::First => &self.conflict_relay_data0,
            ConflictSide::Second => &self.conflict_relay_data1,
        }
    }
}

/// Two exchanges in which a single provider contradicts its own finalized blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationConflict {
    pub relay_reply0: ConflictRelayData,
    pub relay_reply1: ConflictRelayData,
}

impl FinalizationConflict {
    pub fn side(&self, side: ConflictSide) -> &ConflictRelayData {
        match side {
            ConflictSide::First => &self.relay_reply0,
            ConflictSide::Second => &self.relay_reply1,
        }
    }
}

/// Which half of a conflict report a check refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictSide {
    First,
    Second,
}

impl ConflictSide {
    pub const BOTH: [ConflictSide; 2] = [ConflictSide::First, ConflictSide::Second];
}

impl fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}
