//! Tunable conflict-resolution parameters.
//!
//! Fractions are basis points (10_000 = 100%) so every comparison stays in
//! exact integer arithmetic.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// One hundred percent, in basis points.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Parameters read by the validator, the lifecycle controller and the tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictParams {
    // ── Voting ───────────────────────────────────────────────────────────
    /// Minimum share of the jury a winning bucket needs for its outcome to
    /// punish non-voters.
    pub majority_bps: u32,

    /// Number of jurors drawn for each round.
    pub jury_size: u32,

    /// Whether jurors that committed but never revealed are punished like
    /// jurors that never committed.
    pub punish_unrevealed: bool,

    // ── Punishment ───────────────────────────────────────────────────────
    /// Jail term (seconds) for jurors that never committed.
    pub non_voter_jail_secs: u64,

    /// Share of a non-voter's stake bonded as bail.
    pub non_voter_bail_bps: u32,

    /// Share of a non-voter's stake slashed.
    pub non_voter_slash_bps: u32,

    /// Share of a faulty provider's stake slashed under a strong majority.
    pub faulty_provider_slash_bps: u32,

    /// Jail term (seconds) for providers blamed without a strong majority.
    pub suspect_provider_jail_secs: u64,

    // ── Rewards (shares of the slashed pool) ─────────────────────────────
    pub client_reward_bps: u32,
    pub provider_reward_bps: u32,
    pub voters_reward_bps: u32,
}

impl Default for ConflictParams {
    fn default() -> Self {
        Self {
            majority_bps: 5_000,
            jury_size: 10,
            punish_unrevealed: true,
            non_voter_jail_secs: 7 * 24 * 3600,
            non_voter_bail_bps: 2_000,
            non_voter_slash_bps: 500,
            faulty_provider_slash_bps: BPS_DENOMINATOR,
            suspect_provider_jail_secs: 24 * 3600,
            client_reward_bps: 5_000,
            provider_reward_bps: 1_000,
            voters_reward_bps: 2_000,
        }
    }
}

impl ConflictParams {
    /// Reject parameter sets the tally cannot apply.
    pub fn validate(&self) -> Result<(), TypesError> {
        let fractions = [
            ("majority_bps", self.majority_bps),
            ("non_voter_bail_bps", self.non_voter_bail_bps),
            ("non_voter_slash_bps", self.non_voter_slash_bps),
            ("faulty_provider_slash_bps", self.faulty_provider_slash_bps),
            ("client_reward_bps", self.client_reward_bps),
            ("provider_reward_bps", self.provider_reward_bps),
            ("voters_reward_bps", self.voters_reward_bps),
        ];
        for (name, value) in fractions {
            if value > BPS_DENOMINATOR {
                return Err(TypesError::InvalidParam {
                    name,
                    reason: format!("{value} exceeds {BPS_DENOMINATOR} bps"),
                });
            }
        }

        let reward_total =
            self.client_reward_bps + self.provider_reward_bps + self.voters_reward_bps;
        if reward_total > BPS_DENOMINATOR {
            return Err(TypesError::InvalidParam {
                name: "reward shares",
                reason: format!("sum {reward_total} exceeds {BPS_DENOMINATOR} bps"),
            });
        }

        if self.jury_size == 0 {
            return Err(TypesError::InvalidParam {
                name: "jury_size",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
