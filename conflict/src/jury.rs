//! Jury selection.

use arbiter_crypto::{blake2b_256, blake2b_256_multi};
use arbiter_types::{AccountAddress, Hash32, VoteIndex};

/// Draws jurors from the staked providers of a chain.
pub struct JurySelector;

impl JurySelector {
    /// Selection seed for a round: binds the signed request to the round's index.
    pub fn seed(request_digest: &Hash32, index: VoteIndex) -> Hash32 {
        blake2b_256_multi(&[request_digest.as_slice(), &index.get().to_le_bytes()])
    }

    /// Select up to `size` jurors from `candidates`, never picking an
    /// account listed in `exclude`.
    ///
    /// The selection is deterministic given the same seed, so every replica
    /// arrives at the same jury. Each candidate is scored with
    /// `Hash(seed || address)` and the lowest scores win.
    pub fn select(
        &self,
        candidates: &[AccountAddress],
        exclude: &[AccountAddress],
        seed: &Hash32,
        size: usize,
    ) -> Vec<AccountAddress> {
        if size == 0 {
            return Vec::new();
        }

        let mut scored: Vec<([u8; 32], AccountAddress)> = candidates
            .iter()
            .filter(|addr| !exclude.contains(addr))
            .map(|addr| {
                let mut data = Vec::with_capacity(32 + AccountAddress::LEN);
                data.extend_from_slice(seed);
                data.extend_from_slice(addr.as_bytes());
                (blake2b_256(&data), *addr)
            })
            .collect();

        scored.sort();
        scored.dedup_by_key(|(_, addr)| *addr);
        scored.truncate(size);
        scored.into_iter().map(|(_, addr)| addr).collect()
    }
}
