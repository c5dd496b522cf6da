//! Juror vote commitments.
//!
//! A juror commits to `H(nonce, response_hash, juror)` and later reveals
//! `nonce` and `response_hash`. Binding the juror's address stops a juror
//! from copying another juror's commitment.

use arbiter_types::{AccountAddress, Hash32};

use crate::blake2b_256_multi;

const COMMIT_DOMAIN: &[u8] = b"arbiter/vote-commit";

/// Commitment hash for a juror's vote.
pub fn commit_hash(nonce: u64, response_hash: &Hash32, juror: &AccountAddress) -> Hash32 {
    blake2b_256_multi(&[
        COMMIT_DOMAIN,
        &nonce.to_le_bytes(),
        response_hash,
        juror.as_bytes(),
    ])
}
