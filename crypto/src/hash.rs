//! Blake2b-256 digests over relay evidence and vote commitments.

use arbiter_types::Hash32;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

fn digest<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Hash32 {
    parts
        .into_iter()
        .fold(Blake2b256::new(), |hasher, part| hasher.chain_update(part))
        .finalize()
        .into()
}

pub fn blake2b_256(data: &[u8]) -> Hash32 {
    digest([data])
}

/// Digest of the parts as if concatenated, without building the buffer.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> Hash32 {
    digest(parts.iter().copied())
}
