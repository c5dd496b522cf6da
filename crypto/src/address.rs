//! Account address derivation from public keys.
//!
//! Address = first 20 bytes of Blake2b-256(SEC1 compressed public key).

use arbiter_types::AccountAddress;
use k256::ecdsa::VerifyingKey;

use crate::blake2b_256;

/// Derive the account address a verifying key signs for.
pub fn derive_address(key: &VerifyingKey) -> AccountAddress {
    let encoded = key.to_encoded_point(true);
    let hash = blake2b_256(encoded.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[..20]);
    AccountAddress::new(bytes)
}
