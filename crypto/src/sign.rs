//! Recoverable ECDSA signing over 32-byte digests.

use arbiter_types::{AccountAddress, Hash32, RecoverableSignature};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::address::derive_address;
use crate::{AttestationError, KeyPair};

/// Sign a digest, returning `r || s || v` with a low-S `s`.
pub fn sign_prehash(
    digest: &Hash32,
    key: &KeyPair,
) -> Result<RecoverableSignature, AttestationError> {
    let (sig, recovery_id) = key
        .signing
        .sign_prehash_recoverable(digest)
        .map_err(|e| AttestationError::SigningFailed(e.to_string()))?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(RecoverableSignature(out))
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover_signer(
    digest: &Hash32,
    signature: &RecoverableSignature,
) -> Result<AccountAddress, AttestationError> {
    let bytes = signature.as_bytes();
    let recovery_id = RecoveryId::from_byte(normalize_v(bytes[64])).ok_or_else(|| {
        AttestationError::MalformedSignature(format!("recovery id {}", bytes[64]))
    })?;
    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| AttestationError::MalformedSignature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| AttestationError::RecoveryFailed)?;
    Ok(derive_address(&key))
}

/// Accept both raw (0/1) and Ethereum-style (27/28) recovery bytes.
fn normalize_v(v: u8) -> u8 {
    match v {
        27 | 28 => v - 27,
        other => other,
    }
}
