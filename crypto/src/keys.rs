//! secp256k1 key generation.

use arbiter_types::AccountAddress;
use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use crate::address::derive_address;
use crate::AttestationError;

/// A signing key together with the address it signs for.
///
/// `SigningKey` zeroizes its scalar on drop.
pub struct KeyPair {
    pub signing: SigningKey,
    pub address: AccountAddress,
}

impl KeyPair {
    fn from_signing_key(signing: SigningKey) -> Self {
        let address = derive_address(signing.verifying_key());
        Self { signing, address }
    }
}

/// Generate a new key pair from the operating system's entropy source.
pub fn generate_keypair() -> Result<KeyPair, AttestationError> {
    let mut seed = [0u8; 32];
    loop {
        getrandom::getrandom(&mut seed).map_err(|e| AttestationError::Entropy(e.to_string()))?;
        // Out-of-range scalars (zero or >= n) are astronomically rare; draw again.
        if let Ok(kp) = keypair_from_seed(&seed) {
            seed.zeroize();
            return Ok(kp);
        }
    }
}

/// Derive a key pair from a 32-byte secret scalar (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> Result<KeyPair, AttestationError> {
    let signing =
        SigningKey::from_slice(seed).map_err(|_| AttestationError::InvalidSecretKey)?;
    Ok(KeyPair::from_signing_key(signing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_keys() {
        let a = generate_keypair().unwrap();
        let b = generate_keypair().unwrap();
        assert_ne!(a.address, b.address);
        assert!(!a.address.is_zero());
    }

    #[test]
    fn seed_is_deterministic() {
        let a = keypair_from_seed(&[7u8; 32]).unwrap();
        let b = keypair_from_seed(&[7u8; 32]).unwrap();
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn zero_seed_rejected() {
        assert!(matches!(
            keypair_from_seed(&[0u8; 32]),
            Err(AttestationError::InvalidSecretKey)
        ));
    }
}
