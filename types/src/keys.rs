//! Signature types carried inside relay messages.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 65-byte recoverable secp256k1 signature: `r || s || v`.
///
/// The signer's address is recovered from the signature and the signed
/// digest, so relay messages never carry a public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecoverableSignature(pub [u8; 65]);

impl RecoverableSignature {
    /// All-zero placeholder for messages that have not been signed yet.
    pub const EMPTY: Self = Self([0u8; 65]);

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 65]
    }

    /// The recovery id byte (`v`).
    pub fn recovery_byte(&self) -> u8 {
        self.0[64]
    }
}

impl Default for RecoverableSignature {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SigVisitor;

        impl<'de> serde::de::Visitor<'de> for SigVisitor {
            type Value = RecoverableSignature;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "65 bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let arr: [u8; 65] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(RecoverableSignature(arr))
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                self.visit_bytes(&v)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut arr = [0u8; 65];
                for (i, byte) in arr.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(RecoverableSignature(arr))
            }
        }

        deserializer.deserialize_bytes(SigVisitor)
    }
}
