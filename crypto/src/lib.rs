//! Cryptographic primitives for relay conflict evidence.
//!
//! - **secp256k1** recoverable ECDSA: signers are recovered from signatures,
//!   relay messages never carry public keys
//! - **Blake2b-256** for message digests, response hashes and vote commitments
//! - Account addresses are the first 20 bytes of Blake2b-256(compressed public key)

pub mod address;
pub mod attestor;
pub mod commit;
pub mod error;
pub mod hash;
pub mod keys;
pub mod relay;
pub mod sign;

pub use address::derive_address;
pub use attestor::{EcdsaAttestor, SignatureAttestor};
pub use commit::commit_hash;
pub use error::AttestationError;
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, KeyPair};
pub use relay::{
    finalization_digest, reply_digest, request_digest, response_hash, sign_finalization_ack,
    sign_relay_reply, sign_relay_request,
};
pub use sign::{recover_signer, sign_prehash};
