use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("canonical encoding failed: {0}")]
    Encoding(String),

    #[error("entropy source failed: {0}")]
    Entropy(String),
}
