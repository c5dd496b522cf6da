use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid vote index: {0}")]
    InvalidVoteIndex(String),

    #[error("invalid conflict parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}
