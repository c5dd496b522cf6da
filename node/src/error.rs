use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("conflict error: {0}")]
    Conflict(#[from] arbiter_conflict::ConflictError),

    #[error("store error: {0}")]
    Store(#[from] arbiter_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] arbiter_store_lmdb::LmdbError),

    #[error("invalid parameters: {0}")]
    Params(#[from] arbiter_types::TypesError),

    #[error("event journal error: {0}")]
    Journal(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
