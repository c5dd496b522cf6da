//! LMDB storage backend for the relay conflict arbiter.
//!
//! Implements the storage traits from `arbiter-store` using the `heed` LMDB bindings.
//! Each logical store maps to one LMDB database within a single environment.

pub mod environment;
pub mod error;
pub mod meta;
pub mod vote;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use meta::LmdbMetaStore;
pub use vote::LmdbVoteStore;
