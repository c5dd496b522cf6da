//! Arbiter node: hosts the conflict engine.
//!
//! The node
//! - opens the LMDB environment holding open vote rounds and the vote index counter
//! - builds a conflict engine over it with the host's stake registry, slashing
//!   ledger and signature attestor
//! - exposes the engine's operations wrapped in tracing spans
//! - journals every engine event as newline-delimited JSON

pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
pub mod node;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use journal::EventJournal;
pub use logging::{init_logging, LogFormat};
pub use node::ArbiterNode;
