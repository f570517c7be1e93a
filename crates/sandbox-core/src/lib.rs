//! Toy blockchain engine for the tokenization sandbox.
//!
//! Blocks are linked by SHA-256 hashes and mined by brute-forcing a nonce until
//! the hex digest starts with a required number of zeros. The [`chain::Chain`]
//! container is append-only; [`session::Session`] owns one chain per
//! interactive session and mines in the background.

pub mod audit;
pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod pow;
pub mod session;
pub mod view;

pub use audit::{audit, tamper, AuditReport, Finding, TamperOutcome};
pub use block::{calculate_hash, genesis_block, Block};
pub use chain::Chain;
pub use config::{ChainConfig, Clock, TimestampMode};
pub use error::{Result, SandboxError};
pub use graph::LinkGraph;
pub use pow::{CancelToken, Difficulty, MiningStats};
pub use session::{JobId, MiningStatus, Session};
pub use view::BlockRow;
