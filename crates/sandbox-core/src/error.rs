use thiserror::Error;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("difficulty {value} outside supported range {min}..={max}")]
    InvalidDifficulty { value: i64, min: u8, max: u8 },

    #[error("unknown timestamp mode `{0}` (expected `committed` or `excluded`)")]
    InvalidTimestampMode(String),

    #[error("mining cancelled")]
    Cancelled,

    /// The chain moved (reset or a competing append) while the block was being mined.
    #[error("chain changed while mining; result discarded")]
    Stale,

    #[error("block {index} out of range (chain has {len} blocks)")]
    BlockOutOfRange { index: u64, len: usize },

    #[error("unknown mining job {0}")]
    UnknownJob(u64),
}
