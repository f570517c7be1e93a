//! Proof-of-work search over the block nonce.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{
    block::Block,
    config::TimestampMode,
    constants::{CANCEL_POLL_INTERVAL, DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MIN_DIFFICULTY},
    error::{Result, SandboxError},
};

/// Required number of leading `'0'` hex characters, validated to the interactive range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(MIN_DIFFICULTY);
    pub const MAX: Difficulty = Difficulty(MAX_DIFFICULTY);

    pub fn new(zeros: i64) -> Result<Self> {
        if (MIN_DIFFICULTY as i64..=MAX_DIFFICULTY as i64).contains(&zeros) {
            Ok(Self(zeros as u8))
        } else {
            Err(SandboxError::InvalidDifficulty {
                value: zeros,
                min: MIN_DIFFICULTY,
                max: MAX_DIFFICULTY,
            })
        }
    }

    /// Out-of-range values snap to the nearest bound. For slider-style inputs.
    pub fn clamped(zeros: i64) -> Self {
        Self(zeros.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8)
    }

    pub fn zeros(self) -> usize {
        self.0 as usize
    }

    pub fn get(self) -> u32 {
        self.0 as u32
    }

    pub fn target_prefix(self) -> String {
        "0".repeat(self.zeros())
    }

    pub fn harder(self) -> Self {
        Self::clamped(self.0 as i64 + 1)
    }

    pub fn easier(self) -> Self {
        Self::clamped(self.0 as i64 - 1)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = SandboxError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Difficulty> for u32 {
    fn from(value: Difficulty) -> Self {
        value.get()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared flag a mining search polls to abandon its work.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiningStats {
    /// Hashes evaluated, including the block's initial hash.
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningStats {
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            self.attempts as f64
        } else {
            self.attempts as f64 / secs
        }
    }
}

pub fn leading_zero_chars(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

pub fn meets_difficulty(hash: &str, zeros: usize) -> bool {
    leading_zero_chars(hash) >= zeros
}

/// Increments the nonce and recomputes the hash until the hash starts with
/// `difficulty` zeros. No upper bound on iterations.
pub fn mine_block(block: &mut Block, difficulty: Difficulty, mode: TimestampMode) -> MiningStats {
    let started = Instant::now();
    let mut attempts = 1u64;
    while !meets_difficulty(&block.hash, difficulty.zeros()) {
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = block.recompute_hash(mode);
        attempts += 1;
    }
    MiningStats {
        attempts,
        elapsed: started.elapsed(),
    }
}

/// Same search as [`mine_block`], abandoned with [`SandboxError::Cancelled`]
/// once `cancel` is set. A cancelled block is left half-searched and must be dropped.
pub fn mine_block_cancellable(
    block: &mut Block,
    difficulty: Difficulty,
    mode: TimestampMode,
    cancel: &CancelToken,
) -> Result<MiningStats> {
    let started = Instant::now();
    let mut attempts = 1u64;
    loop {
        if attempts % CANCEL_POLL_INTERVAL == 1 && cancel.is_cancelled() {
            return Err(SandboxError::Cancelled);
        }
        if meets_difficulty(&block.hash, difficulty.zeros()) {
            return Ok(MiningStats {
                attempts,
                elapsed: started.elapsed(),
            });
        }
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = block.recompute_hash(mode);
        attempts += 1;
    }
}
