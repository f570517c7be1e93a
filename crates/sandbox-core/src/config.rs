//! Engine configuration.
//!
//! Whether the block timestamp is committed into the digest is a deliberate
//! knob: `Committed` matches the classroom behaviour (every block hash depends
//! on when it was created), `Excluded` makes hashes reproducible across runs.

use std::{fmt, str::FromStr};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{constants::GENESIS_DATA, error::SandboxError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    #[default]
    Committed,
    Excluded,
}

impl TimestampMode {
    pub fn commits_timestamp(self) -> bool {
        matches!(self, TimestampMode::Committed)
    }
}

impl fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampMode::Committed => f.write_str("committed"),
            TimestampMode::Excluded => f.write_str("excluded"),
        }
    }
}

impl FromStr for TimestampMode {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "committed" => Ok(TimestampMode::Committed),
            "excluded" => Ok(TimestampMode::Excluded),
            other => Err(SandboxError::InvalidTimestampMode(other.to_string())),
        }
    }
}

/// Source of block timestamps (unix seconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(u64),
}

impl Clock {
    pub fn now(&self) -> u64 {
        match self {
            Clock::System => u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
            Clock::Fixed(ts) => *ts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub timestamp_mode: TimestampMode,
    pub genesis_data: String,
    pub clock: Clock,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            timestamp_mode: TimestampMode::default(),
            genesis_data: GENESIS_DATA.to_string(),
            clock: Clock::default(),
        }
    }
}

impl ChainConfig {
    pub fn with_timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.timestamp_mode = mode;
        self
    }

    pub fn with_genesis_data(mut self, data: impl Into<String>) -> Self {
        self.genesis_data = data.into();
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
