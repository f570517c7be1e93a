use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Table row for list-chain consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRow {
    pub index: u64,
    pub timestamp: u64,
    /// `HH:MM:SS`, UTC.
    pub time: String,
    pub data: String,
    pub hash: String,
    pub previous_hash: String,
    pub nonce: u64,
}

impl From<&Block> for BlockRow {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp,
            time: clock_time(block.timestamp),
            data: block.data.clone(),
            hash: block.hash.clone(),
            previous_hash: block.previous_hash.clone(),
            nonce: block.nonce,
        }
    }
}

pub fn rows(blocks: &[Block]) -> Vec<BlockRow> {
    blocks.iter().map(BlockRow::from).collect()
}

/// Time of day of a unix timestamp, UTC. Timestamps past chrono's range render as `--:--:--`.
pub fn clock_time(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestampMode;

    #[test]
    fn clock_time_example() {
        assert_eq!(clock_time(0), "00:00:00");
        assert_eq!(clock_time(1_600_000_000), "12:26:40");
        assert_eq!(clock_time(86_399), "23:59:59");
        assert_eq!(clock_time(86_400 + 3_661), "01:01:01");
        assert_eq!(clock_time(u64::MAX), "--:--:--");
    }

    #[test]
    fn rows_example() {
        let block = Block::new(0, 1_600_000_000, "Genesis Block", "0", TimestampMode::Committed);
        let rows = rows(std::slice::from_ref(&block));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].time, "12:26:40");
        assert_eq!(rows[0].hash, block.hash);
        assert_eq!(rows[0].previous_hash, "0");
        assert_eq!(rows[0].nonce, 0);
    }
}
