use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{config::TimestampMode, constants::GENESIS_PREVIOUS_HASH};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Unix seconds at creation. Display and hash input only; order comes from the chain.
    pub timestamp: u64,
    pub data: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Builds an unmined block (nonce 0) with its hash already computed.
    pub fn new(
        index: u64,
        timestamp: u64,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
        mode: TimestampMode,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.recompute_hash(mode);
        block
    }

    pub fn hash_bytes(&self, mode: TimestampMode) -> Vec<u8> {
        hash_bytes(
            self.index,
            self.timestamp,
            &self.data,
            &self.previous_hash,
            self.nonce,
            mode,
        )
    }

    /// Digest of the block's current fields, ignoring the stored `hash`.
    pub fn recompute_hash(&self, mode: TimestampMode) -> String {
        digest_hex(&self.hash_bytes(mode))
    }

    pub fn is_hash_valid(&self, mode: TimestampMode) -> bool {
        self.recompute_hash(mode) == self.hash
    }

    pub fn leading_zeros(&self) -> usize {
        crate::pow::leading_zero_chars(&self.hash)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

/// Fixed layout fed to SHA-256: index, timestamp (committed mode only), data,
/// previous hash, nonce. Integers are u64 little-endian; strings carry a u64
/// little-endian length prefix so adjacent fields cannot bleed into each other.
pub fn hash_bytes(
    index: u64,
    timestamp: u64,
    data: &str,
    previous_hash: &str,
    nonce: u64,
    mode: TimestampMode,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 * 5 + data.len() + previous_hash.len());
    bytes.extend_from_slice(&index.to_le_bytes());
    if mode.commits_timestamp() {
        bytes.extend_from_slice(&timestamp.to_le_bytes());
    }
    bytes.extend_from_slice(&(data.len() as u64).to_le_bytes());
    bytes.extend_from_slice(data.as_bytes());
    bytes.extend_from_slice(&(previous_hash.len() as u64).to_le_bytes());
    bytes.extend_from_slice(previous_hash.as_bytes());
    bytes.extend_from_slice(&nonce.to_le_bytes());
    bytes
}

pub fn calculate_hash(
    index: u64,
    timestamp: u64,
    data: &str,
    previous_hash: &str,
    nonce: u64,
    mode: TimestampMode,
) -> String {
    digest_hex(&hash_bytes(index, timestamp, data, previous_hash, nonce, mode))
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn genesis_block(data: impl Into<String>, timestamp: u64, mode: TimestampMode) -> Block {
    Block::new(0, timestamp, data, GENESIS_PREVIOUS_HASH, mode)
}
