//! Integrity checks over chain snapshots and the tamper experiment.
//!
//! Both work on copies handed out by [`crate::chain::Chain::snapshot`]; nothing
//! here can reach the live chain.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    block::Block,
    config::TimestampMode,
    constants::GENESIS_PREVIOUS_HASH,
    error::{Result, SandboxError},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    GenesisMalformed {
        index: u64,
        previous_hash: String,
    },
    IndexGap {
        index: u64,
        expected: u64,
    },
    HashMismatch {
        index: u64,
        stored: String,
        recomputed: String,
    },
    BrokenLink {
        index: u64,
        expected_previous: String,
        found_previous: String,
    },
}

impl Finding {
    pub fn index(&self) -> u64 {
        match self {
            Finding::GenesisMalformed { index, .. }
            | Finding::IndexGap { index, .. }
            | Finding::HashMismatch { index, .. }
            | Finding::BrokenLink { index, .. } => *index,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub blocks: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    /// Lowest block index with any finding.
    pub fn first_invalid(&self) -> Option<u64> {
        self.findings.iter().map(Finding::index).min()
    }
}

pub fn audit(blocks: &[Block], mode: TimestampMode) -> AuditReport {
    let mut findings = Vec::new();

    if let Some(first) = blocks.first() {
        if first.index != 0 || first.previous_hash != GENESIS_PREVIOUS_HASH {
            findings.push(Finding::GenesisMalformed {
                index: first.index,
                previous_hash: first.previous_hash.clone(),
            });
        }
    }

    let mismatches: Vec<Finding> = blocks
        .par_iter()
        .filter_map(|block| {
            let recomputed = block.recompute_hash(mode);
            (recomputed != block.hash).then(|| Finding::HashMismatch {
                index: block.index,
                stored: block.hash.clone(),
                recomputed,
            })
        })
        .collect();
    findings.extend(mismatches);

    for pair in blocks.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);
        // no successor index exists past u64::MAX
        match prev.index.checked_add(1) {
            Some(expected) if expected == block.index => {}
            expected => findings.push(Finding::IndexGap {
                index: block.index,
                expected: expected.unwrap_or(u64::MAX),
            }),
        }
        if block.previous_hash != prev.hash {
            findings.push(Finding::BrokenLink {
                index: block.index,
                expected_previous: prev.hash.clone(),
                found_previous: block.previous_hash.clone(),
            });
        }
    }

    findings.sort_by_key(Finding::index);
    AuditReport {
        blocks: blocks.len(),
        findings,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperOutcome {
    pub index: u64,
    pub original_data: String,
    pub original_hash: String,
    pub new_hash: String,
}

/// Rewrites the payload of one block in a copied chain and recomputes that
/// block's hash, the way an attacker editing history would. Its successors are
/// left pointing at the old hash.
pub fn tamper(
    blocks: &mut [Block],
    index: u64,
    new_data: impl Into<String>,
    mode: TimestampMode,
) -> Result<TamperOutcome> {
    let len = blocks.len();
    let block = usize::try_from(index)
        .ok()
        .and_then(|i| blocks.get_mut(i))
        .ok_or(SandboxError::BlockOutOfRange { index, len })?;

    let original_data = std::mem::replace(&mut block.data, new_data.into());
    let original_hash = std::mem::take(&mut block.hash);
    block.hash = block.recompute_hash(mode);

    Ok(TamperOutcome {
        index,
        original_data,
        original_hash,
        new_hash: block.hash.clone(),
    })
}
