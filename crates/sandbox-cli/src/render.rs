use std::fmt::Write as _;

use sandbox_core::{AuditReport, BlockRow, Finding};

/// Plain-text table of a chain, one row per block.
pub fn chain_table(rows: &[BlockRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<8} {:>7}  {:<64}  {:<64}  data",
        "idx", "time", "nonce", "hash", "previous_hash"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<5} {:<8} {:>7}  {:<64}  {:<64}  {}",
            row.index, row.time, row.nonce, row.hash, row.previous_hash, row.data
        );
    }
    out
}

pub fn audit_summary(report: &AuditReport) -> String {
    if report.is_valid() {
        return format!("chain valid ({} blocks)", report.blocks);
    }
    let mut out = format!(
        "chain INVALID from block {} ({} blocks, {} findings)",
        report.first_invalid().unwrap_or_default(),
        report.blocks,
        report.findings.len()
    );
    for finding in &report.findings {
        let line = match finding {
            Finding::GenesisMalformed {
                index,
                previous_hash,
            } => format!("block {index}: malformed genesis (previous_hash {previous_hash:?})"),
            Finding::IndexGap { index, expected } => {
                format!("block {index}: expected index {expected}")
            }
            Finding::HashMismatch {
                index,
                stored,
                recomputed,
            } => format!("block {index}: stored hash {stored} != recomputed {recomputed}"),
            Finding::BrokenLink {
                index,
                expected_previous,
                found_previous,
            } => format!(
                "block {index}: previous_hash {found_previous} does not match predecessor {expected_previous}"
            ),
        };
        out.push_str("\n  ");
        out.push_str(&line);
    }
    out
}
