use anyhow::Result;
use sandbox_core::{audit, tamper, view, ChainConfig, Difficulty, Session, TimestampMode};
use tracing::info;

use crate::render::{audit_summary, chain_table};

pub struct DemoOptions {
    pub difficulty: Difficulty,
    pub payloads: Vec<String>,
    pub timestamp_mode: TimestampMode,
}

/// Mines the payloads into a fresh in-process session, prints the chain and
/// its link graph, then forges the genesis payload on a copy and audits it.
pub async fn run(options: DemoOptions) -> Result<String> {
    let session = Session::new(ChainConfig::default().with_timestamp_mode(options.timestamp_mode));
    let mode = options.timestamp_mode;
    let mut out = String::new();

    for payload in &options.payloads {
        let block = session.mine_and_wait(payload.as_str(), options.difficulty).await?;
        info!(index = block.index, nonce = block.nonce, "demo block mined");
    }

    let blocks = session.snapshot();
    out.push_str(&chain_table(&view::rows(&blocks)));
    out.push('\n');
    out.push_str(&session.graph().to_text());
    out.push_str("\n\n");
    out.push_str(&audit_summary(&session.audit()));
    out.push('\n');

    let mut forged = blocks.clone();
    let outcome = tamper(&mut forged, 0, "Genesis Block (forged)", mode)?;
    out.push_str(&format!(
        "\ntampered block 0: {} -> {}\n",
        outcome.original_hash, outcome.new_hash
    ));
    out.push_str(&audit_summary(&audit(&forged, mode)));
    out.push('\n');
    Ok(out)
}
