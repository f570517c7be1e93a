use tracing::{debug, info};

use crate::{
    block::{genesis_block, Block},
    config::ChainConfig,
    pow::{meets_difficulty, mine_block, Difficulty},
};

/// Append-only sequence of blocks anchored by a genesis block.
///
/// The genesis block is held apart from the rest of the chain so that `tip()`
/// is defined without any fallible lookup.
#[derive(Clone, Debug)]
pub struct Chain {
    config: ChainConfig,
    genesis: Block,
    blocks: Vec<Block>,
    epoch: u64,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        let genesis = Self::fresh_genesis(&config);
        Self {
            config,
            genesis,
            blocks: Vec::new(),
            epoch: 0,
        }
    }

    fn fresh_genesis(config: &ChainConfig) -> Block {
        genesis_block(
            config.genesis_data.clone(),
            config.clock.now(),
            config.timestamp_mode,
        )
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Number of resets so far. Lets a background miner notice that the
    /// chain it started from no longer exists.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Discards every block and starts over from a fresh genesis.
    pub fn reset(&mut self) {
        let dropped = self.blocks.len();
        self.blocks.clear();
        self.genesis = Self::fresh_genesis(&self.config);
        self.epoch += 1;
        info!(dropped, epoch = self.epoch, "chain reset to genesis");
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().unwrap_or(&self.genesis)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.blocks.len() + 1
    }

    pub fn get(&self, index: u64) -> Option<Block> {
        match index {
            0 => Some(self.genesis.clone()),
            i => usize::try_from(i - 1)
                .ok()
                .and_then(|i| self.blocks.get(i))
                .cloned(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        std::iter::once(&self.genesis).chain(self.blocks.iter())
    }

    /// Copies the chain out in append order.
    pub fn snapshot(&self) -> Vec<Block> {
        self.iter().cloned().collect()
    }

    /// Unmined successor of the current tip.
    pub fn prepare_next(&self, data: impl Into<String>) -> Block {
        let tip = self.tip();
        Block::new(
            tip.index + 1,
            self.config.clock.now(),
            data,
            tip.hash.clone(),
            self.config.timestamp_mode,
        )
    }

    /// Whether `candidate` would be the direct successor of the current tip.
    pub fn extends_tip(&self, candidate: &Block) -> bool {
        let tip = self.tip();
        candidate.index == tip.index + 1 && candidate.previous_hash == tip.hash
    }

    /// Builds, mines and appends a block on the calling thread.
    pub fn append(&mut self, data: impl Into<String>, difficulty: Difficulty) -> Block {
        let mut block = self.prepare_next(data);
        let stats = mine_block(&mut block, difficulty, self.config.timestamp_mode);
        debug!(
            index = block.index,
            attempts = stats.attempts,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "mined on caller thread"
        );
        self.push_mined(block.clone(), difficulty);
        block
    }

    /// Appends a block mined elsewhere.
    ///
    /// # Panics
    ///
    /// If the block does not extend the tip, carries a hash that does not match
    /// its fields, or misses the difficulty target. The chain never repairs links.
    pub fn push_mined(&mut self, block: Block, difficulty: Difficulty) {
        let tip = self.tip();
        assert_eq!(
            block.index,
            tip.index + 1,
            "block index must follow the tip"
        );
        assert_eq!(
            block.previous_hash, tip.hash,
            "block must link to the tip hash"
        );
        assert!(
            block.is_hash_valid(self.config.timestamp_mode),
            "block hash does not match its fields"
        );
        assert!(
            meets_difficulty(&block.hash, difficulty.zeros()),
            "block hash misses difficulty {difficulty}"
        );
        info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            "block appended"
        );
        self.blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Clock, TimestampMode};
    use crate::constants::GENESIS_PREVIOUS_HASH;

    fn fixed_chain() -> Chain {
        Chain::new(
            ChainConfig::default()
                .with_timestamp_mode(TimestampMode::Excluded)
                .with_clock(Clock::Fixed(1_600_000_000)),
        )
    }

    #[test]
    fn fresh_chain_has_only_genesis() {
        let chain = Chain::default();
        assert_eq!(chain.len(), 1);
        let tip = chain.tip();
        assert_eq!(tip.index, 0);
        assert_eq!(tip.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(tip.data, "Genesis Block");
        assert_eq!(chain.snapshot(), vec![tip.clone()]);
    }

    #[test]
    fn append_example() {
        let mut chain = fixed_chain();
        let genesis_hash = chain.tip().hash.clone();
        let block = chain.append("Alice pays Bob 10", Difficulty::new(2).unwrap());

        assert_eq!(chain.len(), 2);
        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert!(block.hash.starts_with("00"));
        assert_eq!(block.nonce, 187);
        assert_eq!(chain.tip(), &block);
    }

    #[test]
    fn links_hold_across_appends() {
        let mut chain = Chain::default();
        for i in 0..5 {
            chain.append(format!("payment {i}"), Difficulty::new(1).unwrap());
        }
        let blocks = chain.snapshot();
        assert_eq!(blocks.len(), 6);
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        for block in &blocks {
            assert!(block.is_hash_valid(TimestampMode::Committed));
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let mut chain = fixed_chain();
        chain.append("a", Difficulty::new(1).unwrap());
        chain.append("b", Difficulty::new(1).unwrap());
        chain.reset();
        let once = chain.snapshot();
        chain.reset();
        assert_eq!(chain.snapshot(), once);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].index, 0);
        assert_eq!(once[0].previous_hash, "0");
        assert_eq!(chain.epoch(), 2);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut chain = fixed_chain();
        chain.append("a", Difficulty::new(1).unwrap());
        let mut copy = chain.snapshot();
        copy[0].data = "rewritten".into();
        copy.truncate(1);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.get(0).unwrap().data, "Genesis Block");
    }

    #[test]
    fn get_by_index() {
        let mut chain = fixed_chain();
        let block = chain.append("a", Difficulty::new(1).unwrap());
        assert_eq!(chain.get(1), Some(block));
        assert_eq!(chain.get(0).map(|b| b.index), Some(0));
        assert_eq!(chain.get(2), None);
        assert_eq!(chain.get(u64::MAX), None);
    }

    #[test]
    fn prepare_next_references_tip() {
        let chain = fixed_chain();
        let next = chain.prepare_next("x");
        assert_eq!(next.index, 1);
        assert_eq!(next.nonce, 0);
        assert_eq!(next.previous_hash, chain.tip().hash);
        assert!(chain.extends_tip(&next));
    }

    #[test]
    #[should_panic(expected = "block must link to the tip hash")]
    fn push_mined_rejects_broken_link() {
        let mut chain = fixed_chain();
        let mut block = Block::new(1, 0, "forged", "deadbeef", TimestampMode::Excluded);
        mine_block(&mut block, Difficulty::MIN, TimestampMode::Excluded);
        chain.push_mined(block, Difficulty::MIN);
    }

    #[test]
    #[should_panic(expected = "misses difficulty")]
    fn push_mined_rejects_unmined_block() {
        let mut chain = fixed_chain();
        let mut block = chain.prepare_next("lazy");
        // keep the unmined hash off target
        while meets_difficulty(&block.hash, 1) {
            block.data.push('!');
            block.hash = block.recompute_hash(TimestampMode::Excluded);
        }
        chain.push_mined(block, Difficulty::MIN);
    }
}
