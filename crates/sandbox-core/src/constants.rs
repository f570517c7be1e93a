pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_DATA: &str = "Genesis Block";
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 4;
pub const DEFAULT_DIFFICULTY: u8 = 2;
/// Nonces tried between two checks of the cancel flag.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;
/// Finished jobs whose outcome `Session::wait_for` can still report.
pub const JOB_HISTORY: usize = 256;
pub const GRAPH_DATA_PREVIEW: usize = 15;
pub const GRAPH_HASH_PREVIEW: usize = 6;
