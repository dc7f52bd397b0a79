pub mod block;
pub mod hashing;
pub mod model;
pub mod validation;

pub use block::{Block, Never, StopSignal};
pub use model::Ledger;
pub use validation::{Fault, Verdict};

/// Difficulty of the genesis block mined at start-up.
pub const GENESIS_DIFFICULTY: u32 = 2;

/// Length of a rendered SHA-256 hash; no higher difficulty can be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Digests timed by the start-up hash-rate benchmark.
pub const BENCHMARK_ROUNDS: u64 = 2_000_000;
