use std::fmt;

use super::hashing::{expected_hashes, meets_difficulty, measure_hash_rate};
use super::validation::{Fault, Verdict};
use super::Block;

/// In-memory Proof-of-Work ledger. Index 0 is the genesis block.
///
/// Performs no internal synchronization: callers that share a ledger must
/// serialize every mutating call.
#[derive(Debug, Default)]
pub struct Ledger {
    blocks: Vec<Block>,
    chain_hash: String,
    hashes_per_second: u64,
}

impl Ledger {
    /// An empty ledger with no genesis block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a ledger holding a freshly mined genesis block.
    pub fn with_genesis(difficulty: u32) -> Self {
        let mut ledger = Self::new();
        ledger.append(Block::genesis(difficulty));
        ledger
    }

    /// Link `block` to the tail, mine it and make it the new tail.
    ///
    /// The tail is re-mined rather than trusted: if its payload was
    /// overwritten since it was appended, it is mined in that state and the
    /// new block links to it.
    pub fn append(&mut self, mut block: Block) -> &Block {
        if let Some(tail) = self.blocks.last_mut() {
            block.previous_hash = tail.proof_of_work();
        }
        self.chain_hash = block.proof_of_work();
        self.blocks.push(block);
        &self.blocks[self.blocks.len() - 1]
    }

    /// Build the next block for `payload` and append it.
    pub fn add_block(&mut self, payload: impl Into<String>, difficulty: u32) -> &Block {
        let index = self.blocks.len() as u64;
        self.append(Block::new(index, payload, difficulty))
    }

    /// Validate the entire chain, stopping at the first failed check.
    ///
    /// Each block is judged first by the pointer that refers to it (the
    /// child's `previous_hash`, or the chain hash for the tail) and then by
    /// its own proof of work.
    pub fn validate(&self) -> Verdict {
        let Some(genesis) = self.blocks.first() else {
            return Verdict::Valid;
        };
        if !genesis.previous_hash.is_empty() {
            return Verdict::Invalid {
                index: 0,
                fault: Fault::ParentLink,
            };
        }

        for (i, pair) in self.blocks.windows(2).enumerate() {
            let (parent, child) = (&pair[0], &pair[1]);
            let parent_hash = parent.calculate_hash();

            if child.previous_hash != parent_hash {
                return Verdict::Invalid {
                    index: i + 1,
                    fault: Fault::ParentLink,
                };
            }
            if !meets_difficulty(&parent_hash, parent.difficulty) {
                return Verdict::Invalid {
                    index: i,
                    fault: Fault::ImproperHash {
                        difficulty: parent.difficulty,
                    },
                };
            }
        }

        let tail_index = self.blocks.len() - 1;
        let tail = &self.blocks[tail_index];
        let tail_hash = tail.calculate_hash();
        if tail_hash != self.chain_hash {
            return Verdict::Invalid {
                index: tail_index,
                fault: Fault::HeadLink,
            };
        }
        if !meets_difficulty(&tail_hash, tail.difficulty) {
            return Verdict::Invalid {
                index: tail_index,
                fault: Fault::ImproperHash {
                    difficulty: tail.difficulty,
                },
            };
        }

        Verdict::Valid
    }

    /// Re-link and re-mine every block from genesis onward, then point the
    /// chain hash at the tail. Runs over the whole chain regardless of where
    /// (or whether) it was corrupted.
    pub fn repair(&mut self) {
        let mut parent_hash: Option<String> = None;
        for block in &mut self.blocks {
            if let Some(hash) = parent_hash.take() {
                block.previous_hash = hash;
            }
            parent_hash = Some(block.proof_of_work());
        }
        if let Some(hash) = parent_hash {
            self.chain_hash = hash;
        }
    }

    /// Overwrite a block's payload in place without re-mining.
    /// Returns the previous payload, or `None` if `index` is out of range.
    pub fn overwrite_payload(&mut self, index: usize, payload: impl Into<String>) -> Option<String> {
        let block = self.blocks.get_mut(index)?;
        Some(std::mem::replace(&mut block.payload, payload.into()))
    }

    /// Time `rounds` digests and remember the resulting hashes per second.
    pub fn benchmark_hash_rate(&mut self, rounds: u64) -> u64 {
        self.hashes_per_second = measure_hash_rate(rounds);
        self.hashes_per_second
    }

    pub fn hashes_per_second(&self) -> u64 {
        self.hashes_per_second
    }

    pub fn total_difficulty(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.difficulty)).sum()
    }

    /// Sum of `16^difficulty` over all blocks, saturating.
    pub fn total_expected_hashes(&self) -> u128 {
        self.blocks
            .iter()
            .map(|b| expected_hashes(b.difficulty))
            .fold(0u128, u128::saturating_add)
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Return the last block in the chain.
    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn chain_hash(&self) -> &str {
        &self.chain_hash
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current size of chain: {}", self.len())?;
        match self.tip() {
            Some(tip) => writeln!(f, "Difficulty of most recent block: {}", tip.difficulty)?,
            None => writeln!(f, "Difficulty of most recent block: n/a")?,
        }
        writeln!(f, "Total difficulty for all blocks: {}", self.total_difficulty())?;
        writeln!(
            f,
            "Approximate hashes per second on this machine: {}",
            self.hashes_per_second
        )?;
        writeln!(
            f,
            "Expected total hashes required for the whole chain: {}",
            self.total_expected_hashes()
        )?;
        match self.tip() {
            Some(tip) => writeln!(f, "Nonce for most recent block: {}", tip.nonce)?,
            None => writeln!(f, "Nonce for most recent block: n/a")?,
        }
        write!(f, "Chain hash: {}", self.chain_hash)
    }
}
