use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::hashing::{meets_difficulty, sha256_hex};

/// Checked between nonce increments so a proof-of-work search can be
/// abandoned without changing what a successful search returns.
pub trait StopSignal {
    fn should_stop(&self) -> bool;
}

/// A signal that never fires; the search runs until it finds a hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl StopSignal for Never {
    fn should_stop(&self) -> bool {
        false
    }
}

impl StopSignal for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A deadline: stop once it has passed.
impl StopSignal for Instant {
    fn should_stop(&self) -> bool {
        Instant::now() >= *self
    }
}

/// A single ledger entry holding one transaction string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub created: DateTime<Utc>,
    pub payload: String,
    pub previous_hash: String, // empty for genesis
    pub nonce: u128,           // Proof-of-Work nonce
    pub difficulty: u32,       // required leading hex zeros
}

impl Block {
    /// Create a new block stamped with the current time (not mined yet).
    pub fn new(index: u64, payload: impl Into<String>, difficulty: u32) -> Self {
        Self::at(index, Utc::now(), payload, difficulty)
    }

    pub fn at(
        index: u64,
        created: DateTime<Utc>,
        payload: impl Into<String>,
        difficulty: u32,
    ) -> Self {
        Self {
            index,
            created,
            payload: payload.into(),
            previous_hash: String::new(),
            nonce: 0,
            difficulty,
        }
    }

    /// Create a genesis block: index 0, empty payload, no parent.
    pub fn genesis(difficulty: u32) -> Self {
        Self::new(0, "", difficulty)
    }

    /// SHA-256 over the block's current fields, as uppercase hex.
    /// The creation time enters the preimage as Unix milliseconds.
    pub fn calculate_hash(&self) -> String {
        let preimage = format!(
            "{}:{}:{}:{}:{}:{}",
            self.index,
            self.created.timestamp_millis(),
            self.payload,
            self.previous_hash,
            self.nonce,
            self.difficulty
        );
        sha256_hex(&preimage)
    }

    /// Search for a nonce whose hash starts with `difficulty` zeros and
    /// return that hash. Never gives up.
    pub fn proof_of_work(&mut self) -> String {
        match self.proof_of_work_until(&Never) {
            Some(hash) => hash,
            None => unreachable!("an unbounded search cannot be stopped"),
        }
    }

    /// Same search as [`Block::proof_of_work`], but `stop` is polled after
    /// every miss. On stop the nonce is put back to where the search began
    /// and `None` is returned.
    pub fn proof_of_work_until<S: StopSignal + ?Sized>(&mut self, stop: &S) -> Option<String> {
        let start_nonce = self.nonce;
        loop {
            let hash = self.calculate_hash();
            if meets_difficulty(&hash, self.difficulty) {
                return Some(hash);
            }
            if stop.should_stop() {
                self.nonce = start_nonce;
                return None;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Whether the hash of the current fields satisfies the difficulty.
    pub fn has_valid_proof(&self) -> bool {
        meets_difficulty(&self.calculate_hash(), self.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::time::Instant;

    use super::Block;

    #[test]
    fn genesis_has_no_parent() {
        let b = Block::genesis(2);
        assert_eq!(b.index, 0);
        assert!(b.previous_hash.is_empty());
        assert!(b.payload.is_empty());
        assert_eq!(b.nonce, 0);
    }

    #[test]
    fn hash_is_deterministic() {
        let b = Block::new(3, "tx", 1);
        assert_eq!(b.calculate_hash(), b.calculate_hash());
        assert_eq!(b.calculate_hash(), b.clone().calculate_hash());
        assert_eq!(b.calculate_hash().len(), 64);
    }

    #[test]
    fn mining_produces_leading_zeros() {
        for difficulty in 0..=3 {
            let mut b = Block::new(1, "A", difficulty);
            let hash = b.proof_of_work();
            assert!(hash.starts_with(&"0".repeat(difficulty as usize)));
            // recomputing with the found nonce reproduces the hash
            assert_eq!(hash, b.calculate_hash());
            assert!(b.has_valid_proof());
        }
    }

    #[test]
    fn mining_a_mined_block_is_a_no_op() {
        let mut b = Block::new(1, "A", 2);
        let first = b.proof_of_work();
        let nonce = b.nonce;
        assert_eq!(b.proof_of_work(), first);
        assert_eq!(b.nonce, nonce);
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::new(2, "B", 2);
        let old_hash = b.proof_of_work();

        b.payload = "B2".into();

        assert_ne!(old_hash, b.calculate_hash());
    }

    #[test]
    fn stopped_search_leaves_nonce_untouched() {
        let mut b = Block::new(1, "A", 12);
        b.nonce = 7;
        let stop = AtomicBool::new(true);
        assert_eq!(b.proof_of_work_until(&stop), None);
        assert_eq!(b.nonce, 7);
    }

    #[test]
    fn expired_deadline_stops_search() {
        let mut b = Block::new(1, "A", 12);
        let deadline = Instant::now();
        assert!(b.proof_of_work_until(&deadline).is_none());
        assert_eq!(b.nonce, 0);
    }

    #[test]
    fn unfired_signal_matches_unbounded_search() {
        let mut a = Block::new(5, "same", 2);
        let mut b = a.clone();
        let stop = AtomicBool::new(false);
        assert_eq!(a.proof_of_work_until(&stop), Some(b.proof_of_work()));
        assert_eq!(a.nonce, b.nonce);
    }
}
