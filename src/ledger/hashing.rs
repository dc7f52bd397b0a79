use std::time::Instant;

use sha2::{Digest, Sha256};

/// SHA-256 of `input`, rendered as 64 uppercase hex characters.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// The prefix a hash must start with to satisfy `difficulty`.
pub fn target_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

/// True when the first `difficulty` hex digits of `hash` are all `0`.
/// A hash shorter than `difficulty` never qualifies.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    match hash.get(..difficulty as usize) {
        Some(prefix) => prefix.bytes().all(|b| b == b'0'),
        None => false,
    }
}

/// Expected number of hash evaluations to mine one block: `16^difficulty`.
/// Saturates once the value no longer fits.
pub fn expected_hashes(difficulty: u32) -> u128 {
    16u128.checked_pow(difficulty).unwrap_or(u128::MAX)
}

/// Hashes a constant input `rounds` times and returns the achieved rate
/// in hashes per second.
pub fn measure_hash_rate(rounds: u64) -> u64 {
    let start = Instant::now();
    for _ in 0..rounds {
        std::hint::black_box(sha256_hex(std::hint::black_box("00000000")));
    }
    let secs = start.elapsed().as_secs_f64();
    if secs <= f64::EPSILON {
        return rounds;
    }
    (rounds as f64 / secs) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_uppercase_hex() {
        // sha256("abc")
        assert_eq!(
            sha256_hex("abc"),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn difficulty_prefix_checks() {
        assert!(meets_difficulty("00AB", 2));
        assert!(!meets_difficulty("0A0B", 2));
        assert!(meets_difficulty("ABCD", 0));
        assert!(!meets_difficulty("00", 3));
        assert_eq!(target_prefix(3), "000");
    }

    #[test]
    fn expected_hashes_grows_by_sixteen() {
        assert_eq!(expected_hashes(0), 1);
        assert_eq!(expected_hashes(2), 256);
        assert_eq!(expected_hashes(40), u128::MAX);
    }

    #[test]
    fn hash_rate_is_positive() {
        assert!(measure_hash_rate(1_000) > 0);
    }
}
