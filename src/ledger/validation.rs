use std::fmt;

use super::hashing::target_prefix;

/// Which check of [`Ledger::validate`](super::Ledger::validate) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The block's own hash lacks the leading zeros its difficulty demands.
    ImproperHash { difficulty: u32 },
    /// The block's `previous_hash` differs from the recomputed hash of its parent.
    ParentLink,
    /// The ledger's chain hash differs from the recomputed hash of the tail.
    HeadLink,
}

/// Outcome of a whole-chain validation. An invalid chain is a normal
/// result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid { index: usize, fault: Fault },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "TRUE"),
            Verdict::Invalid { index, fault } => {
                writeln!(f, "FALSE")?;
                match fault {
                    Fault::ImproperHash { difficulty } => write!(
                        f,
                        "Improper hash on node {index}. Does not begin with {}",
                        target_prefix(*difficulty)
                    ),
                    Fault::ParentLink => write!(
                        f,
                        "Block {index} previous hash does not match hash of parent"
                    ),
                    Fault::HeadLink => {
                        write!(f, "Chain hash does not match hash of block {index}")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, Verdict};

    #[test]
    fn renders_operator_text() {
        assert_eq!(Verdict::Valid.to_string(), "TRUE");
        let v = Verdict::Invalid {
            index: 1,
            fault: Fault::ImproperHash { difficulty: 3 },
        };
        assert_eq!(
            v.to_string(),
            "FALSE\nImproper hash on node 1. Does not begin with 000"
        );
        let v = Verdict::Invalid {
            index: 2,
            fault: Fault::HeadLink,
        };
        assert!(!v.is_valid());
        assert_eq!(v.to_string(), "FALSE\nChain hash does not match hash of block 2");
    }
}
