use crate::codec::CoinRecord;
use crate::trailing_zero_bits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic verdict on a coin, independent of whether the operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Good,
    Bad,
}

impl Outcome {
    /// `0` for a good coin, `1` for a bad one.
    pub const fn code(self) -> i32 {
        match self {
            Outcome::Good => 0,
            Outcome::Bad => 1,
        }
    }

    pub const fn is_good(self) -> bool {
        matches!(self, Outcome::Good)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Good => write!(f, "good"),
            Outcome::Bad => write!(f, "bad"),
        }
    }
}

/// Result of a mining session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mined {
    /// Canonical encoding of `record`.
    pub bytes: Vec<u8>,
    pub record: CoinRecord,
    pub outcome: Outcome,
    /// Nonces tried before the session ended.
    pub attempts: u64,
}

impl Mined {
    /// Trailing zero bits of the coin's hash.
    pub fn zero_bits(&self) -> u32 {
        trailing_zero_bits(&self.record.hash)
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Detailed verdict produced by [`crate::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub zero_bits: u32,
    pub meets_difficulty: bool,
    pub signature_valid: bool,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, to_string};

    #[test]
    fn outcome_codes_and_serde() {
        assert_eq!(Outcome::Good.code(), 0);
        assert_eq!(Outcome::Bad.code(), 1);
        assert_eq!(to_string(&Outcome::Good).unwrap(), "\"good\"");
        let back: Outcome = from_str("\"bad\"").unwrap();
        assert_eq!(back, Outcome::Bad);
    }

    #[test]
    fn serde_roundtrip_verification() {
        let v = Verification {
            zero_bits: 9,
            meets_difficulty: true,
            signature_valid: false,
            outcome: Outcome::Bad,
        };
        let s = to_string(&v).unwrap();
        let back: Verification = from_str(&s).unwrap();
        assert_eq!(v, back);
    }
}
