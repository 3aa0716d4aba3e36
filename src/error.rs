/// Generic error code, used when nothing more specific applies.
pub const GENERIC_ERROR_CODE: i32 = -1;

/// Operational failures. A bad coin is never one of these; see [`crate::Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoinError {
    #[error("truncated input")]
    TruncatedInput,
    #[error("malformed length field")]
    MalformedLength,
    #[error("unsupported ciphersuite {0}")]
    UnsupportedCiphersuite(u32),
    #[error("encoding of {size} bytes exceeds coin capacity of {capacity} bytes")]
    EncodingTooLarge { size: usize, capacity: usize },
    #[error("keypair generation failed")]
    KeypairGenerationFailed,
    #[error("signing failed")]
    SigningFailed,
    #[error("stored hash does not match recomputed hash")]
    HashMismatch,
    #[error("difficulty {expected} does not match coin difficulty {found}")]
    ThresholdMismatch { expected: u32, found: u32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("mining worker panicked")]
    WorkerPanicked,
}

impl CoinError {
    /// Stable negative code for this error, suitable as a process exit status.
    pub fn code(&self) -> i32 {
        match self {
            CoinError::TruncatedInput => -2,
            CoinError::MalformedLength => -3,
            CoinError::UnsupportedCiphersuite(_) => -4,
            CoinError::EncodingTooLarge { .. } => -5,
            CoinError::KeypairGenerationFailed => -6,
            CoinError::SigningFailed => -7,
            CoinError::HashMismatch => -8,
            CoinError::ThresholdMismatch { .. } => -9,
            CoinError::InvalidConfig(_) => -10,
            CoinError::WorkerPanicked => -11,
        }
    }
}

/// Human-readable message for a result code.
///
/// Covers the outcome codes (`0`, `1`), the generic error and every
/// [`CoinError::code`]. Anything else maps to `"unspecified error"`.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "good coin",
        1 => "bad coin",
        GENERIC_ERROR_CODE => "general error",
        -2 => "truncated input",
        -3 => "malformed length field",
        -4 => "unsupported ciphersuite",
        -5 => "encoding exceeds coin capacity",
        -6 => "keypair generation failed",
        -7 => "signing failed",
        -8 => "stored hash does not match recomputed hash",
        -9 => "difficulty does not match coin",
        -10 => "invalid configuration",
        -11 => "mining worker panicked",
        _ => "unspecified error",
    }
}
