use crate::codec::{decode_with_capacity, CoinRecord};
use crate::error::CoinError;
use crate::types::{Outcome, Verification};
use crate::{trailing_zero_bits, COIN_CAPACITY};

/// Check an encoded coin against difficulty `bits`.
///
/// Decode failures, a stored hash that does not match its inputs, and a coin
/// minted for a different difficulty are errors. Everything else is a verdict.
pub fn verify(bits: u32, bytes: &[u8]) -> Result<Outcome, CoinError> {
    inspect(bits, bytes).map(|report| report.outcome)
}

/// Like [`verify`], but reports each check separately.
pub fn inspect(bits: u32, bytes: &[u8]) -> Result<Verification, CoinError> {
    inspect_with_capacity(bits, bytes, COIN_CAPACITY)
}

pub fn inspect_with_capacity(
    bits: u32,
    bytes: &[u8],
    capacity: usize,
) -> Result<Verification, CoinError> {
    let record = decode_with_capacity(bytes, capacity)?;
    inspect_record(bits, &record)
}

/// Check an already decoded coin. The caller's `bits` is authoritative; the
/// coin must have been minted for exactly that difficulty.
pub fn inspect_record(bits: u32, record: &CoinRecord) -> Result<Verification, CoinError> {
    if record.bits != bits {
        return Err(CoinError::ThresholdMismatch {
            expected: bits,
            found: record.bits,
        });
    }

    let suite = record.ciphersuite;
    if suite.digest(&record.hash_input()) != record.hash {
        return Err(CoinError::HashMismatch);
    }

    let zero_bits = trailing_zero_bits(&record.hash);
    let meets_difficulty = zero_bits >= bits;
    let signature_valid =
        suite.verify_signature(&record.public_key, &record.signed_input(), &record.signature);
    let outcome = if meets_difficulty && signature_valid {
        Outcome::Good
    } else {
        Outcome::Bad
    };
    tracing::debug!(
        bits,
        zero_bits,
        signature_valid,
        %outcome,
        "coin checked"
    );
    Ok(Verification {
        zero_bits,
        meets_difficulty,
        signature_valid,
        outcome,
    })
}
