//! A minimal signed proof-of-work coin.
//!
//! A coin is a length-prefixed binary record whose hash must end in `bits`
//! zero bits and whose signature, by the key embedded in the coin, covers
//! everything before it. [`mine`] makes coins, [`verify`] checks them, and
//! [`codec`] owns the byte layout both of them share.

pub mod ciphersuite;
pub mod codec;
pub mod error;
pub mod miner;
pub mod observer;
pub mod parallel;
pub mod stream;
pub mod types;
pub mod verifier;

pub use ciphersuite::{Ciphersuite, Keypair};
pub use codec::{decode, decode_with_capacity, encode, encode_with_capacity, CoinRecord};
pub use error::{describe, CoinError, GENERIC_ERROR_CODE};
pub use miner::{mine, Miner, MinerBuilder, MinerBuilderError};
pub use observer::{MiningObserver, TracingProgress};
pub use parallel::ParallelMiner;
pub use stream::StopFlag;
pub use types::{Mined, Outcome, Verification};
pub use verifier::{inspect, inspect_record, inspect_with_capacity, verify};

/// Largest coin, in bytes, the crate will produce or accept.
pub const COIN_CAPACITY: usize = 1024;

/// Default attempt budget for one mining session.
pub const MAX_ITERATIONS: u64 = 1024 * 1024;

/// Default nonce length in bytes.
pub const NONCE_LEN: usize = 32;

/// Count the zero bits at the low-order end of `hash`, read as a big-endian number.
pub fn trailing_zero_bits(hash: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in hash.iter().rev() {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.trailing_zeros();
        break;
    }
    count
}

/// Whether the low-order `bits` bits of `hash` are all zero.
pub fn meets_trailing_zero_bits(hash: &[u8], bits: u32) -> bool {
    trailing_zero_bits(hash) >= bits
}
