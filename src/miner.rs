use crate::ciphersuite::{Ciphersuite, Keypair};
use crate::codec::{encode_with_capacity, hash_input_len, CoinRecord};
use crate::error::CoinError;
use crate::observer::MiningObserver;
use crate::stream::StopFlag;
use crate::types::{Mined, Outcome};
use crate::{trailing_zero_bits, COIN_CAPACITY, MAX_ITERATIONS, NONCE_LEN};
use derive_builder::Builder;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Mining configuration. One call to [`Miner::mine`] is one session: a fresh
/// keypair and up to `max_iterations` random nonces.
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct Miner {
    /// Required trailing zero bits.
    pub bits: u32,
    #[builder(default = "MAX_ITERATIONS")]
    pub max_iterations: u64,
    #[builder(default = "NONCE_LEN")]
    pub nonce_len: usize,
    #[builder(default = "Ciphersuite::EcdsaP256Sha256")]
    pub ciphersuite: Ciphersuite,
    /// Largest encoding the miner may produce.
    #[builder(default = "COIN_CAPACITY")]
    pub capacity: usize,
    #[builder(default, setter(strip_option))]
    #[serde(skip)]
    pub observer: Option<Arc<dyn MiningObserver>>,
}

/// One hashed nonce.
struct Attempt {
    zero_bits: u32,
    nonce: Vec<u8>,
    hash: Vec<u8>,
}

impl Miner {
    /// Miner for `bits` with every other setting at its default.
    pub fn new(bits: u32) -> Self {
        Self {
            bits,
            max_iterations: MAX_ITERATIONS,
            nonce_len: NONCE_LEN,
            ciphersuite: Ciphersuite::EcdsaP256Sha256,
            capacity: COIN_CAPACITY,
            observer: None,
        }
    }

    fn validate(&self) -> Result<(), CoinError> {
        if self.bits > i32::MAX as u32 {
            return Err(CoinError::InvalidConfig(
                "bits must fit in an int32".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(CoinError::InvalidConfig(
                "max_iterations must be >= 1".into(),
            ));
        }
        if self.nonce_len == 0 {
            return Err(CoinError::InvalidConfig("nonce_len must be >= 1".into()));
        }
        // Checked before any buffer of that size is allocated.
        match hash_input_len(self.ciphersuite.public_key_len(), self.nonce_len) {
            Some(size) if size <= self.capacity => Ok(()),
            size => Err(CoinError::EncodingTooLarge {
                size: size.unwrap_or(usize::MAX),
                capacity: self.capacity,
            }),
        }
    }

    /// Mine with the operating system RNG.
    pub fn mine(&self) -> Result<Mined, CoinError> {
        self.mine_with_rng(&mut OsRng)
    }

    /// Mine drawing the keypair and every nonce from `rng`.
    pub fn mine_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Mined, CoinError> {
        self.mine_until(rng, &StopFlag::new())
    }

    /// Mine until success, budget exhaustion, or `stop` is raised.
    ///
    /// `stop` is checked between attempts, so at least one nonce is always
    /// tried. Without a success the best attempt seen (most trailing zero
    /// bits, earliest on ties) is signed and returned as [`Outcome::Bad`].
    pub fn mine_until<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        stop: &StopFlag,
    ) -> Result<Mined, CoinError> {
        self.validate()?;
        if self.bits > self.ciphersuite.digest_bits() {
            tracing::warn!(
                bits = self.bits,
                digest_bits = self.ciphersuite.digest_bits(),
                "difficulty exceeds hash width, no attempt can succeed"
            );
        }
        let keypair = self.ciphersuite.generate_keypair(rng)?;
        let mut record = CoinRecord {
            ciphersuite: self.ciphersuite,
            bits: self.bits,
            public_key: keypair.public_key(),
            nonce: vec![0u8; self.nonce_len],
            hash: Vec::new(),
            signature: Vec::new(),
        };

        let mut input = record.hash_input();
        let nonce_at = input.len() - self.nonce_len;

        let mut attempts = 0u64;
        let mut best = self.attempt(rng, &mut input, nonce_at, &mut attempts);
        let outcome = loop {
            if best.zero_bits >= self.bits {
                break Outcome::Good;
            }
            if attempts >= self.max_iterations || stop.should_stop() {
                break Outcome::Bad;
            }
            let next = self.attempt(rng, &mut input, nonce_at, &mut attempts);
            if next.zero_bits > best.zero_bits {
                best = next;
            }
        };

        let zero_bits = best.zero_bits;
        record.nonce = best.nonce;
        record.hash = best.hash;
        let bytes = self.finish(&keypair, &mut record)?;
        tracing::debug!(
            bits = self.bits,
            attempts,
            zero_bits,
            %outcome,
            "mining finished"
        );
        Ok(Mined {
            bytes,
            record,
            outcome,
            attempts,
        })
    }

    /// Draw a nonce into the trailing bytes of `input` and hash it.
    fn attempt<R: RngCore>(
        &self,
        rng: &mut R,
        input: &mut [u8],
        nonce_at: usize,
        attempts: &mut u64,
    ) -> Attempt {
        rng.fill_bytes(&mut input[nonce_at..]);
        let hash = self.ciphersuite.digest(input);
        *attempts += 1;
        if let Some(observer) = &self.observer {
            observer.on_attempt(*attempts);
        }
        Attempt {
            zero_bits: trailing_zero_bits(&hash),
            nonce: input[nonce_at..].to_vec(),
            hash,
        }
    }

    fn finish(&self, keypair: &Keypair, record: &mut CoinRecord) -> Result<Vec<u8>, CoinError> {
        record.signature = keypair.sign(&record.signed_input())?;
        encode_with_capacity(record, self.capacity)
    }
}

impl MinerBuilder {
    fn validate(&self) -> Result<(), CoinError> {
        match self.bits {
            None => return Err(CoinError::InvalidConfig("bits must be provided".into())),
            Some(bits) if bits > i32::MAX as u32 => {
                return Err(CoinError::InvalidConfig(
                    "bits must fit in an int32".into(),
                ))
            }
            Some(_) => {}
        }
        if self.max_iterations == Some(0) {
            return Err(CoinError::InvalidConfig(
                "max_iterations must be >= 1".into(),
            ));
        }
        if self.nonce_len == Some(0) {
            return Err(CoinError::InvalidConfig("nonce_len must be >= 1".into()));
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<Miner, CoinError> {
        self.validate()?;
        self.build()
            .map_err(|e| CoinError::InvalidConfig(e.to_string()))
    }
}

/// Mine one coin of difficulty `bits` with at most `max_iterations` attempts.
///
/// Exhausting the budget is not an error: the coin comes back with
/// [`Outcome::Bad`].
pub fn mine(bits: u32, max_iterations: u64) -> Result<(Vec<u8>, Outcome), CoinError> {
    let miner = MinerBuilder::default()
        .bits(bits)
        .max_iterations(max_iterations)
        .build_validated()?;
    let mined = miner.mine()?;
    Ok((mined.bytes, mined.outcome))
}
