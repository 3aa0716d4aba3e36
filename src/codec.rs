//! Canonical binary layout of a coin.
//!
//! ```text
//! ciphersuite : u32
//! bits        : u32
//! keylen      : u32   public_key : keylen bytes
//! noncelen    : u32   nonce      : noncelen bytes
//! hashlen     : u32   hash       : hashlen bytes
//! siglen      : u32   signature  : siglen bytes
//! ```
//!
//! Every integer is big-endian. `bits` and the length fields are int32 on the
//! wire, so any of them with the sign bit set is malformed.

use crate::ciphersuite::Ciphersuite;
use crate::error::CoinError;
use crate::COIN_CAPACITY;
use serde::{Deserialize, Serialize};

const WORD: usize = 4;

/// A decoded coin. Field order matches the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinRecord {
    pub ciphersuite: Ciphersuite,
    pub bits: u32,
    pub public_key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl CoinRecord {
    /// Encoded {ciphersuite, bits, public_key, nonce}: the bytes that are hashed.
    ///
    /// The nonce payload is always the trailing `nonce.len()` bytes.
    pub fn hash_input(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 * WORD + self.public_key.len() + self.nonce.len());
        put_u32(&mut out, self.ciphersuite.id());
        put_u32(&mut out, self.bits);
        put_field(&mut out, &self.public_key);
        put_field(&mut out, &self.nonce);
        out
    }

    /// Encoded {ciphersuite, bits, public_key, nonce, hash}: the bytes that are signed.
    pub fn signed_input(&self) -> Vec<u8> {
        let mut out = self.hash_input();
        put_field(&mut out, &self.hash);
        out
    }

    /// Size of the full encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        6 * WORD
            + self.public_key.len()
            + self.nonce.len()
            + self.hash.len()
            + self.signature.len()
    }
}

/// Length of [`CoinRecord::hash_input`] for the given payload sizes, or `None`
/// if it does not fit in a `usize`.
pub fn hash_input_len(public_key_len: usize, nonce_len: usize) -> Option<usize> {
    (4 * WORD)
        .checked_add(public_key_len)?
        .checked_add(nonce_len)
}

/// Encode `record`, bounded by [`COIN_CAPACITY`].
pub fn encode(record: &CoinRecord) -> Result<Vec<u8>, CoinError> {
    encode_with_capacity(record, COIN_CAPACITY)
}

/// Encode `record`, failing if the result would exceed `capacity` bytes.
pub fn encode_with_capacity(record: &CoinRecord, capacity: usize) -> Result<Vec<u8>, CoinError> {
    let size = record.encoded_len();
    // Anything past i32::MAX could not be described by an int32 length either.
    if size > capacity || size > i32::MAX as usize {
        return Err(CoinError::EncodingTooLarge { size, capacity });
    }
    let mut out = record.signed_input();
    put_field(&mut out, &record.signature);
    debug_assert_eq!(out.len(), size);
    Ok(out)
}

/// Decode a coin, accepting at most [`COIN_CAPACITY`] bytes.
pub fn decode(bytes: &[u8]) -> Result<CoinRecord, CoinError> {
    decode_with_capacity(bytes, COIN_CAPACITY)
}

/// Decode a coin from exactly `bytes`.
///
/// Purely structural: neither the hash nor the signature is checked here.
pub fn decode_with_capacity(bytes: &[u8], capacity: usize) -> Result<CoinRecord, CoinError> {
    if bytes.len() > capacity {
        return Err(CoinError::EncodingTooLarge {
            size: bytes.len(),
            capacity,
        });
    }
    let mut reader = Reader::new(bytes);
    let ciphersuite = Ciphersuite::try_from(reader.u32()?)?;
    let bits = reader.int32()?;
    let public_key = reader.field()?;
    let nonce = reader.field()?;
    let hash = reader.field()?;
    let signature = reader.field()?;
    if !reader.is_empty() {
        return Err(CoinError::MalformedLength);
    }
    Ok(CoinRecord {
        ciphersuite,
        bits,
        public_key,
        nonce,
        hash,
        signature,
    })
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_field(out: &mut Vec<u8>, payload: &[u8]) {
    put_u32(out, payload.len() as u32);
    out.extend_from_slice(payload);
}

/// Bounds-checked cursor over an input buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CoinError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CoinError::TruncatedInput)?;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or(CoinError::TruncatedInput)?;
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, CoinError> {
        let mut word = [0u8; WORD];
        word.copy_from_slice(self.take(WORD)?);
        Ok(u32::from_be_bytes(word))
    }

    /// A non-negative int32, widened to `u32`.
    fn int32(&mut self) -> Result<u32, CoinError> {
        let value = self.u32()?;
        i32::try_from(value).map_err(|_| CoinError::MalformedLength)?;
        Ok(value)
    }

    fn field(&mut self) -> Result<Vec<u8>, CoinError> {
        let len = self.int32()?;
        Ok(self.take(len as usize)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CoinRecord {
        CoinRecord {
            ciphersuite: Ciphersuite::EcdsaP256Sha256,
            bits: 8,
            public_key: vec![0x04; 65],
            nonce: (0u8..32).collect(),
            hash: vec![0xab; 32],
            signature: vec![0x30; 71],
        }
    }

    #[test]
    fn layout_is_big_endian_and_length_prefixed() {
        let record = CoinRecord {
            ciphersuite: Ciphersuite::EcdsaP256Sha256,
            bits: 0x0102_0304,
            public_key: vec![0xaa, 0xbb],
            nonce: vec![0xcc],
            hash: vec![],
            signature: vec![0xdd, 0xee, 0xff],
        };
        let expected: Vec<u8> = vec![
            0, 0, 0, 0, // ciphersuite
            1, 2, 3, 4, // bits
            0, 0, 0, 2, 0xaa, 0xbb, // public key
            0, 0, 0, 1, 0xcc, // nonce
            0, 0, 0, 0, // hash
            0, 0, 0, 3, 0xdd, 0xee, 0xff, // signature
        ];
        assert_eq!(encode(&record).unwrap(), expected);
        assert_eq!(decode(&expected).unwrap(), record);
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let record = sample();
        let bytes = encode(&record).unwrap();
        assert_eq!(bytes.len(), record.encoded_len());
        assert_eq!(decode(&bytes).unwrap(), record);
    }

    #[test]
    fn hash_and_signed_inputs_are_prefixes_of_encoding() {
        let record = sample();
        let bytes = encode(&record).unwrap();
        let hash_input = record.hash_input();
        let signed_input = record.signed_input();
        assert!(bytes.starts_with(&signed_input));
        assert!(signed_input.starts_with(&hash_input));
        assert!(hash_input.ends_with(&record.nonce));
    }

    #[test]
    fn every_strict_prefix_is_truncated() {
        let bytes = encode(&sample()).unwrap();
        for len in 0..bytes.len() {
            assert_eq!(
                decode(&bytes[..len]),
                Err(CoinError::TruncatedInput),
                "prefix of {len} bytes"
            );
        }
    }

    #[test]
    fn declared_key_length_past_end_is_truncated() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 0);
        put_u32(&mut bytes, 8);
        put_u32(&mut bytes, 65);
        bytes.extend_from_slice(&[0x04; 40]);
        assert_eq!(decode(&bytes), Err(CoinError::TruncatedInput));
    }

    #[test]
    fn negative_length_is_malformed() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 0);
        put_u32(&mut bytes, 8);
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        assert_eq!(decode(&bytes), Err(CoinError::MalformedLength));
    }

    #[test]
    fn negative_bits_are_malformed() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 0);
        put_u32(&mut bytes, 0xFFFF_FFFF);
        bytes.extend_from_slice(&[0u8; 16]);
        assert_eq!(decode(&bytes), Err(CoinError::MalformedLength));

        let mut record = sample();
        record.bits = i32::MAX as u32;
        assert_eq!(decode(&encode(&record).unwrap()).unwrap(), record);
        record.bits = i32::MAX as u32 + 1;
        assert_eq!(
            decode(&encode(&record).unwrap()),
            Err(CoinError::MalformedLength)
        );
    }

    #[test]
    fn hash_input_len_matches_and_saturates() {
        let record = sample();
        assert_eq!(
            hash_input_len(record.public_key.len(), record.nonce.len()),
            Some(record.hash_input().len())
        );
        assert_eq!(hash_input_len(65, usize::MAX), None);
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.push(0);
        assert_eq!(decode(&bytes), Err(CoinError::MalformedLength));
    }

    #[test]
    fn unknown_ciphersuite_is_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[3] = 9;
        assert_eq!(decode(&bytes), Err(CoinError::UnsupportedCiphersuite(9)));
    }

    #[test]
    fn capacity_bounds_encode_and_decode() {
        let mut record = sample();
        record.nonce = vec![0; COIN_CAPACITY];
        let err = encode(&record).unwrap_err();
        assert!(matches!(
            err,
            CoinError::EncodingTooLarge { capacity: COIN_CAPACITY, .. }
        ));

        let bytes = encode_with_capacity(&record, 4 * COIN_CAPACITY).unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(CoinError::EncodingTooLarge { .. })
        ));
        assert_eq!(decode_with_capacity(&bytes, 4 * COIN_CAPACITY).unwrap(), record);
    }

    #[test]
    fn serde_json_roundtrip() {
        let record = sample();
        let s = serde_json::to_string(&record).unwrap();
        let back: CoinRecord = serde_json::from_str(&s).unwrap();
        assert_eq!(record, back);
    }
}
