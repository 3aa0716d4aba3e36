use crate::error::CoinError;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Algorithm bundle selected by the leading identifier of a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum Ciphersuite {
    /// ECDSA over P-256 with SHA-256; public keys are SEC1 uncompressed points,
    /// signatures are DER encoded.
    EcdsaP256Sha256 = 0,
}

impl Ciphersuite {
    /// Wire identifier of this suite.
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Output width of the suite's hash, in bits.
    pub const fn digest_bits(self) -> u32 {
        match self {
            Self::EcdsaP256Sha256 => 256,
        }
    }

    /// Length of an encoded public key.
    pub const fn public_key_len(self) -> usize {
        match self {
            Self::EcdsaP256Sha256 => 65,
        }
    }

    /// Hash `data` with the suite's hash function.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::EcdsaP256Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Generate a fresh signing keypair from `rng`.
    pub fn generate_keypair<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<Keypair, CoinError> {
        match self {
            Self::EcdsaP256Sha256 => {
                let mut secret = [0u8; 32];
                rng.try_fill_bytes(&mut secret)
                    .map_err(|_| CoinError::KeypairGenerationFailed)?;
                // Rejects zero and scalars outside the group order.
                let signing_key = SigningKey::from_slice(&secret)
                    .map_err(|_| CoinError::KeypairGenerationFailed)?;
                secret.fill(0);
                Ok(Keypair {
                    suite: self,
                    signing_key,
                })
            }
        }
    }

    /// Check `signature` over `message` against an encoded `public_key`.
    ///
    /// Keys or signatures that do not parse count as a failed check.
    pub fn verify_signature(self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::EcdsaP256Sha256 => {
                let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
                    return false;
                };
                let Ok(signature) = Signature::from_der(signature) else {
                    return false;
                };
                key.verify(message, &signature).is_ok()
            }
        }
    }
}

impl TryFrom<u32> for Ciphersuite {
    type Error = CoinError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::EcdsaP256Sha256),
            other => Err(CoinError::UnsupportedCiphersuite(other)),
        }
    }
}

impl From<Ciphersuite> for u32 {
    fn from(suite: Ciphersuite) -> Self {
        suite.id()
    }
}

impl fmt::Display for Ciphersuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EcdsaP256Sha256 => write!(f, "ecdsa-p256-sha256"),
        }
    }
}

/// A private signing key together with the suite it belongs to.
pub struct Keypair {
    suite: Ciphersuite,
    signing_key: SigningKey,
}

impl Keypair {
    pub fn suite(&self) -> Ciphersuite {
        self.suite
    }

    /// Encoded public half, as embedded in a coin.
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    /// Sign `message`, returning the encoded signature.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CoinError> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|_| CoinError::SigningFailed)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("suite", &self.suite)
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// RNG that always fails, to exercise the keygen error path.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn sha256_digest_matches_known_vector() {
        let hash = Ciphersuite::EcdsaP256Sha256.digest(b"abc");
        assert_eq!(
            hex::encode(hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(
            Ciphersuite::try_from(0u32).unwrap(),
            Ciphersuite::EcdsaP256Sha256
        );
        assert_eq!(
            Ciphersuite::try_from(1u32),
            Err(CoinError::UnsupportedCiphersuite(1))
        );
    }

    #[test]
    fn public_key_is_uncompressed_sec1() {
        let mut rng = StdRng::seed_from_u64(1);
        let keypair = Ciphersuite::EcdsaP256Sha256
            .generate_keypair(&mut rng)
            .unwrap();
        let pk = keypair.public_key();
        assert_eq!(pk.len(), Ciphersuite::EcdsaP256Sha256.public_key_len());
        assert_eq!(pk[0], 0x04);
    }

    #[test]
    fn sign_then_verify() {
        let suite = Ciphersuite::EcdsaP256Sha256;
        let mut rng = StdRng::seed_from_u64(2);
        let keypair = suite.generate_keypair(&mut rng).unwrap();
        let sig = keypair.sign(b"coin body").unwrap();

        assert!(suite.verify_signature(&keypair.public_key(), b"coin body", &sig));
        assert!(!suite.verify_signature(&keypair.public_key(), b"coin bodY", &sig));
        assert!(!suite.verify_signature(&[0x04; 65], b"coin body", &sig));
        assert!(!suite.verify_signature(&keypair.public_key(), b"coin body", &[0x30, 0x00]));
    }

    #[test]
    fn failing_rng_reports_keygen_failure() {
        let err = Ciphersuite::EcdsaP256Sha256
            .generate_keypair(&mut BrokenRng)
            .unwrap_err();
        assert_eq!(err, CoinError::KeypairGenerationFailed);
    }

    #[test]
    fn serde_uses_wire_id() {
        let s = serde_json::to_string(&Ciphersuite::EcdsaP256Sha256).unwrap();
        assert_eq!(s, "0");
        assert!(serde_json::from_str::<Ciphersuite>("5").is_err());
    }
}
