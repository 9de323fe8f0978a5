//! KEM identity types and the encapsulation seam consumed by the handshake.
//!
//! The lattice arithmetic itself is out of scope for this repository; the
//! [`KemKeyPair`] here is a synthetic primitive with the correct interface,
//! sizes, and agreement property (`decapsulate(encapsulate(pk).0) ==
//! encapsulate(pk).1`), built from domain-separated SHA-256 expansion. A
//! production deployment substitutes a FIPS 203 implementation behind the
//! same [`Kem`] trait.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::{KemAlgorithm, SHARED_SECRET_LEN};
use crate::deterministic::{expand_to_length, DeterministicRng};
use crate::error::{KemError, Result};

/// Shared secret produced by one encapsulation or decapsulation.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_LEN],
}

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl SharedSecret {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(KemError::EmptyInput("shared secret"));
        }
        if bytes.len() != SHARED_SECRET_LEN {
            return Err(KemError::InvalidLength {
                what: "shared secret",
                algorithm: "any",
                expected: SHARED_SECRET_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; SHARED_SECRET_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// KEM public key, shared by value during the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KemPublicKey {
    algorithm: KemAlgorithm,
    bytes: Vec<u8>,
}

impl KemPublicKey {
    pub fn from_bytes(algorithm: KemAlgorithm, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(KemError::EmptyInput("public key"));
        }
        if bytes.len() != algorithm.public_key_len() {
            return Err(KemError::InvalidLength {
                what: "public key",
                algorithm: algorithm.name(),
                expected: algorithm.public_key_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algorithm,
            bytes: bytes.to_vec(),
        })
    }

    fn from_secret_bytes(algorithm: KemAlgorithm, secret: &[u8]) -> Self {
        let input = [algorithm.name().as_bytes(), secret].concat();
        let bytes = expand_to_length(b"qs-kem-pk", &input, algorithm.public_key_len());
        Self { algorithm, bytes }
    }

    pub fn algorithm(&self) -> KemAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// KEM private key. Never transmitted; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KemSecretKey {
    #[zeroize(skip)]
    algorithm: KemAlgorithm,
    bytes: Vec<u8>,
}

impl KemSecretKey {
    pub fn from_bytes(algorithm: KemAlgorithm, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(KemError::EmptyInput("private key"));
        }
        if bytes.len() != algorithm.secret_key_len() {
            return Err(KemError::InvalidLength {
                what: "private key",
                algorithm: algorithm.name(),
                expected: algorithm.secret_key_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algorithm,
            bytes: bytes.to_vec(),
        })
    }
}

/// The seam the handshake consumes: an identity bound to one algorithm that
/// can encapsulate to a peer key and decapsulate ciphertexts addressed to it.
///
/// Failures are local and abort the calling handshake step; nothing here
/// retries.
pub trait Kem {
    fn algorithm(&self) -> KemAlgorithm;

    /// The public key this identity transmits during a handshake.
    fn public_key(&self) -> &[u8];

    /// Create a ciphertext and shared secret for the holder of `peer_public_key`.
    fn encapsulate(&self, peer_public_key: &[u8]) -> Result<(Vec<u8>, SharedSecret)>;

    /// Recover the shared secret from a ciphertext addressed to this identity.
    fn decapsulate(&self, ciphertext: &[u8]) -> Result<SharedSecret>;
}

/// A KEM identity: algorithm plus key pair.
///
/// Constructed once per connection-establishing peer; safe to reuse across
/// handshakes (static identity keys) or regenerated per connection.
#[derive(Clone)]
pub struct KemKeyPair {
    algorithm: KemAlgorithm,
    public: KemPublicKey,
    secret: KemSecretKey,
}

impl KemKeyPair {
    /// Generate a fresh key pair from OS randomness.
    pub fn generate(algorithm: KemAlgorithm) -> Self {
        let mut secret_bytes = vec![0u8; algorithm.secret_key_len()];
        rand::thread_rng().fill_bytes(&mut secret_bytes);
        let pair = Self::from_secret_bytes(algorithm, &secret_bytes);
        secret_bytes.zeroize();
        pair
    }

    /// Generate a key pair deterministically from seed material.
    pub fn generate_deterministic(algorithm: KemAlgorithm, seed: &[u8]) -> Self {
        let mut rng = DeterministicRng::from_seed(seed);
        let mut secret_bytes = vec![0u8; algorithm.secret_key_len()];
        rng.fill_bytes(&mut secret_bytes);
        let pair = Self::from_secret_bytes(algorithm, &secret_bytes);
        secret_bytes.zeroize();
        pair
    }

    fn from_secret_bytes(algorithm: KemAlgorithm, secret_bytes: &[u8]) -> Self {
        let public = KemPublicKey::from_secret_bytes(algorithm, secret_bytes);
        let secret = KemSecretKey {
            algorithm,
            bytes: secret_bytes.to_vec(),
        };
        Self {
            algorithm,
            public,
            secret,
        }
    }

    /// Reconstruct an identity from stored key material.
    pub fn from_keys(
        algorithm: KemAlgorithm,
        secret_bytes: &[u8],
        public_bytes: &[u8],
    ) -> Result<Self> {
        let secret = KemSecretKey::from_bytes(algorithm, secret_bytes)?;
        let public = KemPublicKey::from_bytes(algorithm, public_bytes)?;
        Ok(Self {
            algorithm,
            public,
            secret,
        })
    }

    pub fn public(&self) -> &KemPublicKey {
        &self.public
    }

    /// Encapsulate with caller-supplied randomness. Exposed so callers with
    /// their own randomness discipline can drive it; [`Kem::encapsulate`]
    /// draws the seed from `thread_rng`.
    pub fn encapsulate_with_seed(
        &self,
        peer_public_key: &[u8],
        seed: &[u8],
    ) -> Result<(Vec<u8>, SharedSecret)> {
        if peer_public_key.is_empty() {
            return Err(KemError::EmptyInput("peer public key"));
        }
        if peer_public_key.len() != self.algorithm.public_key_len() {
            return Err(KemError::InvalidLength {
                what: "peer public key",
                algorithm: self.algorithm.name(),
                expected: self.algorithm.public_key_len(),
                actual: peer_public_key.len(),
            });
        }
        let ct_input = [peer_public_key, seed].concat();
        let ciphertext =
            expand_to_length(b"qs-kem-ct", &ct_input, self.algorithm.ciphertext_len());
        let shared = shared_secret_for(peer_public_key, &ciphertext)?;
        Ok((ciphertext, shared))
    }
}

fn shared_secret_for(recipient_public_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret> {
    let input = [recipient_public_key, ciphertext].concat();
    let bytes = expand_to_length(b"qs-kem-ss", &input, SHARED_SECRET_LEN);
    SharedSecret::from_bytes(&bytes)
}

impl Kem for KemKeyPair {
    fn algorithm(&self) -> KemAlgorithm {
        self.algorithm
    }

    fn public_key(&self) -> &[u8] {
        self.public.as_bytes()
    }

    fn encapsulate(&self, peer_public_key: &[u8]) -> Result<(Vec<u8>, SharedSecret)> {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        self.encapsulate_with_seed(peer_public_key, &seed)
    }

    fn decapsulate(&self, ciphertext: &[u8]) -> Result<SharedSecret> {
        if ciphertext.is_empty() {
            return Err(KemError::EmptyInput("ciphertext"));
        }
        if ciphertext.len() != self.algorithm.ciphertext_len() {
            return Err(KemError::InvalidLength {
                what: "ciphertext",
                algorithm: self.algorithm.name(),
                expected: self.algorithm.ciphertext_len(),
                actual: ciphertext.len(),
            });
        }
        // The decapsulation key is the secret; the synthetic secret recovery
        // runs through the public key it determines.
        let public = KemPublicKey::from_secret_bytes(self.algorithm, &self.secret.bytes);
        shared_secret_for(public.as_bytes(), ciphertext)
    }
}
