//! Supported KEM parameter sets.

use core::fmt;

use crate::error::{KemError, Result};

/// Lattice KEM parameter set.
///
/// The variants differ only in key and ciphertext sizes. The algorithm is
/// agreed out of band by both peers; it is carried here for size validation
/// and logging, never negotiated on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KemAlgorithm {
    MlKem512,
    MlKem768,
    MlKem1024,
}

/// All KEM parameter sets share a 32-byte shared secret.
pub const SHARED_SECRET_LEN: usize = 32;

impl KemAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            KemAlgorithm::MlKem512 => "ml-kem-512",
            KemAlgorithm::MlKem768 => "ml-kem-768",
            KemAlgorithm::MlKem1024 => "ml-kem-1024",
        }
    }

    /// Parse an algorithm name as found in peer configuration.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "ml-kem-512" => Ok(KemAlgorithm::MlKem512),
            "ml-kem-768" => Ok(KemAlgorithm::MlKem768),
            "ml-kem-1024" => Ok(KemAlgorithm::MlKem1024),
            other => Err(KemError::UnsupportedAlgorithm(other.into())),
        }
    }

    pub const fn public_key_len(self) -> usize {
        match self {
            KemAlgorithm::MlKem512 => 800,
            KemAlgorithm::MlKem768 => 1184,
            KemAlgorithm::MlKem1024 => 1568,
        }
    }

    pub const fn secret_key_len(self) -> usize {
        match self {
            KemAlgorithm::MlKem512 => 1632,
            KemAlgorithm::MlKem768 => 2400,
            KemAlgorithm::MlKem1024 => 3168,
        }
    }

    pub const fn ciphertext_len(self) -> usize {
        match self {
            KemAlgorithm::MlKem512 => 768,
            KemAlgorithm::MlKem768 => 1088,
            KemAlgorithm::MlKem1024 => 1568,
        }
    }

    pub const fn shared_secret_len(self) -> usize {
        SHARED_SECRET_LEN
    }
}

impl fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
