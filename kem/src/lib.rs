//! KEM identities for the QS secure transport.
//!
//! Provides the algorithm enumeration, size validation, and the [`Kem`]
//! trait the handshake layer consumes, together with a synthetic
//! hash-expansion primitive standing in for the external lattice
//! implementation. The synthetic primitive preserves the contract the
//! transport relies on:
//!
//! - `encapsulate(peer_pk)` returns `(ciphertext, shared_secret)` and the
//!   holder of the matching private key recovers the same secret via
//!   `decapsulate(ciphertext)`;
//! - encapsulation is randomized, so repeated handshakes between the same
//!   identities derive distinct session secrets;
//! - key and ciphertext sizes match the declared parameter set.

pub mod algorithm;
pub mod deterministic;
pub mod error;
pub mod kem;

pub use algorithm::{KemAlgorithm, SHARED_SECRET_LEN};
pub use error::{KemError, Result};
pub use kem::{Kem, KemKeyPair, KemPublicKey, KemSecretKey, SharedSecret};
