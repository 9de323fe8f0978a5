//! Error types for the secure channel.

use thiserror::Error;

use crate::cipher::MIN_SESSION_SECRET_LEN;

/// Errors that can occur while establishing or using a secure channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// KEM operation failed (unsupported algorithm, empty or malformed input)
    #[error("kem error: {0}")]
    Kem(#[from] kem::KemError),

    /// Handshake protocol error
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// I/O error on the underlying connection; fatal to the current
    /// handshake or channel operation, never retried internally
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer declared a data frame larger than the configured maximum
    #[error("frame too large: declared {length} bytes, maximum {max}")]
    FrameTooLarge { length: usize, max: usize },

    /// Session secret handed to the channel was too short to key the cipher
    #[error(
        "session secret too short: {actual} bytes, need at least {MIN_SESSION_SECRET_LEN}"
    )]
    ShortSessionSecret { actual: usize },
}

/// Specific handshake errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// Peer advertised a zero-length payload where a key or ciphertext was
    /// expected
    #[error("peer sent an empty {0}")]
    EmptyPayload(&'static str),

    /// A handshake payload exceeds what the 2-byte framing can carry
    #[error("{what} too large for handshake framing: {length} bytes, maximum {max}")]
    OversizedPayload {
        what: &'static str,
        length: usize,
        max: usize,
    },
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
