//! Structured channel events.
//!
//! The channel reports what happened through an [`EventSink`] the caller
//! supplies, instead of writing to a global log sink itself. [`TracingSink`]
//! is the bridge for callers that do want events in their `tracing` output.

use crate::cipher::Role;

/// Events emitted by the handshake and the secure channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A handshake reached `SecretDerived` and produced a usable channel.
    HandshakeCompleted {
        role: Role,
        /// SHA-256 of the peer's KEM public key.
        peer_fingerprint: [u8; 32],
        session_secret_len: usize,
    },
    /// One plaintext frame was encrypted and written.
    FrameWritten { plaintext_len: usize },
    /// One frame was read and decrypted.
    FrameRead { plaintext_len: usize },
    /// An incoming frame header declared a length above the maximum and the
    /// read was aborted.
    FrameRejected { declared_len: usize, max: usize },
}

/// Subscriber interface for channel events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ChannelEvent);
}

/// Discards all events. The default sink.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ChannelEvent) {}
}

/// Forwards events to `tracing`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ChannelEvent) {
        match event {
            ChannelEvent::HandshakeCompleted {
                role,
                peer_fingerprint,
                session_secret_len,
            } => {
                tracing::info!(
                    ?role,
                    peer = %hex::encode(&peer_fingerprint[..8]),
                    session_secret_len,
                    "handshake completed"
                );
            }
            ChannelEvent::FrameWritten { plaintext_len } => {
                tracing::trace!(plaintext_len, "frame written");
            }
            ChannelEvent::FrameRead { plaintext_len } => {
                tracing::trace!(plaintext_len, "frame read");
            }
            ChannelEvent::FrameRejected { declared_len, max } => {
                tracing::warn!(declared_len, max, "oversized frame rejected");
            }
        }
    }
}
