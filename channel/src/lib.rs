//! KEM-secured point-to-point transport.
//!
//! Two peers perform a lattice-KEM handshake to agree on a shared session
//! secret, then exchange length-framed, stream-cipher-encrypted application
//! data over that secret.
//!
//! # Protocol overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Handshake phase                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  1. Public keys      │  both directions, 2-byte BE framing   │
//! │  2. Ciphertexts      │  one encapsulation per peer           │
//! │  3. Session secret   │  S1 ‖ S2, identical on both roles     │
//! ├──────────────────────────────────────────────────────────────┤
//! │                          Data phase                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  [4-byte BE length][AES-256-CTR ciphertext], ≤ 64 KiB        │
//! │  independent keystream cursors per direction                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! No version byte and no negotiation travel on the wire; both peers hold
//! compatible KEM identities agreed out of band.
//!
//! # Example
//!
//! ```rust,ignore
//! use qs_channel::{handshake_initiator, ChannelConfig, KemAlgorithm, KemKeyPair};
//!
//! let identity = KemKeyPair::generate(KemAlgorithm::MlKem768);
//! let socket = tokio::net::TcpStream::connect(addr).await?;
//! let mut channel = handshake_initiator(socket, &identity, &ChannelConfig::default()).await?;
//! channel.write(b"hello over lattice").await?;
//! ```

pub mod channel;
pub mod cipher;
pub mod config;
pub mod error;
pub mod event;
pub mod frame;
pub mod handshake;

pub use channel::SecureChannel;
pub use cipher::{Role, MIN_SESSION_SECRET_LEN};
pub use config::ChannelConfig;
pub use error::{ChannelError, HandshakeError, Result};
pub use event::{ChannelEvent, EventSink, NullSink, TracingSink};
pub use frame::{MAX_FRAME_LEN, MAX_HANDSHAKE_PAYLOAD_LEN};
pub use handshake::{handshake_initiator, handshake_responder};

pub use kem::{Kem, KemAlgorithm, KemError, KemKeyPair};
