//! Data-phase cipher state derived from a completed handshake.
//!
//! The session secret keys a single AES-256 instance; the two directions of
//! traffic run over two independent CTR keystreams so that a byte sent never
//! shares keystream with a byte received. Each cursor advances only on its
//! own direction's traffic and is never rewound or replayed.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

use crate::error::{ChannelError, Result};

type Aes256Ctr = Ctr128BE<Aes256>;

/// Minimum session secret accepted at channel construction.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Which side of the handshake this endpoint played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Paired send/receive keystream cursors for one channel.
pub(crate) struct ChannelCipher {
    send: Aes256Ctr,
    recv: Aes256Ctr,
}

impl core::fmt::Debug for ChannelCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelCipher").finish_non_exhaustive()
    }
}

impl ChannelCipher {
    /// Key both directions from the session secret.
    ///
    /// Key material is the first 32 bytes; the IV is the next 16, zero
    /// padded when the secret supplies fewer than 48 bytes. The
    /// responder-to-initiator keystream flips the top bit of the leading IV
    /// byte, which places the two CTR counter spaces 2^120 blocks apart.
    pub fn new(session_secret: &[u8], role: Role) -> Result<Self> {
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ChannelError::ShortSessionSecret {
                actual: session_secret.len(),
            });
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&session_secret[..KEY_LEN]);

        let mut iv_i2r = [0u8; IV_LEN];
        let tail = &session_secret[KEY_LEN..session_secret.len().min(KEY_LEN + IV_LEN)];
        iv_i2r[..tail.len()].copy_from_slice(tail);
        let mut iv_r2i = iv_i2r;
        iv_r2i[0] ^= 0x80;

        let i2r = Aes256Ctr::new(&key.into(), &iv_i2r.into());
        let r2i = Aes256Ctr::new(&key.into(), &iv_r2i.into());

        let (send, recv) = match role {
            Role::Initiator => (i2r, r2i),
            Role::Responder => (r2i, i2r),
        };
        Ok(Self { send, recv })
    }

    /// Encrypt outgoing plaintext in place, advancing the send cursor.
    pub fn encrypt(&mut self, buffer: &mut [u8]) {
        self.send.apply_keystream(buffer);
    }

    /// Decrypt an incoming frame in place, advancing the receive cursor.
    pub fn decrypt(&mut self, buffer: &mut [u8]) {
        self.recv.apply_keystream(buffer);
    }
}
