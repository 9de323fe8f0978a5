//! Encrypted byte-stream interface over a handshaked connection.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::cipher::{ChannelCipher, Role};
use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::event::{ChannelEvent, EventSink};
use crate::frame;

/// A secure channel over one connection: encrypt-on-write, decrypt-on-read,
/// with frame boundaries hidden behind a byte-stream `read`.
///
/// One channel serves exactly one connection. Writes advance the send
/// keystream cursor and reads advance the receive cursor, so each direction
/// needs a single owner; the two directions are independent and may run
/// concurrently from separate owners (split the channel behind your own
/// synchronization if that is needed).
pub struct SecureChannel<S> {
    stream: S,
    cipher: ChannelCipher,
    role: Role,
    max_frame_len: usize,
    events: Arc<dyn EventSink>,
    peer_fingerprint: [u8; 32],
    /// Decrypted bytes from the last frame not yet handed to the caller.
    pending: Vec<u8>,
    pending_offset: usize,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S> core::fmt::Debug for SecureChannel<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecureChannel")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl<S> SecureChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-handshaked connection. The session secret must be at
    /// least 32 bytes; it is consumed here to key the cipher and is not
    /// retained.
    pub(crate) fn new(
        stream: S,
        session_secret: &[u8],
        role: Role,
        config: &ChannelConfig,
        peer_fingerprint: [u8; 32],
    ) -> Result<Self> {
        let cipher = ChannelCipher::new(session_secret, role)?;
        Ok(Self {
            stream,
            cipher,
            role,
            max_frame_len: config.max_frame_len,
            events: Arc::clone(&config.events),
            peer_fingerprint,
            pending: Vec::new(),
            pending_offset: 0,
            bytes_sent: 0,
            bytes_received: 0,
        })
    }

    /// Encrypt `plaintext` and send it as one frame.
    ///
    /// Empty input is a no-op returning 0 without touching the keystream.
    /// Returns the number of plaintext bytes accepted, excluding frame
    /// overhead.
    pub async fn write(&mut self, plaintext: &[u8]) -> Result<usize> {
        if plaintext.is_empty() {
            return Ok(0);
        }
        if plaintext.len() > self.max_frame_len {
            // Rejected before the cursor advances, so the channel stays
            // usable after the error.
            return Err(ChannelError::FrameTooLarge {
                length: plaintext.len(),
                max: self.max_frame_len,
            });
        }

        let mut body = plaintext.to_vec();
        self.cipher.encrypt(&mut body);
        frame::write_frame(&mut self.stream, &body).await?;

        self.bytes_sent += plaintext.len() as u64;
        self.events.emit(&ChannelEvent::FrameWritten {
            plaintext_len: plaintext.len(),
        });
        Ok(plaintext.len())
    }

    /// Read decrypted bytes into `buf`, reading one frame from the wire when
    /// no buffered bytes remain.
    ///
    /// When a decrypted frame is larger than `buf`, the excess is buffered
    /// and served by subsequent calls; frame contents are never discarded.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pending_offset >= self.pending.len() {
            let mut body = match frame::read_frame(&mut self.stream, self.max_frame_len).await {
                Ok(body) => body,
                Err(ChannelError::FrameTooLarge { length, max }) => {
                    self.events.emit(&ChannelEvent::FrameRejected {
                        declared_len: length,
                        max,
                    });
                    return Err(ChannelError::FrameTooLarge { length, max });
                }
                Err(other) => return Err(other),
            };
            self.cipher.decrypt(&mut body);
            self.bytes_received += body.len() as u64;
            self.events.emit(&ChannelEvent::FrameRead {
                plaintext_len: body.len(),
            });
            self.pending = body;
            self.pending_offset = 0;
        }

        let available = &self.pending[self.pending_offset..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.pending_offset += count;
        Ok(count)
    }

    /// Shut down the underlying connection.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Which side of the handshake this endpoint played.
    pub fn role(&self) -> Role {
        self.role
    }

    /// SHA-256 of the peer's KEM public key.
    pub fn peer_fingerprint(&self) -> [u8; 32] {
        self.peer_fingerprint
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Access the wrapped connection, e.g. for addresses or socket options.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the connection, dropping the cipher state.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MAX_FRAME_LEN;
    use std::sync::Mutex;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    fn channel_pair(
        secret: &[u8],
        config: &ChannelConfig,
    ) -> (SecureChannel<DuplexStream>, SecureChannel<DuplexStream>) {
        let (a, b) = duplex(2 * MAX_FRAME_LEN + 64);
        let initiator = SecureChannel::new(a, secret, Role::Initiator, config, [0u8; 32]).unwrap();
        let responder = SecureChannel::new(b, secret, Role::Responder, config, [0u8; 32]).unwrap();
        (initiator, responder)
    }

    async fn read_exactly(
        channel: &mut SecureChannel<DuplexStream>,
        total: usize,
    ) -> Vec<u8> {
        let mut out = vec![0u8; total];
        let mut filled = 0;
        while filled < total {
            let n = channel.read(&mut out[filled..]).await.unwrap();
            assert!(n > 0, "read returned 0 before {total} bytes arrived");
            filled += n;
        }
        out
    }

    #[tokio::test]
    async fn round_trip_boundary_lengths() {
        let config = ChannelConfig::default();
        let (mut tx, mut rx) = channel_pair(&[0x33; 48], &config);

        for len in [1usize, 1024, 65535, 65536] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let written = tx.write(&payload).await.unwrap();
            assert_eq!(written, len);
            let received = read_exactly(&mut rx, len).await;
            assert_eq!(received, payload);
        }
    }

    #[tokio::test]
    async fn empty_write_is_a_no_op() {
        let config = ChannelConfig::default();
        let (mut tx, rx) = channel_pair(&[0x33; 48], &config);

        assert_eq!(tx.write(&[]).await.unwrap(), 0);
        assert_eq!(tx.bytes_sent(), 0);

        // Nothing was framed: the peer's stream holds no bytes.
        drop(tx);
        let mut raw = rx.into_inner();
        let mut buf = [0u8; 8];
        let n = tokio::io::AsyncReadExt::read(&mut raw, &mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn oversized_write_rejected_locally() {
        let config = ChannelConfig::default();
        let (mut tx, _rx) = channel_pair(&[0x33; 48], &config);

        let payload = vec![0u8; MAX_FRAME_LEN + 1];
        let err = tx.write(&payload).await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::FrameTooLarge { length, max }
                if length == MAX_FRAME_LEN + 1 && max == MAX_FRAME_LEN
        ));

        // The cursor did not advance, so the channel still works.
        assert_eq!(tx.write(b"still fine").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn small_buffer_reads_drain_one_frame() {
        let config = ChannelConfig::default();
        let (mut tx, mut rx) = channel_pair(&[0x44; 48], &config);

        let payload: Vec<u8> = (0..100).collect();
        tx.write(&payload).await.unwrap();

        let mut reassembled = Vec::new();
        let mut buf = [0u8; 7];
        while reassembled.len() < payload.len() {
            let n = rx.read(&mut buf).await.unwrap();
            reassembled.extend_from_slice(&buf[..n]);
        }
        assert_eq!(reassembled, payload);
    }

    #[tokio::test]
    async fn forged_oversized_header_fails_read() {
        let config = ChannelConfig::default();
        let (raw, b) = duplex(256);
        let mut attacker = raw;
        let mut channel =
            SecureChannel::new(b, &[0x55; 48], Role::Responder, &config, [0u8; 32]).unwrap();

        let declared = (MAX_FRAME_LEN as u32) + 7;
        attacker.write_all(&declared.to_be_bytes()).await.unwrap();

        let mut buf = [0u8; 32];
        let err = channel.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, ChannelError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn short_session_secret_rejected_at_construction() {
        let config = ChannelConfig::default();
        let (a, _b) = duplex(64);
        let err =
            SecureChannel::new(a, &[0u8; 16], Role::Initiator, &config, [0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::ShortSessionSecret { actual: 16 }
        ));
    }

    #[tokio::test]
    async fn full_duplex_directions_are_independent() {
        let config = ChannelConfig::default();
        let (mut left, mut right) = channel_pair(&[0x66; 48], &config);

        // Queue traffic both ways before either side reads.
        left.write(b"left to right").await.unwrap();
        right.write(b"right to left").await.unwrap();
        left.write(b"left again").await.unwrap();

        assert_eq!(read_exactly(&mut right, 13).await, b"left to right");
        assert_eq!(read_exactly(&mut left, 13).await, b"right to left");
        assert_eq!(read_exactly(&mut right, 10).await, b"left again");
    }

    struct CollectingSink(Mutex<Vec<ChannelEvent>>);

    impl EventSink for CollectingSink {
        fn emit(&self, event: &ChannelEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn events_report_frame_traffic() {
        let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
        let config = ChannelConfig::new().with_event_sink(sink.clone());
        let (mut tx, mut rx) = channel_pair(&[0x77; 48], &config);

        tx.write(b"hello").await.unwrap();
        let mut buf = [0u8; 8];
        rx.read(&mut buf).await.unwrap();

        let events = sink.0.lock().unwrap().clone();
        assert!(events.contains(&ChannelEvent::FrameWritten { plaintext_len: 5 }));
        assert!(events.contains(&ChannelEvent::FrameRead { plaintext_len: 5 }));
    }

    #[tokio::test]
    async fn byte_counters_track_plaintext() {
        let config = ChannelConfig::default();
        let (mut tx, mut rx) = channel_pair(&[0x88; 48], &config);

        tx.write(&[1, 2, 3, 4]).await.unwrap();
        tx.write(&[5, 6]).await.unwrap();
        read_exactly(&mut rx, 6).await;

        assert_eq!(tx.bytes_sent(), 6);
        assert_eq!(rx.bytes_received(), 6);
    }
}
