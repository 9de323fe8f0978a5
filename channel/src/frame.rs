//! Length-prefixed framing over a raw byte stream.
//!
//! Two framing widths are in play, on purpose. Handshake artifacts (public
//! keys, ciphertexts) are bounded by 16-bit KEM sizes and travel under a
//! 2-byte big-endian prefix; application frames are bounded by the
//! configured channel maximum and travel under a 4-byte big-endian prefix.
//!
//! Reads loop until the requested byte count is satisfied or the stream
//! errors; writes emit the prefix and payload as one contiguous buffer.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ChannelError, HandshakeError, Result};

/// Maximum application frame payload, bounding buffer allocation per read.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Maximum handshake payload carried under the 2-byte prefix.
pub const MAX_HANDSHAKE_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Send one handshake payload as `[2-byte BE length][payload]`.
pub(crate) async fn write_handshake_payload<S>(
    stream: &mut S,
    what: &'static str,
    payload: &[u8],
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    if payload.is_empty() {
        return Err(HandshakeError::EmptyPayload(what).into());
    }
    if payload.len() > MAX_HANDSHAKE_PAYLOAD_LEN {
        return Err(HandshakeError::OversizedPayload {
            what,
            length: payload.len(),
            max: MAX_HANDSHAKE_PAYLOAD_LEN,
        }
        .into());
    }
    let mut frame = Vec::with_capacity(2 + payload.len());
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(payload);
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Receive one handshake payload. A zero length prefix is a peer protocol
/// violation and fails the handshake.
pub(crate) async fn read_handshake_payload<S>(
    stream: &mut S,
    what: &'static str,
) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;
    let length = u16::from_be_bytes(header) as usize;
    if length == 0 {
        return Err(HandshakeError::EmptyPayload(what).into());
    }
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Send one application frame as `[4-byte BE length][payload]` in a single
/// underlying write.
pub(crate) async fn write_frame<S>(stream: &mut S, payload: &[u8]) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Receive one application frame, rejecting declared lengths above `max`
/// before any payload byte is consumed.
pub(crate) async fn read_frame<S>(stream: &mut S, max: usize) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    let length = u32::from_be_bytes(header) as usize;
    if length > max {
        return Err(ChannelError::FrameTooLarge { length, max });
    }
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}
