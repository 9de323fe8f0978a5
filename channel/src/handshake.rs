//! Two-role KEM handshake producing a [`SecureChannel`].
//!
//! Both peers exchange public keys, then ciphertexts, each under 2-byte
//! length framing. Each side contributes one encapsulation; the session
//! secret is the concatenation of the two 32-byte shared secrets with the
//! initiator-encapsulated secret first, so both roles derive byte-identical
//! key material.
//!
//! State machine: `Start → PublicKeysExchanged → CiphertextsExchanged →
//! SecretDerived`. Any I/O or KEM failure at any step returns immediately;
//! there is no retry or resumption, and no timeout of its own — callers
//! bound the handshake with their own deadline (e.g. `tokio::time::timeout`)
//! and restart on a fresh connection.

use kem::Kem;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::channel::SecureChannel;
use crate::cipher::Role;
use crate::config::ChannelConfig;
use crate::error::Result;
use crate::event::ChannelEvent;
use crate::frame::{read_handshake_payload, write_handshake_payload};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandshakeState {
    Start,
    PublicKeysExchanged,
    CiphertextsExchanged,
    SecretDerived,
}

#[derive(Debug)]
pub(crate) struct HandshakeOutcome {
    pub session_secret: Vec<u8>,
    pub peer_fingerprint: [u8; 32],
}

/// Perform the handshake as the connecting peer and wrap the connection.
pub async fn handshake_initiator<S, K>(
    mut conn: S,
    identity: &K,
    config: &ChannelConfig,
) -> Result<SecureChannel<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    K: Kem + ?Sized,
{
    let outcome = initiator_exchange(&mut conn, identity).await?;
    complete(conn, outcome, Role::Initiator, config)
}

/// Perform the handshake as the accepting peer and wrap the connection.
pub async fn handshake_responder<S, K>(
    mut conn: S,
    identity: &K,
    config: &ChannelConfig,
) -> Result<SecureChannel<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    K: Kem + ?Sized,
{
    let outcome = responder_exchange(&mut conn, identity).await?;
    complete(conn, outcome, Role::Responder, config)
}

fn complete<S>(
    conn: S,
    outcome: HandshakeOutcome,
    role: Role,
    config: &ChannelConfig,
) -> Result<SecureChannel<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let channel = SecureChannel::new(
        conn,
        &outcome.session_secret,
        role,
        config,
        outcome.peer_fingerprint,
    )?;
    config.events.emit(&ChannelEvent::HandshakeCompleted {
        role,
        peer_fingerprint: outcome.peer_fingerprint,
        session_secret_len: outcome.session_secret.len(),
    });
    Ok(channel)
}

pub(crate) async fn initiator_exchange<S, K>(
    conn: &mut S,
    identity: &K,
) -> Result<HandshakeOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    K: Kem + ?Sized,
{
    let mut state = HandshakeState::Start;
    tracing::trace!(?state, algorithm = %identity.algorithm(), "initiator handshake");

    write_handshake_payload(conn, "public key", identity.public_key()).await?;
    let peer_public_key = read_handshake_payload(conn, "public key").await?;
    state = HandshakeState::PublicKeysExchanged;
    tracing::trace!(?state, peer_public_key_len = peer_public_key.len(), "exchanged keys");

    let (ciphertext, encap_secret) = identity.encapsulate(&peer_public_key)?;
    write_handshake_payload(conn, "ciphertext", &ciphertext).await?;
    let peer_ciphertext = read_handshake_payload(conn, "ciphertext").await?;
    state = HandshakeState::CiphertextsExchanged;
    tracing::trace!(?state, peer_ciphertext_len = peer_ciphertext.len(), "exchanged ciphertexts");

    let decap_secret = identity.decapsulate(&peer_ciphertext)?;

    // Initiator-encapsulated secret first; the responder mirrors this so
    // both roles hold byte-identical session secrets.
    let session_secret = concat_secrets(encap_secret.as_bytes(), decap_secret.as_bytes());
    state = HandshakeState::SecretDerived;
    tracing::debug!(?state, session_secret_len = session_secret.len(), "initiator handshake complete");

    Ok(HandshakeOutcome {
        session_secret,
        peer_fingerprint: fingerprint(&peer_public_key),
    })
}

pub(crate) async fn responder_exchange<S, K>(
    conn: &mut S,
    identity: &K,
) -> Result<HandshakeOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    K: Kem + ?Sized,
{
    let mut state = HandshakeState::Start;
    tracing::trace!(?state, algorithm = %identity.algorithm(), "responder handshake");

    let peer_public_key = read_handshake_payload(conn, "public key").await?;
    write_handshake_payload(conn, "public key", identity.public_key()).await?;
    state = HandshakeState::PublicKeysExchanged;
    tracing::trace!(?state, peer_public_key_len = peer_public_key.len(), "exchanged keys");

    let peer_ciphertext = read_handshake_payload(conn, "ciphertext").await?;
    let decap_secret = identity.decapsulate(&peer_ciphertext)?;

    let (ciphertext, encap_secret) = identity.encapsulate(&peer_public_key)?;
    write_handshake_payload(conn, "ciphertext", &ciphertext).await?;
    state = HandshakeState::CiphertextsExchanged;
    tracing::trace!(?state, peer_ciphertext_len = peer_ciphertext.len(), "exchanged ciphertexts");

    // Decapsulated (initiator-encapsulated) secret first: same byte order
    // as the initiator's concatenation.
    let session_secret = concat_secrets(decap_secret.as_bytes(), encap_secret.as_bytes());
    state = HandshakeState::SecretDerived;
    tracing::debug!(?state, session_secret_len = session_secret.len(), "responder handshake complete");

    Ok(HandshakeOutcome {
        session_secret,
        peer_fingerprint: fingerprint(&peer_public_key),
    })
}

fn concat_secrets(first: &[u8], second: &[u8]) -> Vec<u8> {
    let mut secret = Vec::with_capacity(first.len() + second.len());
    secret.extend_from_slice(first);
    secret.extend_from_slice(second);
    secret
}

/// SHA-256 of a peer's KEM public key, used for logging and events.
fn fingerprint(public_key: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(public_key);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, HandshakeError};
    use kem::{KemAlgorithm, KemError, KemKeyPair, SharedSecret};
    use tokio::io::duplex;

    /// Deterministic KEM double: the shared secret is the ciphertext itself,
    /// so both peers trivially agree and every byte is predictable.
    struct StubKem {
        public_key: Vec<u8>,
        ciphertext: Vec<u8>,
    }

    impl Kem for StubKem {
        fn algorithm(&self) -> KemAlgorithm {
            KemAlgorithm::MlKem768
        }

        fn public_key(&self) -> &[u8] {
            &self.public_key
        }

        fn encapsulate(&self, peer_public_key: &[u8]) -> kem::Result<(Vec<u8>, SharedSecret)> {
            if peer_public_key.is_empty() {
                return Err(KemError::EmptyInput("peer public key"));
            }
            let secret = SharedSecret::from_bytes(&self.ciphertext)?;
            Ok((self.ciphertext.clone(), secret))
        }

        fn decapsulate(&self, ciphertext: &[u8]) -> kem::Result<SharedSecret> {
            if ciphertext.is_empty() {
                return Err(KemError::EmptyInput("ciphertext"));
            }
            SharedSecret::from_bytes(ciphertext)
        }
    }

    #[tokio::test]
    async fn fixed_pattern_scenario_derives_identical_secrets() {
        let initiator = StubKem {
            public_key: vec![0xAA; 32],
            ciphertext: vec![0x11; 32],
        };
        let responder = StubKem {
            public_key: vec![0xBB; 32],
            ciphertext: vec![0x22; 32],
        };

        let (mut conn_i, mut conn_r) = duplex(8192);
        let (outcome_i, outcome_r) = tokio::join!(
            initiator_exchange(&mut conn_i, &initiator),
            responder_exchange(&mut conn_r, &responder),
        );
        let outcome_i = outcome_i.unwrap();
        let outcome_r = outcome_r.unwrap();

        // S1 = initiator-encapsulated secret (= CTi under the stub),
        // S2 = responder-encapsulated secret (= CTr under the stub).
        let expected = [vec![0x11; 32], vec![0x22; 32]].concat();
        assert_eq!(outcome_i.session_secret, expected);
        assert_eq!(outcome_r.session_secret, expected);

        assert_eq!(outcome_i.peer_fingerprint, fingerprint(&[0xBB; 32]));
        assert_eq!(outcome_r.peer_fingerprint, fingerprint(&[0xAA; 32]));
    }

    #[tokio::test]
    async fn repeated_handshakes_produce_distinct_secrets() {
        let initiator = KemKeyPair::generate_deterministic(KemAlgorithm::MlKem768, b"init");
        let responder = KemKeyPair::generate_deterministic(KemAlgorithm::MlKem768, b"resp");

        let mut secrets = Vec::new();
        for _ in 0..2 {
            let (mut conn_i, mut conn_r) = duplex(8192);
            let (outcome_i, outcome_r) = tokio::join!(
                initiator_exchange(&mut conn_i, &initiator),
                responder_exchange(&mut conn_r, &responder),
            );
            let outcome_i = outcome_i.unwrap();
            let outcome_r = outcome_r.unwrap();
            assert_eq!(outcome_i.session_secret, outcome_r.session_secret);
            secrets.push(outcome_i.session_secret);
        }

        // Randomized encapsulation: same identities, fresh secrets.
        assert_ne!(secrets[0], secrets[1]);
    }

    #[tokio::test]
    async fn empty_public_key_fails_before_any_ciphertext() {
        let broken = StubKem {
            public_key: Vec::new(),
            ciphertext: vec![0x11; 32],
        };

        let (mut conn, _peer) = duplex(8192);
        let err = initiator_exchange(&mut conn, &broken).await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Handshake(HandshakeError::EmptyPayload("public key"))
        ));
    }

    #[tokio::test]
    async fn responder_rejects_zero_length_public_key() {
        use tokio::io::AsyncWriteExt;

        let identity = StubKem {
            public_key: vec![0xBB; 32],
            ciphertext: vec![0x22; 32],
        };

        let (mut malicious, mut conn) = duplex(64);
        malicious.write_all(&[0, 0]).await.unwrap();

        let err = responder_exchange(&mut conn, &identity).await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Handshake(HandshakeError::EmptyPayload("public key"))
        ));
    }

    #[tokio::test]
    async fn handshake_yields_working_channels() {
        let initiator = KemKeyPair::generate(KemAlgorithm::MlKem512);
        let responder = KemKeyPair::generate(KemAlgorithm::MlKem512);
        let config = ChannelConfig::default();

        let (conn_i, conn_r) = duplex(256 * 1024);
        let (channel_i, channel_r) = tokio::join!(
            handshake_initiator(conn_i, &initiator, &config),
            handshake_responder(conn_r, &responder, &config),
        );
        let mut channel_i = channel_i.unwrap();
        let mut channel_r = channel_r.unwrap();

        channel_i.write(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let n = channel_r.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        channel_r.write(b"pong").await.unwrap();
        let n = channel_i.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }
}
