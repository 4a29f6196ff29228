//! # Sealed Boxes
//!
//! Public-key encryption to a single recipient (ECIES-style):
//!
//! 1. Fresh ephemeral secp256k1 key, ECDH against the recipient key
//! 2. BLAKE3 `derive_key` over `shared_x || ephemeral_pub || recipient_pub`
//! 3. XChaCha20-Poly1305 with caller-supplied associated data
//!
//! ## Envelope Layout
//!
//! ```text
//! ┌────────────────────┬──────────────┬─────────────────────────┐
//! │ ephemeral pk (33)  │ nonce (24)   │ ciphertext ‖ tag (n+16) │
//! └────────────────────┴──────────────┴─────────────────────────┘
//! ```
//!
//! Every call draws a new ephemeral key and nonce, so sealing the same
//! plaintext twice yields unrelated envelopes.

use crate::hashing::blake3_derive_key;
use crate::wallet::COMPRESSED_KEY_LEN;
use crate::CryptoError;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

/// XChaCha20 nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// KDF context string. Changing it invalidates every stored envelope.
pub const SEALING_CONTEXT: &str = "book-rights 2024-01 sealed-box v1";

/// Fixed header in front of the AEAD ciphertext.
pub const HEADER_LEN: usize = COMPRESSED_KEY_LEN + NONCE_LEN;

/// Smallest well-formed envelope (empty plaintext).
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_LEN;

/// Recipient public key for sealing (compressed SEC1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealingPublicKey([u8; COMPRESSED_KEY_LEN]);

impl SealingPublicKey {
    /// Create from compressed bytes, validating the curve point.
    pub fn from_bytes(bytes: [u8; COMPRESSED_KEY_LEN]) -> Result<Self, CryptoError> {
        PublicKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_KEY_LEN] {
        &self.0
    }

    fn to_point(self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }
}

/// Recipient keypair able to open sealed envelopes.
pub struct SealingKeyPair {
    secret: k256::SecretKey,
}

impl SealingKeyPair {
    /// Generate a random keypair.
    pub fn generate() -> Self {
        Self {
            secret: k256::SecretKey::random(&mut rand::thread_rng()),
        }
    }

    /// Create from secret scalar bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        k256::SecretKey::from_slice(&bytes)
            .map(|secret| Self { secret })
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Public half, handed to encryption clients.
    pub fn public_key(&self) -> SealingPublicKey {
        SealingPublicKey(compress(&self.secret.public_key()))
    }

    /// Open an envelope produced by [`seal`] for this key with the same `aad`.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` if the envelope is truncated, `DecryptionFailed`
    /// if it was sealed for another key, tampered with, or bound to other
    /// associated data.
    pub fn open(&self, envelope: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if envelope.len() < MIN_ENVELOPE_LEN {
            return Err(CryptoError::MalformedEnvelope {
                expected: MIN_ENVELOPE_LEN,
                actual: envelope.len(),
            });
        }

        let (ephemeral_bytes, rest) = envelope.split_at(COMPRESSED_KEY_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let ephemeral = PublicKey::from_sec1_bytes(ephemeral_bytes)
            .map_err(|_| CryptoError::DecryptionFailed("invalid ephemeral key".to_string()))?;

        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), ephemeral.as_affine());
        let key = derive_envelope_key(
            shared.raw_secret_bytes().as_slice(),
            ephemeral_bytes,
            &self.public_key().0,
        );

        XChaCha20Poly1305::new((&*key).into())
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed("authentication failed".to_string()))
    }
}

impl std::fmt::Debug for SealingKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Seal `plaintext` for `recipient`, binding `aad` into the tag.
///
/// # Errors
///
/// `InvalidPublicKey` if the recipient key is not a curve point,
/// `EncryptionFailed` if the AEAD step fails.
pub fn seal(
    recipient: &SealingPublicKey,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let recipient_point = recipient.to_point()?;

    let ephemeral = EphemeralSecret::random(&mut rand::thread_rng());
    let ephemeral_public = compress(&ephemeral.public_key());
    let shared = ephemeral.diffie_hellman(&recipient_point);

    let key = derive_envelope_key(
        shared.raw_secret_bytes().as_slice(),
        &ephemeral_public,
        recipient.as_bytes(),
    );
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = XChaCha20Poly1305::new((&*key).into())
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut envelope = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    envelope.extend_from_slice(&ephemeral_public);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// One-envelope AEAD key, wiped on drop.
fn derive_envelope_key(
    shared_x: &[u8],
    ephemeral_public: &[u8],
    recipient: &[u8],
) -> Zeroizing<[u8; 32]> {
    let mut material =
        Vec::with_capacity(shared_x.len() + ephemeral_public.len() + recipient.len());
    material.extend_from_slice(shared_x);
    material.extend_from_slice(ephemeral_public);
    material.extend_from_slice(recipient);

    let key = Zeroizing::new(blake3_derive_key(SEALING_CONTEXT, &material));
    material.zeroize();
    key
}

fn compress(point: &PublicKey) -> [u8; COMPRESSED_KEY_LEN] {
    let encoded = point.to_encoded_point(true);
    let mut bytes = [0u8; COMPRESSED_KEY_LEN];
    bytes.copy_from_slice(encoded.as_bytes());
    bytes
}
