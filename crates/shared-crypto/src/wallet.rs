//! # Wallet Keys
//!
//! secp256k1 wallet identities: the keys that authorize registry
//! submissions and the 20-byte addresses registries record them under.
//!
//! Messages are hashed with Keccak-256 before signing, the convention wallets
//! use for their own addresses. Signatures are RFC 6979 deterministic and
//! low-S normalized by `k256`.

use crate::CryptoError;
use k256::ecdsa::signature::{DigestSigner, DigestVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_KEY_LEN: usize = 33;

/// Length of an `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// Wallet address: trailing 20 bytes of Keccak-256 over the uncompressed key.
pub type WalletAddress = [u8; 20];

/// Public half of a wallet, compressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WalletPublicKey([u8; COMPRESSED_KEY_LEN]);

impl WalletPublicKey {
    /// Parse a compressed key, rejecting points off the curve.
    pub fn from_bytes(bytes: [u8; COMPRESSED_KEY_LEN]) -> Result<Self, CryptoError> {
        decode_point(&bytes)?;
        Ok(Self(bytes))
    }

    /// Parse from a slice of exactly [`COMPRESSED_KEY_LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes = <[u8; COMPRESSED_KEY_LEN]>::try_from(slice)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(bytes)
    }

    /// Compressed encoding.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_KEY_LEN] {
        &self.0
    }

    /// Check `signature` over `message`.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` for a non-canonical encoding,
    /// `SignatureVerificationFailed` if it was made by another key or over
    /// another message.
    pub fn verify(&self, message: &[u8], signature: &WalletSignature) -> Result<(), CryptoError> {
        let signature =
            Signature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;
        VerifyingKey::from(&decode_point(&self.0)?)
            .verify_digest(Keccak256::new_with_prefix(message), &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// Address this wallet is known by.
    pub fn to_address(&self) -> Result<WalletAddress, CryptoError> {
        let uncompressed = decode_point(&self.0)?.to_encoded_point(false);
        let digest = Keccak256::digest(&uncompressed.as_bytes()[1..]);

        let mut address = WalletAddress::default();
        let start = digest.len() - address.len();
        address.copy_from_slice(&digest[start..]);
        Ok(address)
    }
}

/// Wallet signature, `r || s`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletSignature([u8; SIGNATURE_LEN]);

impl WalletSignature {
    /// Wrap raw bytes. Validity is checked at verification time.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

/// Wallet signing key. The secret scalar is wiped on drop by `k256`.
pub struct WalletKeyPair {
    signing_key: SigningKey,
}

impl WalletKeyPair {
    /// Fresh random wallet.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Restore a wallet from its 32-byte secret.
    pub fn from_secret(secret: [u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_slice(&secret)
            .map(|signing_key| Self { signing_key })
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Public half.
    pub fn public_key(&self) -> WalletPublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; COMPRESSED_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        WalletPublicKey(bytes)
    }

    /// Sign the Keccak-256 digest of `message`.
    pub fn sign(&self, message: &[u8]) -> WalletSignature {
        let signature: Signature = self
            .signing_key
            .sign_digest(Keccak256::new_with_prefix(message));
        WalletSignature(signature.to_bytes().into())
    }
}

impl std::fmt::Debug for WalletKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

fn decode_point(bytes: &[u8]) -> Result<k256::PublicKey, CryptoError> {
    k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)
}
