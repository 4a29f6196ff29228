//! # Shared Crypto - Cryptographic Primitives for Book Rights
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `sealing` | secp256k1 ECDH + BLAKE3 KDF + XChaCha20-Poly1305 | Sealing rights fields to the registry |
//! | `hashing` | BLAKE3 | Ciphertext digests, draft fingerprints, key derivation |
//! | `wallet` | secp256k1 + Keccak-256 | Wallet authorization signatures, addresses |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit nonce, constant-time, side-channel immune
//! - **secp256k1**: RFC 6979 deterministic, low-S normalized, Keccak-256 prehash
//! - **Sealed boxes**: fresh ephemeral key per envelope (semantic security)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod sealing;
pub mod wallet;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{blake3_derive_key, blake3_hash, blake3_hash_many, Hash};
pub use sealing::{seal, SealingKeyPair, SealingPublicKey};
pub use wallet::{WalletAddress, WalletKeyPair, WalletPublicKey, WalletSignature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
