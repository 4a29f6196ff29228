//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, tampered envelope or wrong associated data)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Sealed envelope is shorter than its fixed header
    #[error("Malformed envelope: expected at least {expected} bytes, got {actual}")]
    MalformedEnvelope {
        /// Minimum envelope length in bytes
        expected: usize,
        /// Actual envelope length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature
    #[error("Invalid signature")]
    InvalidSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_envelope_message() {
        let err = CryptoError::MalformedEnvelope {
            expected: 73,
            actual: 10,
        };
        assert!(err.to_string().contains("73"));
        assert!(err.to_string().contains("10"));
    }
}
