//! # Secure Plaintext Types
//!
//! Wrappers for codec-encoded sensitive values that zeroize memory on drop.
//!
//! Both sides of the sealed box handle these: the encryption client before
//! sealing and the registry response after opening. Debug output never shows
//! the bytes.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Codec wire form of one sensitive value, zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CodecInput {
    inner: Vec<u8>,
}

impl CodecInput {
    /// Wrap encoded bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { inner: bytes }
    }

    /// Get the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Encoded length.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for CodecInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CodecInput(***)")
    }
}

/// Plaintext sensitive fields returned by an authorized decryption.
///
/// Still in codec wire form; the lifecycle manager decodes them.
#[derive(Clone)]
pub struct DecryptedFields {
    /// Encoded pricing tier.
    pub pricing_tier: CodecInput,
    /// Encoded distribution window.
    pub distribution_window: CodecInput,
}

impl std::fmt::Debug for DecryptedFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DecryptedFields(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_input_debug_hides_value() {
        let input = CodecInput::new(vec![0x01, 0x01, 0x02]);
        let debug_str = format!("{:?}", input);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains('1'));
    }

    #[test]
    fn test_codec_input_accessors() {
        let input = CodecInput::new(vec![0xAB; 3]);
        assert_eq!(input.len(), 3);
        assert!(!input.is_empty());
        assert_eq!(input.as_bytes()[0], 0xAB);
    }

    #[test]
    fn test_decrypted_fields_debug_hides_value() {
        let fields = DecryptedFields {
            pricing_tier: CodecInput::new(vec![1, 1, 1]),
            distribution_window: CodecInput::new(vec![1, 2, 1]),
        };
        assert_eq!(format!("{:?}", fields), "DecryptedFields(***)");
    }
}
