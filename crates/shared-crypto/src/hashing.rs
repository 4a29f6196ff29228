//! # BLAKE3 Hashing
//!
//! Digests for ciphertext fingerprints and draft identity, and the key
//! derivation step of the sealed box.

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs, each prefixed with its length so that
/// `["ab", "c"]` and `["a", "bc"]` never collide.
pub fn blake3_hash_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for input in inputs {
        hasher.update(&(input.len() as u64).to_le_bytes());
        hasher.update(input);
    }
    *hasher.finalize().as_bytes()
}

/// Derive key from context and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, key_material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(blake3_hash(b"test"), blake3_hash(b"test"));
        assert_ne!(blake3_hash(b"input1"), blake3_hash(b"input2"));
    }

    #[test]
    fn test_hash_many_is_length_framed() {
        let h1 = blake3_hash_many(&[b"ab", b"c"]);
        let h2 = blake3_hash_many(&[b"a", b"bc"]);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_derive_key_depends_on_context() {
        let k1 = blake3_derive_key("book-rights sealed-box v1", b"shared secret");
        let k2 = blake3_derive_key("book-rights sealed-box v2", b"shared secret");
        assert_ne!(k1, k2);
    }
}
