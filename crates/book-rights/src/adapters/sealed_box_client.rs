//! Sealed Box Encryption Client
//!
//! Implements `FieldEncryptor` by sealing each field to the registry's
//! public sealing key.

use crate::algorithms::field_codec::ENCODED_LEN;
use crate::domain::{BookRightsError, Ciphertext, CodecInput};
use crate::ports::outbound::FieldEncryptor;
use parking_lot::RwLock;
use shared_crypto::{seal, SealingPublicKey};
use tracing::{debug, info};

/// Encryption client holding the registry's public parameters.
///
/// Starts uninitialized when the registry key is not known yet; sealing
/// then fails with `Encryption` until [`initialize`](Self::initialize).
#[derive(Debug, Default)]
pub struct SealedBoxEncryptionClient {
    recipient: RwLock<Option<SealingPublicKey>>,
}

impl SealedBoxEncryptionClient {
    /// Client sealing to `recipient`.
    pub fn new(recipient: SealingPublicKey) -> Self {
        Self {
            recipient: RwLock::new(Some(recipient)),
        }
    }

    /// Client with no public parameters yet.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Install (or rotate) the registry public key.
    pub fn initialize(&self, recipient: SealingPublicKey) {
        info!(
            "[book-rights] Encryption context initialized for registry key {}",
            hex::encode(&recipient.as_bytes()[..4])
        );
        *self.recipient.write() = Some(recipient);
    }

    /// Whether public parameters are present.
    pub fn is_initialized(&self) -> bool {
        self.recipient.read().is_some()
    }
}

impl FieldEncryptor for SealedBoxEncryptionClient {
    fn encrypt(
        &self,
        input: &CodecInput,
        associated_data: &[u8],
    ) -> Result<Ciphertext, BookRightsError> {
        let recipient = (*self.recipient.read()).ok_or_else(|| {
            BookRightsError::Encryption("encryption context not initialized".to_string())
        })?;

        if input.len() != ENCODED_LEN {
            return Err(BookRightsError::Encryption(format!(
                "malformed input: expected {} bytes, got {}",
                ENCODED_LEN,
                input.len()
            )));
        }

        let envelope = seal(&recipient, input.as_bytes(), associated_data)
            .map_err(|e| BookRightsError::Encryption(e.to_string()))?;
        let ciphertext = Ciphertext::from_bytes(envelope);

        debug!(
            len = ciphertext.len(),
            digest = %ciphertext.short_digest(),
            "[book-rights] Field sealed"
        );
        Ok(ciphertext)
    }
}
