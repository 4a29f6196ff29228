//! # Outbound Ports
//!
//! Traits for external dependencies: the encryption primitive, the wallet
//! and the registry.

use crate::algorithms::{associated_data, encode_value, SensitiveValue};
use crate::domain::{
    AuthorizationSignature, BookRightsError, Ciphertext, CodecInput, DecryptedFields,
    DecryptionRequestPayload, EncryptedRecord, RegisteredBook, SensitiveFieldKind,
    SigningPayload, ValidatedDraft,
};
use async_trait::async_trait;
use shared_crypto::{WalletKeyPair, WalletPublicKey};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Encryption client - outbound port.
///
/// Local computation against public parameters supplied by the registry.
/// Output is randomized: equal inputs give unequal ciphertexts.
pub trait FieldEncryptor: Send + Sync {
    /// Seal one encoded value, binding `associated_data`.
    fn encrypt(
        &self,
        input: &CodecInput,
        associated_data: &[u8],
    ) -> Result<Ciphertext, BookRightsError>;

    /// Seal both sensitive fields of a validated draft.
    fn encrypt_record(&self, draft: &ValidatedDraft) -> Result<EncryptedRecord, BookRightsError> {
        let pricing_tier = encode_value(SensitiveValue::PricingTier(draft.pricing_tier));
        let distribution_window =
            encode_value(SensitiveValue::DistributionWindow(draft.distribution_window));

        let pricing_aad = associated_data(SensitiveFieldKind::PricingTier, &draft.metadata)?;
        let window_aad = associated_data(SensitiveFieldKind::DistributionWindow, &draft.metadata)?;

        Ok(EncryptedRecord {
            metadata: draft.metadata.clone(),
            pricing_tier: self.encrypt(&pricing_tier, &pricing_aad)?,
            distribution_window: self.encrypt(&distribution_window, &window_aad)?,
        })
    }
}

/// Authorization signer (wallet) - outbound port.
#[async_trait]
pub trait AuthorizationSigner: Send + Sync {
    /// Whether an identity is connected. Never prompts.
    fn is_connected(&self) -> bool;

    /// Ask the identity holder to sign. Suspends until they decide.
    ///
    /// `UserRejected` when declined, `SignerUnavailable` when disconnected.
    async fn sign(
        &self,
        payload: &SigningPayload,
    ) -> Result<AuthorizationSignature, BookRightsError>;
}

/// Registry gateway - outbound port.
///
/// Both submissions are non-idempotent at the registry. Implementations
/// never retry.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Register a sealed record. The registry assigns the id.
    async fn submit_registration(
        &self,
        record: &EncryptedRecord,
        signature: &AuthorizationSignature,
    ) -> Result<RegisteredBook, BookRightsError>;

    /// Request the plaintext of one record's sensitive fields.
    ///
    /// `Denied` is authoritative and terminal.
    async fn submit_decryption_request(
        &self,
        request: &DecryptionRequestPayload,
        signature: &AuthorizationSignature,
    ) -> Result<DecryptedFields, BookRightsError>;

    /// Every registered record, oldest first.
    async fn query_records(&self) -> Result<Vec<RegisteredBook>, BookRightsError>;
}

impl<T: FieldEncryptor + ?Sized> FieldEncryptor for Arc<T> {
    fn encrypt(
        &self,
        input: &CodecInput,
        associated_data: &[u8],
    ) -> Result<Ciphertext, BookRightsError> {
        (**self).encrypt(input, associated_data)
    }
}

#[async_trait]
impl<T: AuthorizationSigner + ?Sized> AuthorizationSigner for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn sign(
        &self,
        payload: &SigningPayload,
    ) -> Result<AuthorizationSignature, BookRightsError> {
        (**self).sign(payload).await
    }
}

#[async_trait]
impl<T: RegistryGateway + ?Sized> RegistryGateway for Arc<T> {
    async fn submit_registration(
        &self,
        record: &EncryptedRecord,
        signature: &AuthorizationSignature,
    ) -> Result<RegisteredBook, BookRightsError> {
        (**self).submit_registration(record, signature).await
    }

    async fn submit_decryption_request(
        &self,
        request: &DecryptionRequestPayload,
        signature: &AuthorizationSignature,
    ) -> Result<DecryptedFields, BookRightsError> {
        (**self).submit_decryption_request(request, signature).await
    }

    async fn query_records(&self) -> Result<Vec<RegisteredBook>, BookRightsError> {
        (**self).query_records().await
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock wallet for testing.
///
/// Signs with a real secp256k1 key so registries can verify it. Clones share
/// connection state, approval state and the prompt counter.
#[derive(Clone)]
pub struct MockSigner {
    keypair: Arc<WalletKeyPair>,
    connected: Arc<AtomicBool>,
    should_reject: Arc<AtomicBool>,
    prompts: Arc<AtomicUsize>,
    /// Time the "user" takes to answer a prompt.
    pub approval_delay: Option<Duration>,
}

impl MockSigner {
    /// Connected, approving signer for `keypair`.
    pub fn new(keypair: WalletKeyPair) -> Self {
        Self {
            keypair: Arc::new(keypair),
            connected: Arc::new(AtomicBool::new(true)),
            should_reject: Arc::new(AtomicBool::new(false)),
            prompts: Arc::new(AtomicUsize::new(0)),
            approval_delay: None,
        }
    }

    /// Builder: answer prompts after `delay`.
    pub fn with_approval_delay(mut self, delay: Duration) -> Self {
        self.approval_delay = Some(delay);
        self
    }

    /// Connect or disconnect the wallet.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make the user decline (or approve) future prompts.
    pub fn set_reject(&self, reject: bool) {
        self.should_reject.store(reject, Ordering::SeqCst);
    }

    /// Number of prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Signing key.
    pub fn public_key(&self) -> WalletPublicKey {
        self.keypair.public_key()
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new(WalletKeyPair::generate())
    }
}

#[async_trait]
impl AuthorizationSigner for MockSigner {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn sign(
        &self,
        payload: &SigningPayload,
    ) -> Result<AuthorizationSignature, BookRightsError> {
        if !self.is_connected() {
            return Err(BookRightsError::SignerUnavailable);
        }

        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.approval_delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_reject.load(Ordering::SeqCst) {
            return Err(BookRightsError::UserRejected);
        }

        let message = payload.signing_bytes()?;
        Ok(AuthorizationSignature {
            signer: self.keypair.public_key(),
            signature: self.keypair.sign(&message),
        })
    }
}
