//! # Domain Entities
//!
//! Drafts, sealed records, catalog records and the payloads a wallet signs.

use super::errors::CodecError;
use super::value_objects::{BookId, DistributionWindow, Genre, LockState, PricingTier};
use serde::{Deserialize, Serialize};
use shared_crypto::{
    blake3_hash, blake3_hash_many, Hash, WalletAddress, WalletPublicKey, WalletSignature,
};
use std::time::Duration;

/// Domain tag prefixed to registration signing bytes.
pub const REGISTRATION_DOMAIN: &[u8] = b"book-rights/register/v1";

/// Domain tag prefixed to decryption-request signing bytes.
pub const DECRYPTION_DOMAIN: &[u8] = b"book-rights/decrypt/v1";

/// Publisher form input, every field plaintext.
///
/// Values are untrusted strings; the field codec validates them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Publisher.
    pub publisher: String,
    /// Genre label.
    pub genre: String,
    /// Pricing tier label (sensitive).
    pub pricing_tier: String,
    /// Distribution window label (sensitive).
    pub distribution_window: String,
}

impl BookDraft {
    /// Content fingerprint over every field, length-framed.
    ///
    /// Two drafts with equal fields always share a fingerprint.
    pub fn fingerprint(&self) -> Hash {
        blake3_hash_many(&[
            self.title.as_bytes(),
            self.author.as_bytes(),
            self.publisher.as_bytes(),
            self.genre.as_bytes(),
            self.pricing_tier.as_bytes(),
            self.distribution_window.as_bytes(),
        ])
    }

    /// Short hex form of the fingerprint for logs.
    pub fn short_fingerprint(&self) -> String {
        hex::encode(&self.fingerprint()[..6])
    }
}

impl std::fmt::Debug for BookDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDraft")
            .field("title", &self.title)
            .field("author", &self.author)
            .field("publisher", &self.publisher)
            .field("genre", &self.genre)
            .field("pricing_tier", &"***")
            .field("distribution_window", &"***")
            .finish()
    }
}

/// Public metadata, validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Publisher.
    pub publisher: String,
    /// Genre.
    pub genre: Genre,
}

impl BookMetadata {
    /// Canonical encoding used in signatures and associated data.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Serialization(e.to_string()))
    }
}

/// Draft after validation: metadata plus typed sensitive values.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    /// Public metadata.
    pub metadata: BookMetadata,
    /// Pricing tier.
    pub pricing_tier: PricingTier,
    /// Distribution window.
    pub distribution_window: DistributionWindow,
}

impl std::fmt::Debug for ValidatedDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedDraft")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Opaque sealed bytes of one sensitive field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    /// Wrap envelope bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Envelope bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Envelope length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an empty envelope.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// BLAKE3 digest of the envelope.
    pub fn digest(&self) -> Hash {
        blake3_hash(&self.0)
    }

    /// First 4 digest bytes in hex, for logs.
    pub fn short_digest(&self) -> String {
        hex::encode(&self.digest()[..4])
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ciphertext(len={}, digest={})",
            self.0.len(),
            self.short_digest()
        )
    }
}

/// Metadata plus sealed sensitive fields, ready to submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Public metadata.
    pub metadata: BookMetadata,
    /// Sealed pricing tier.
    pub pricing_tier: Ciphertext,
    /// Sealed distribution window.
    pub distribution_window: Ciphertext,
}

/// Record as the registry stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredBook {
    /// Registry-assigned id.
    pub id: BookId,
    /// Metadata and ciphertexts as submitted.
    pub record: EncryptedRecord,
    /// Wallet address that signed the registration.
    pub publisher: WalletAddress,
}

/// Sensitive fields in exactly one representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RightsTerms {
    /// Ciphertext only.
    Sealed {
        /// Sealed pricing tier.
        pricing_tier: Ciphertext,
        /// Sealed distribution window.
        distribution_window: Ciphertext,
    },
    /// Plaintext only.
    Revealed {
        /// Pricing tier.
        pricing_tier: PricingTier,
        /// Distribution window.
        distribution_window: DistributionWindow,
    },
}

impl RightsTerms {
    /// True for [`RightsTerms::Sealed`].
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed { .. })
    }
}

/// Catalog entry visible to the presentation layer.
///
/// Fields are private: only lifecycle transitions build new values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookRecord {
    id: BookId,
    metadata: BookMetadata,
    publisher: WalletAddress,
    terms: RightsTerms,
    lock_state: LockState,
}

impl BookRecord {
    /// Locked record from a registry response.
    pub fn from_registered(registered: RegisteredBook) -> Self {
        let RegisteredBook {
            id,
            record,
            publisher,
        } = registered;
        Self {
            id,
            metadata: record.metadata,
            publisher,
            terms: RightsTerms::Sealed {
                pricing_tier: record.pricing_tier,
                distribution_window: record.distribution_window,
            },
            lock_state: LockState::Locked,
        }
    }

    /// Copy with a new lock state, same terms.
    pub(crate) fn with_lock_state(&self, lock_state: LockState) -> Self {
        Self {
            lock_state,
            ..self.clone()
        }
    }

    /// Copy with revealed terms and `Unlocked`.
    pub(crate) fn revealed(
        &self,
        pricing_tier: PricingTier,
        distribution_window: DistributionWindow,
    ) -> Self {
        Self {
            terms: RightsTerms::Revealed {
                pricing_tier,
                distribution_window,
            },
            lock_state: LockState::Unlocked,
            ..self.clone()
        }
    }

    /// Registry id.
    pub fn id(&self) -> &BookId {
        &self.id
    }

    /// Public metadata.
    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Publishing wallet.
    pub fn publisher_address(&self) -> &WalletAddress {
        &self.publisher
    }

    /// Sensitive fields.
    pub fn terms(&self) -> &RightsTerms {
        &self.terms
    }

    /// Disclosure state.
    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    /// Plaintext pricing tier, `None` unless unlocked.
    pub fn pricing_tier(&self) -> Option<PricingTier> {
        match &self.terms {
            RightsTerms::Revealed { pricing_tier, .. } => Some(*pricing_tier),
            RightsTerms::Sealed { .. } => None,
        }
    }

    /// Plaintext distribution window, `None` unless unlocked.
    pub fn distribution_window(&self) -> Option<DistributionWindow> {
        match &self.terms {
            RightsTerms::Revealed {
                distribution_window,
                ..
            } => Some(*distribution_window),
            RightsTerms::Sealed { .. } => None,
        }
    }

    /// Sealed pricing tier, `None` once unlocked.
    pub fn sealed_pricing_tier(&self) -> Option<&Ciphertext> {
        match &self.terms {
            RightsTerms::Sealed { pricing_tier, .. } => Some(pricing_tier),
            RightsTerms::Revealed { .. } => None,
        }
    }

    /// Sealed distribution window, `None` once unlocked.
    pub fn sealed_distribution_window(&self) -> Option<&Ciphertext> {
        match &self.terms {
            RightsTerms::Sealed {
                distribution_window,
                ..
            } => Some(distribution_window),
            RightsTerms::Revealed { .. } => None,
        }
    }
}

/// What a publisher signs to register a record.
///
/// Binds the plaintext metadata and the digest of each ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    /// Public metadata.
    pub metadata: BookMetadata,
    /// Digest of the sealed pricing tier.
    pub pricing_tier_digest: Hash,
    /// Digest of the sealed distribution window.
    pub distribution_window_digest: Hash,
}

impl RegistrationPayload {
    /// Build from a sealed record.
    pub fn from_record(record: &EncryptedRecord) -> Self {
        Self {
            metadata: record.metadata.clone(),
            pricing_tier_digest: record.pricing_tier.digest(),
            distribution_window_digest: record.distribution_window.digest(),
        }
    }
}

/// What a viewer signs to request decryption of one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequestPayload {
    /// Target record.
    pub book_id: BookId,
    /// Fresh per request; the registry refuses reuse.
    pub request_nonce: [u8; 16],
}

impl DecryptionRequestPayload {
    /// New request with a random nonce.
    pub fn new(book_id: BookId) -> Self {
        Self {
            book_id,
            request_nonce: rand::random(),
        }
    }
}

/// Anything the signer can be asked to authorize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigningPayload {
    /// Register a record.
    Registration(RegistrationPayload),
    /// Decrypt a record.
    Decryption(DecryptionRequestPayload),
}

impl SigningPayload {
    /// Domain tag followed by the canonical payload encoding.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let (domain, body) = match self {
            Self::Registration(payload) => (REGISTRATION_DOMAIN, bincode::serialize(payload)),
            Self::Decryption(payload) => (DECRYPTION_DOMAIN, bincode::serialize(payload)),
        };
        let body = body.map_err(|e| CodecError::Serialization(e.to_string()))?;

        let mut bytes = Vec::with_capacity(domain.len() + body.len());
        bytes.extend_from_slice(domain);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Action name for logs and prompts.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Registration(_) => "register",
            Self::Decryption(_) => "decrypt",
        }
    }
}

/// Wallet signature over [`SigningPayload::signing_bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationSignature {
    /// Signing key.
    pub signer: WalletPublicKey,
    /// ECDSA signature.
    pub signature: WalletSignature,
}

/// Lifecycle manager configuration.
#[derive(Clone, Debug)]
pub struct BookRightsConfig {
    /// Capacity of the state-change event channel.
    pub event_capacity: usize,
    /// Deadline applied by the timeout gateway.
    pub gateway_timeout: Duration,
}

impl Default for BookRightsConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            gateway_timeout: Duration::from_secs(30),
        }
    }
}

impl BookRightsConfig {
    /// Read `BR_EVENT_CAPACITY` and `BR_GATEWAY_TIMEOUT_MS`, falling back to
    /// defaults for missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let event_capacity = std::env::var("BR_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(defaults.event_capacity);

        let gateway_timeout = std::env::var("BR_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.gateway_timeout);

        Self {
            event_capacity,
            gateway_timeout,
        }
    }
}
