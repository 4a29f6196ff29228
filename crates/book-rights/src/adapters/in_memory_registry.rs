//! In-Memory Registry Adapter
//!
//! Implements `RegistryGateway` as a reference registry that lives in
//! process. It holds the sealing keypair, assigns ids, verifies wallet
//! signatures, enforces per-record access control and refuses replayed
//! decryption requests.
//!
//! Faults and latency can be injected for tests.

use crate::adapters::SealedBoxEncryptionClient;
use crate::algorithms::{associated_data, decode_sensitive, validate_draft};
use crate::domain::{
    AuthorizationSignature, BookDraft, BookId, BookRightsError, CodecInput, DecryptedFields,
    DecryptionRequestPayload, EncryptedRecord, RegisteredBook, RegistrationPayload,
    SensitiveFieldKind, SigningPayload,
};
use crate::ports::outbound::{FieldEncryptor, RegistryGateway};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::{blake3_hash, Hash, SealingKeyPair, SealingPublicKey, WalletAddress};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Demo catalog: title, author, publisher, genre, pricing tier, window.
const DEMO_CATALOG: [[&str; 6]; 3] = [
    [
        "Digital Publishing in the Blockchain Era",
        "Sarah Chen",
        "TechPress Publishing",
        "Technology",
        "Premium - $9.99",
        "Exclusive - 6 months",
    ],
    [
        "Cryptographic Rights Management",
        "Michael Rodriguez",
        "Crypto Books Ltd",
        "Technology",
        "Standard - $4.99",
        "Limited - 3 months",
    ],
    [
        "The Future of Digital Content",
        "Emily Watson",
        "Future Media Corp",
        "Business",
        "Basic - $2.99",
        "Open - Unlimited",
    ],
];

/// Failure the registry should simulate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryFault {
    /// Every call fails with `NetworkError`.
    Network,
    /// Registrations fail with `RegistryRejected`.
    Reject(String),
    /// Decryption requests fail with `Denied`.
    Deny,
}

struct StoredBook {
    registered: RegisteredBook,
    viewers: HashSet<WalletAddress>,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    books: Vec<StoredBook>,
    /// Digests of decryption requests already served or refused.
    spent_requests: HashSet<Hash>,
}

/// Reference registry kept in memory.
pub struct InMemoryRegistry {
    sealing_key: SealingKeyPair,
    state: RwLock<RegistryState>,
    fault: RwLock<Option<RegistryFault>>,
    latency: RwLock<Option<Duration>>,
    registration_submissions: AtomicUsize,
    decryption_requests: AtomicUsize,
}

impl InMemoryRegistry {
    /// Empty registry with a fresh sealing keypair.
    pub fn new() -> Self {
        Self::with_sealing_key(SealingKeyPair::generate())
    }

    /// Empty registry using `sealing_key`.
    pub fn with_sealing_key(sealing_key: SealingKeyPair) -> Self {
        Self {
            sealing_key,
            state: RwLock::new(RegistryState {
                next_id: 1,
                ..Default::default()
            }),
            fault: RwLock::new(None),
            latency: RwLock::new(None),
            registration_submissions: AtomicUsize::new(0),
            decryption_requests: AtomicUsize::new(0),
        }
    }

    /// Builder: delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    /// Change (or clear) the delay applied to subsequent calls.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Public parameters for encryption clients.
    pub fn sealing_public_key(&self) -> SealingPublicKey {
        self.sealing_key.public_key()
    }

    /// Inject (or clear) a fault for subsequent calls.
    pub fn set_fault(&self, fault: Option<RegistryFault>) {
        *self.fault.write() = fault;
    }

    /// Allow `viewer` to decrypt `book_id`.
    pub fn grant_viewer(
        &self,
        book_id: &BookId,
        viewer: WalletAddress,
    ) -> Result<(), BookRightsError> {
        let mut state = self.state.write();
        let stored = state
            .books
            .iter_mut()
            .find(|b| b.registered.id == *book_id)
            .ok_or_else(|| BookRightsError::NotFound(book_id.clone()))?;
        stored.viewers.insert(viewer);
        info!("[registry] Granted viewer access on book {}", book_id);
        Ok(())
    }

    /// Seal and register the three demo books on behalf of `publisher`.
    pub fn seed_demo_catalog(
        &self,
        publisher: WalletAddress,
    ) -> Result<Vec<BookId>, BookRightsError> {
        let encryptor = SealedBoxEncryptionClient::new(self.sealing_public_key());
        let mut ids = Vec::with_capacity(DEMO_CATALOG.len());

        for [title, author, publisher_name, genre, pricing_tier, distribution_window] in
            DEMO_CATALOG
        {
            let draft = BookDraft {
                title: title.to_string(),
                author: author.to_string(),
                publisher: publisher_name.to_string(),
                genre: genre.to_string(),
                pricing_tier: pricing_tier.to_string(),
                distribution_window: distribution_window.to_string(),
            };
            let record = encryptor.encrypt_record(&validate_draft(&draft)?)?;
            ids.push(self.store(record, publisher)?.id);
        }

        info!("[registry] Seeded {} demo books", ids.len());
        Ok(ids)
    }

    /// Registration submissions received, including failed ones.
    pub fn registration_submissions(&self) -> usize {
        self.registration_submissions.load(Ordering::SeqCst)
    }

    /// Decryption requests received, including refused ones.
    pub fn decryption_requests(&self) -> usize {
        self.decryption_requests.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.state.read().books.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn current_fault(&self) -> Option<RegistryFault> {
        self.fault.read().clone()
    }

    /// Open one sealed field and check it decodes as `kind`.
    fn open_field(
        &self,
        kind: SensitiveFieldKind,
        record: &EncryptedRecord,
        ciphertext: &[u8],
    ) -> Result<CodecInput, BookRightsError> {
        let aad = associated_data(kind, &record.metadata)?;
        let opened = self
            .sealing_key
            .open(ciphertext, &aad)
            .map_err(|e| BookRightsError::RegistryRejected(format!("{}: {}", kind.name(), e)))?;
        let plaintext = CodecInput::new(opened);
        decode_sensitive(kind, plaintext.as_bytes())
            .map_err(|e| BookRightsError::RegistryRejected(e.to_string()))?;
        Ok(plaintext)
    }

    fn open_record(&self, record: &EncryptedRecord) -> Result<DecryptedFields, BookRightsError> {
        Ok(DecryptedFields {
            pricing_tier: self.open_field(
                SensitiveFieldKind::PricingTier,
                record,
                record.pricing_tier.as_bytes(),
            )?,
            distribution_window: self.open_field(
                SensitiveFieldKind::DistributionWindow,
                record,
                record.distribution_window.as_bytes(),
            )?,
        })
    }

    /// Assign an id and store. Rejects a second record with the same title,
    /// author and publisher.
    fn store(
        &self,
        record: EncryptedRecord,
        publisher: WalletAddress,
    ) -> Result<RegisteredBook, BookRightsError> {
        let mut state = self.state.write();

        let duplicate = state.books.iter().any(|b| {
            let existing = &b.registered.record.metadata;
            existing.title == record.metadata.title
                && existing.author == record.metadata.author
                && existing.publisher == record.metadata.publisher
        });
        if duplicate {
            return Err(BookRightsError::RegistryRejected(
                "duplicate record".to_string(),
            ));
        }

        let id = BookId::new(state.next_id.to_string());
        state.next_id += 1;

        let registered = RegisteredBook {
            id,
            record,
            publisher,
        };
        state.books.push(StoredBook {
            registered: registered.clone(),
            viewers: HashSet::new(),
        });
        Ok(registered)
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryGateway for InMemoryRegistry {
    async fn submit_registration(
        &self,
        record: &EncryptedRecord,
        signature: &AuthorizationSignature,
    ) -> Result<RegisteredBook, BookRightsError> {
        self.registration_submissions.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        match self.current_fault() {
            Some(RegistryFault::Network) => {
                return Err(BookRightsError::NetworkError("connection reset".to_string()))
            }
            Some(RegistryFault::Reject(reason)) => {
                return Err(BookRightsError::RegistryRejected(reason))
            }
            Some(RegistryFault::Deny) | None => {}
        }

        let message =
            SigningPayload::Registration(RegistrationPayload::from_record(record)).signing_bytes()?;
        signature
            .signer
            .verify(&message, &signature.signature)
            .map_err(|_| {
                BookRightsError::RegistryRejected("invalid authorization signature".to_string())
            })?;
        let publisher = signature
            .signer
            .to_address()
            .map_err(|e| BookRightsError::RegistryRejected(e.to_string()))?;

        // Malformed ciphertext never reaches storage
        self.open_record(record)?;

        let registered = self.store(record.clone(), publisher)?;
        info!(
            "[registry] Registered book {} for publisher 0x{}",
            registered.id,
            hex::encode(publisher)
        );
        Ok(registered)
    }

    async fn submit_decryption_request(
        &self,
        request: &DecryptionRequestPayload,
        signature: &AuthorizationSignature,
    ) -> Result<DecryptedFields, BookRightsError> {
        self.decryption_requests.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let denied = || BookRightsError::Denied {
            book_id: request.book_id.clone(),
        };

        match self.current_fault() {
            Some(RegistryFault::Network) => {
                return Err(BookRightsError::NetworkError("connection reset".to_string()))
            }
            Some(RegistryFault::Deny) => return Err(denied()),
            Some(RegistryFault::Reject(_)) | None => {}
        }

        let message = SigningPayload::Decryption(request.clone()).signing_bytes()?;
        if signature
            .signer
            .verify(&message, &signature.signature)
            .is_err()
        {
            warn!("[registry] Bad decryption signature for book {}", request.book_id);
            return Err(denied());
        }
        let requester = signature.signer.to_address().map_err(|_| denied())?;

        let mut state = self.state.write();

        if !state.spent_requests.insert(blake3_hash(&message)) {
            warn!("[registry] Replayed decryption request for book {}", request.book_id);
            return Err(denied());
        }

        let stored = state
            .books
            .iter()
            .find(|b| b.registered.id == request.book_id)
            .ok_or_else(denied)?;

        let authorized =
            stored.registered.publisher == requester || stored.viewers.contains(&requester);
        if !authorized {
            debug!(
                "[registry] 0x{} not authorized for book {}",
                hex::encode(requester),
                request.book_id
            );
            return Err(denied());
        }

        let fields = self.open_record(&stored.registered.record)?;
        debug!("[registry] Served decryption for book {}", request.book_id);
        Ok(fields)
    }

    async fn query_records(&self) -> Result<Vec<RegisteredBook>, BookRightsError> {
        self.simulate_latency().await;

        if self.current_fault() == Some(RegistryFault::Network) {
            return Err(BookRightsError::NetworkError("connection reset".to_string()));
        }

        Ok(self
            .state
            .read()
            .books
            .iter()
            .map(|b| b.registered.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{decode_distribution_window, decode_pricing_tier};
    use crate::domain::{DistributionWindow, PricingTier};
    use crate::ports::outbound::{AuthorizationSigner, MockSigner};

    fn draft(title: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: "A".to_string(),
            publisher: "P".to_string(),
            genre: "Fiction".to_string(),
            pricing_tier: "Standard - $4.99".to_string(),
            distribution_window: "Limited - 3 months".to_string(),
        }
    }

    async fn register(
        registry: &InMemoryRegistry,
        signer: &MockSigner,
        title: &str,
    ) -> Result<RegisteredBook, BookRightsError> {
        let encryptor = SealedBoxEncryptionClient::new(registry.sealing_public_key());
        let record = encryptor
            .encrypt_record(&validate_draft(&draft(title)).unwrap())
            .unwrap();
        let sig = signer
            .sign(&SigningPayload::Registration(RegistrationPayload::from_record(
                &record,
            )))
            .await
            .unwrap();
        registry.submit_registration(&record, &sig).await
    }

    async fn decrypt(
        registry: &InMemoryRegistry,
        signer: &MockSigner,
        book_id: &BookId,
    ) -> Result<DecryptedFields, BookRightsError> {
        let request = DecryptionRequestPayload::new(book_id.clone());
        let sig = signer
            .sign(&SigningPayload::Decryption(request.clone()))
            .await
            .unwrap();
        registry.submit_decryption_request(&request, &sig).await
    }

    #[tokio::test]
    async fn test_registration_assigns_sequential_ids() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();

        let first = register(&registry, &signer, "One").await.unwrap();
        let second = register(&registry, &signer, "Two").await.unwrap();
        assert_eq!(first.id, BookId::new("1"));
        assert_eq!(second.id, BookId::new("2"));
        assert_eq!(first.publisher, signer.public_key().to_address().unwrap());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();

        register(&registry, &signer, "One").await.unwrap();
        let err = register(&registry, &signer, "One").await.unwrap_err();
        assert!(matches!(err, BookRightsError::RegistryRejected(_)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_signature_must_cover_record() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let encryptor = SealedBoxEncryptionClient::new(registry.sealing_public_key());

        let signed = encryptor
            .encrypt_record(&validate_draft(&draft("Signed")).unwrap())
            .unwrap();
        let swapped = encryptor
            .encrypt_record(&validate_draft(&draft("Swapped")).unwrap())
            .unwrap();
        let sig = signer
            .sign(&SigningPayload::Registration(RegistrationPayload::from_record(
                &signed,
            )))
            .await
            .unwrap();

        let err = registry.submit_registration(&swapped, &sig).await.unwrap_err();
        assert!(matches!(err, BookRightsError::RegistryRejected(_)));
    }

    #[tokio::test]
    async fn test_foreign_ciphertext_rejected() {
        let registry = InMemoryRegistry::new();
        let other = InMemoryRegistry::new();
        let signer = MockSigner::default();

        // Sealed for a different registry key
        let encryptor = SealedBoxEncryptionClient::new(other.sealing_public_key());
        let record = encryptor
            .encrypt_record(&validate_draft(&draft("Foreign")).unwrap())
            .unwrap();
        let sig = signer
            .sign(&SigningPayload::Registration(RegistrationPayload::from_record(
                &record,
            )))
            .await
            .unwrap();

        let err = registry.submit_registration(&record, &sig).await.unwrap_err();
        assert!(matches!(err, BookRightsError::RegistryRejected(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_publisher_can_decrypt() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let book = register(&registry, &signer, "One").await.unwrap();

        let fields = decrypt(&registry, &signer, &book.id).await.unwrap();
        assert_eq!(
            decode_pricing_tier(fields.pricing_tier.as_bytes()).unwrap(),
            PricingTier::Standard
        );
        assert_eq!(
            decode_distribution_window(fields.distribution_window.as_bytes()).unwrap(),
            DistributionWindow::Limited
        );
    }

    #[tokio::test]
    async fn test_stranger_denied_until_granted() {
        let registry = InMemoryRegistry::new();
        let publisher = MockSigner::default();
        let stranger = MockSigner::default();
        let book = register(&registry, &publisher, "One").await.unwrap();

        let err = decrypt(&registry, &stranger, &book.id).await.unwrap_err();
        assert!(matches!(err, BookRightsError::Denied { .. }));

        registry
            .grant_viewer(&book.id, stranger.public_key().to_address().unwrap())
            .unwrap();
        assert!(decrypt(&registry, &stranger, &book.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_replayed_request_denied() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let book = register(&registry, &signer, "One").await.unwrap();

        let request = DecryptionRequestPayload::new(book.id.clone());
        let sig = signer
            .sign(&SigningPayload::Decryption(request.clone()))
            .await
            .unwrap();

        assert!(registry.submit_decryption_request(&request, &sig).await.is_ok());
        let err = registry
            .submit_decryption_request(&request, &sig)
            .await
            .unwrap_err();
        assert!(matches!(err, BookRightsError::Denied { .. }));
    }

    #[tokio::test]
    async fn test_signature_for_other_book_denied() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let one = register(&registry, &signer, "One").await.unwrap();
        let two = register(&registry, &signer, "Two").await.unwrap();

        let signed_for_one = DecryptionRequestPayload::new(one.id.clone());
        let sig = signer
            .sign(&SigningPayload::Decryption(signed_for_one.clone()))
            .await
            .unwrap();
        let retargeted = DecryptionRequestPayload {
            book_id: two.id.clone(),
            ..signed_for_one
        };

        let err = registry
            .submit_decryption_request(&retargeted, &sig)
            .await
            .unwrap_err();
        assert!(matches!(err, BookRightsError::Denied { ref book_id } if *book_id == two.id));
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let book = register(&registry, &signer, "One").await.unwrap();

        registry.set_fault(Some(RegistryFault::Network));
        assert!(matches!(
            register(&registry, &signer, "Two").await,
            Err(BookRightsError::NetworkError(_))
        ));
        assert!(registry.query_records().await.is_err());

        registry.set_fault(Some(RegistryFault::Deny));
        assert!(matches!(
            decrypt(&registry, &signer, &book.id).await,
            Err(BookRightsError::Denied { .. })
        ));

        registry.set_fault(None);
        assert!(decrypt(&registry, &signer, &book.id).await.is_ok());
        assert_eq!(registry.registration_submissions(), 2);
        assert_eq!(registry.decryption_requests(), 2);
    }

    #[tokio::test]
    async fn test_demo_catalog() {
        let registry = InMemoryRegistry::new();
        let signer = MockSigner::default();
        let ids = registry
            .seed_demo_catalog(signer.public_key().to_address().unwrap())
            .unwrap();
        assert_eq!(ids, vec![BookId::new("1"), BookId::new("2"), BookId::new("3")]);

        let records = registry.query_records().await.unwrap();
        assert_eq!(
            records[0].record.metadata.title,
            "Digital Publishing in the Blockchain Era"
        );

        let fields = decrypt(&registry, &signer, &ids[2]).await.unwrap();
        assert_eq!(
            decode_pricing_tier(fields.pricing_tier.as_bytes()).unwrap(),
            PricingTier::Basic
        );
    }
}
