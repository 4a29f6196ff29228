//! # Book Rights Service
//!
//! Application service that implements the `BookRightsApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`BookRightsApi`)
//! - Sequences the outbound ports: encrypt → sign → submit for registration,
//!   sign → request → decode for decryption
//! - Owns the visible catalog and the per-record in-flight set
//!
//! ## Concurrency
//!
//! Catalog state sits behind one `parking_lot::Mutex` that is never held
//! across an await. A record (or a draft, by fingerprint) has at most one
//! operation in flight; a second call is rejected with `InvalidState`
//! before any signature prompt or network call. Different records proceed
//! concurrently.
//!
//! Dropping an in-flight `decrypt` future releases the slot and returns the
//! record to `Locked`. The `spawn_*` variants run detached and apply their
//! result to whatever the record looks like when they finish.

use crate::algorithms::{
    begin_unlock, complete_unlock, decode_distribution_window, decode_pricing_tier, fail_unlock,
    validate_draft, TransitionOutcome,
};
use crate::domain::{
    invariant_request_binds_book, invariant_terms_match_lock_state, AuthorizationSignature,
    BookDraft, BookId, BookRecord, BookRightsConfig, BookRightsError, DecryptionRequestPayload,
    DistributionWindow, ErrorKind, LockState, PricingTier, RegistrationPayload, RightsEvent,
    SigningPayload,
};
use crate::ports::inbound::BookRightsApi;
use crate::ports::outbound::{AuthorizationSigner, FieldEncryptor, RegistryGateway};
use async_trait::async_trait;
use parking_lot::Mutex;
use rights_telemetry::{
    log_record_event, time_operation, DECRYPTIONS, IN_FLIGHT_OPERATIONS, REGISTRATIONS,
    SIGNATURE_PROMPTS,
};
use shared_crypto::Hash;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

/// What an in-flight slot is held for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum OperationKey {
    /// Draft fingerprint.
    Registering(Hash),
    Unlocking(BookId),
}

#[derive(Default)]
struct CatalogState {
    /// Most recent first.
    records: Vec<BookRecord>,
    in_flight: HashSet<OperationKey>,
    /// Bumped on every local registration.
    generation: u64,
    /// Generation each locally registered record was added at.
    added_at: HashMap<BookId, u64>,
}

impl CatalogState {
    fn position(&self, book_id: &BookId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == book_id)
    }

    fn commit(&mut self, index: usize, record: BookRecord) {
        debug_assert!(invariant_terms_match_lock_state(&record));
        self.records[index] = record;
    }

    fn prepend_registered(&mut self, record: BookRecord) {
        self.generation += 1;
        self.added_at.insert(record.id().clone(), self.generation);
        self.records.retain(|r| r.id() != record.id());
        self.records.insert(0, record);
    }
}

/// Releases an in-flight slot on drop.
///
/// An `Unlocking` record still present at drop time belongs to an abandoned
/// decryption and goes back to `Locked`.
struct InFlightGuard<'a> {
    state: &'a Mutex<CatalogState>,
    key: OperationKey,
}

impl<'a> InFlightGuard<'a> {
    /// Caller has already inserted `key`.
    fn new(state: &'a Mutex<CatalogState>, key: OperationKey) -> Self {
        IN_FLIGHT_OPERATIONS.inc();
        Self { state, key }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_flight.remove(&self.key);

        if let OperationKey::Unlocking(book_id) = &self.key {
            if let Some(index) = state.position(book_id) {
                let transition = fail_unlock(&state.records[index]);
                if transition.outcome == TransitionOutcome::Reverted {
                    debug!(book_id = %book_id, "[book-rights] Abandoned unlock reverted");
                    state.commit(index, transition.record);
                }
            }
        }

        IN_FLIGHT_OPERATIONS.dec();
    }
}

/// Book rights lifecycle manager.
///
/// Generic over its three outbound ports. Wrap in an `Arc` to use the
/// detached `spawn_*` operations.
pub struct BookRightsService<E, S, G>
where
    E: FieldEncryptor,
    S: AuthorizationSigner,
    G: RegistryGateway,
{
    encryptor: E,
    signer: S,
    gateway: G,
    state: Mutex<CatalogState>,
    events: broadcast::Sender<RightsEvent>,
}

impl<E, S, G> BookRightsService<E, S, G>
where
    E: FieldEncryptor,
    S: AuthorizationSigner,
    G: RegistryGateway,
{
    /// Create a service with default configuration.
    pub fn new(encryptor: E, signer: S, gateway: G) -> Self {
        Self::with_config(encryptor, signer, gateway, BookRightsConfig::default())
    }

    /// Create a service.
    ///
    /// # Arguments
    /// * `encryptor` - Seals sensitive fields
    /// * `signer` - Wallet authorizing registrations and decryptions
    /// * `gateway` - Registry transport (wrap in `TimeoutGateway` for deadlines)
    /// * `config` - Event channel capacity
    pub fn with_config(encryptor: E, signer: S, gateway: G, config: BookRightsConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            encryptor,
            signer,
            gateway,
            state: Mutex::new(CatalogState::default()),
            events,
        }
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RightsEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the visible records, most recent first.
    pub fn records(&self) -> Vec<BookRecord> {
        self.state.lock().records.clone()
    }

    /// Snapshot of one record.
    pub fn record(&self, book_id: &BookId) -> Option<BookRecord> {
        let state = self.state.lock();
        state.position(book_id).map(|i| state.records[i].clone())
    }

    /// True while any registration is in flight.
    pub fn is_encrypting(&self) -> bool {
        self.state
            .lock()
            .in_flight
            .iter()
            .any(|key| matches!(key, OperationKey::Registering(_)))
    }

    /// Registrations plus decryptions in flight.
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Register a draft.
    ///
    /// On success the record is `Locked`, carries the registry id and is
    /// first in [`records`](Self::records). On failure nothing is stored and
    /// the caller still owns the unchanged draft.
    pub async fn register(&self, draft: &BookDraft) -> Result<BookRecord, BookRightsError> {
        let _timer = time_operation!("register");
        let fingerprint = draft.short_fingerprint();
        let span = info_span!("register", draft = %fingerprint);

        async move {
            let result = self.run_registration(draft).await;
            match &result {
                Ok(record) => {
                    REGISTRATIONS.with_label_values(&["registered"]).inc();
                    log_record_event!(
                        info,
                        "[book-rights] Book registered",
                        record.id(),
                        title = %record.title()
                    );
                    self.publish(RightsEvent::Registered {
                        book_id: record.id().clone(),
                        title: record.title().to_string(),
                    });
                }
                Err(err) => {
                    let kind = err.kind();
                    REGISTRATIONS.with_label_values(&[kind.as_str()]).inc();
                    log_failure("register", err);
                    if kind != ErrorKind::InvalidState {
                        self.publish(RightsEvent::RegistrationFailed {
                            draft: fingerprint,
                            kind,
                        });
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Decrypt one record's rights.
    ///
    /// On success the record is `Unlocked` with plaintext terms. On any
    /// failure it is `Locked` again with its ciphertext untouched.
    pub async fn decrypt(&self, book_id: &BookId) -> Result<BookRecord, BookRightsError> {
        let _timer = time_operation!("decrypt");
        let span = info_span!("decrypt", book_id = %book_id);

        async move {
            let guard = match self.begin_decryption(book_id) {
                Ok(guard) => guard,
                Err(err) => {
                    DECRYPTIONS.with_label_values(&[err.kind().as_str()]).inc();
                    debug!("[book-rights] Decrypt rejected: {}", err);
                    return Err(err);
                }
            };
            self.publish(RightsEvent::UnlockStarted {
                book_id: book_id.clone(),
            });

            match self.run_decryption(book_id).await {
                Ok(record) => {
                    drop(guard);
                    DECRYPTIONS.with_label_values(&["unlocked"]).inc();
                    log_record_event!(info, "[book-rights] Rights unlocked", book_id);
                    self.publish(RightsEvent::Unlocked {
                        book_id: book_id.clone(),
                    });
                    Ok(record)
                }
                Err(err) => {
                    self.revert_unlock(book_id);
                    drop(guard);
                    let kind = err.kind();
                    DECRYPTIONS.with_label_values(&[kind.as_str()]).inc();
                    log_failure("decrypt", &err);
                    self.publish(RightsEvent::UnlockFailed {
                        book_id: book_id.clone(),
                        kind,
                    });
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Reload the catalog from the registry.
    ///
    /// Registered records arrive `Locked`, newest first. Records unlocked (or
    /// unlocking) locally keep their local state. Records the registry no
    /// longer returns are dropped; a pending unlock for one of them is
    /// discarded when it completes. Registrations that finish while the
    /// query is outstanding stay in front even if the snapshot predates them.
    pub async fn refresh_catalog(&self) -> Result<usize, BookRightsError> {
        let since = self.state.lock().generation;
        let registered = self.gateway.query_records().await?;

        let mut state = self.state.lock();
        let previous = std::mem::take(&mut state.records);

        let mut records: Vec<BookRecord> = previous
            .iter()
            .filter(|local| {
                state
                    .added_at
                    .get(local.id())
                    .is_some_and(|added| *added > since)
                    && !registered.iter().any(|book| book.id == *local.id())
            })
            .cloned()
            .collect();
        if !records.is_empty() {
            debug!(
                kept = records.len(),
                "[book-rights] Keeping registrations newer than the snapshot"
            );
        }

        records.extend(registered.into_iter().rev().map(|book| {
            match previous.iter().find(|r| *r.id() == book.id) {
                Some(local) if local.lock_state() != LockState::Locked => local.clone(),
                _ => BookRecord::from_registered(book),
            }
        }));
        state.records = records;
        state.added_at.retain(|_, added| *added > since);

        let count = state.records.len();
        info!(count, "[book-rights] Catalog refreshed");
        Ok(count)
    }

    async fn run_registration(&self, draft: &BookDraft) -> Result<BookRecord, BookRightsError> {
        let validated = validate_draft(draft)?;

        let key = OperationKey::Registering(draft.fingerprint());
        let _guard = {
            let mut state = self.state.lock();
            if !state.in_flight.insert(key.clone()) {
                return Err(BookRightsError::InvalidState {
                    subject: draft.short_fingerprint(),
                    state: "Registering".to_string(),
                });
            }
            InFlightGuard::new(&self.state, key)
        };

        if !self.signer.is_connected() {
            return Err(BookRightsError::SignerUnavailable);
        }

        let encrypted = self.encryptor.encrypt_record(&validated)?;
        debug!(
            pricing_tier = ?encrypted.pricing_tier,
            distribution_window = ?encrypted.distribution_window,
            "[book-rights] Sensitive fields sealed"
        );

        let payload = SigningPayload::Registration(RegistrationPayload::from_record(&encrypted));
        let signature = self.request_signature(&payload).await?;

        let registered = self
            .gateway
            .submit_registration(&encrypted, &signature)
            .await?;
        let record = BookRecord::from_registered(registered);

        self.state.lock().prepend_registered(record.clone());
        Ok(record)
    }

    /// Guard, signer check and `Locked → Unlocking`, atomically. Nothing
    /// changes unless every check passes.
    fn begin_decryption(&self, book_id: &BookId) -> Result<InFlightGuard<'_>, BookRightsError> {
        let mut state = self.state.lock();

        let key = OperationKey::Unlocking(book_id.clone());
        if state.in_flight.contains(&key) {
            return Err(BookRightsError::invalid_lock_state(
                book_id,
                LockState::Unlocking,
            ));
        }

        let index = state
            .position(book_id)
            .ok_or_else(|| BookRightsError::NotFound(book_id.clone()))?;
        let transition = begin_unlock(&state.records[index])?;
        if !self.signer.is_connected() {
            return Err(BookRightsError::SignerUnavailable);
        }
        state.commit(index, transition.record);
        state.in_flight.insert(key.clone());

        Ok(InFlightGuard::new(&self.state, key))
    }

    async fn run_decryption(&self, book_id: &BookId) -> Result<BookRecord, BookRightsError> {
        let request = DecryptionRequestPayload::new(book_id.clone());
        debug_assert!(invariant_request_binds_book(&request, book_id));

        let signature = self
            .request_signature(&SigningPayload::Decryption(request.clone()))
            .await?;
        let fields = self
            .gateway
            .submit_decryption_request(&request, &signature)
            .await?;

        let pricing_tier = decode_pricing_tier(fields.pricing_tier.as_bytes())?;
        let distribution_window =
            decode_distribution_window(fields.distribution_window.as_bytes())?;
        drop(fields);

        self.apply_unlock(book_id, pricing_tier, distribution_window)
    }

    fn apply_unlock(
        &self,
        book_id: &BookId,
        pricing_tier: PricingTier,
        distribution_window: DistributionWindow,
    ) -> Result<BookRecord, BookRightsError> {
        let mut state = self.state.lock();
        let Some(index) = state.position(book_id) else {
            debug!(book_id = %book_id, "[book-rights] Record gone, unlock result discarded");
            return Err(BookRightsError::NotFound(book_id.clone()));
        };

        let transition = complete_unlock(&state.records[index], pricing_tier, distribution_window)?;
        state.commit(index, transition.record.clone());
        Ok(transition.record)
    }

    fn revert_unlock(&self, book_id: &BookId) {
        let mut state = self.state.lock();
        if let Some(index) = state.position(book_id) {
            let transition = fail_unlock(&state.records[index]);
            state.commit(index, transition.record);
        }
    }

    async fn request_signature(
        &self,
        payload: &SigningPayload,
    ) -> Result<AuthorizationSignature, BookRightsError> {
        SIGNATURE_PROMPTS.inc();
        debug!(action = payload.action(), "[book-rights] Requesting wallet signature");
        self.signer.sign(payload).await
    }

    fn publish(&self, event: RightsEvent) {
        debug!(event = event.name(), "[book-rights] Publishing event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl<E, S, G> BookRightsService<E, S, G>
where
    E: FieldEncryptor + 'static,
    S: AuthorizationSigner + 'static,
    G: RegistryGateway + 'static,
{
    /// Register on a detached task. The registration completes even if the
    /// handle is dropped.
    pub fn spawn_register(self: &Arc<Self>, draft: BookDraft) -> JoinHandle<Option<BookRecord>> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.register(&draft).await.ok() })
    }

    /// Decrypt on a detached task. The result is applied when it arrives,
    /// or discarded if the record is gone by then.
    pub fn spawn_decrypt(self: &Arc<Self>, book_id: BookId) -> JoinHandle<bool> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.decrypt(&book_id).await.is_ok() })
    }
}

#[async_trait]
impl<E, S, G> BookRightsApi for BookRightsService<E, S, G>
where
    E: FieldEncryptor,
    S: AuthorizationSigner,
    G: RegistryGateway,
{
    async fn register_book(&self, draft: &BookDraft) -> Option<BookRecord> {
        self.register(draft).await.ok()
    }

    async fn decrypt_book_rights(&self, book_id: &BookId) -> bool {
        self.decrypt(book_id).await.is_ok()
    }

    fn records(&self) -> Vec<BookRecord> {
        BookRightsService::records(self)
    }

    fn is_encrypting(&self) -> bool {
        BookRightsService::is_encrypting(self)
    }
}

/// Expected outcomes at info, defects at warn.
fn log_failure(operation: &'static str, err: &BookRightsError) {
    let kind = err.kind();
    if kind.is_expected() {
        info!(operation, kind = kind.as_str(), "[book-rights] Operation ended: {}", err);
    } else {
        warn!(
            operation,
            kind = kind.as_str(),
            retryable = kind.is_retryable(),
            "[book-rights] Operation failed: {}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryRegistry, RegistryFault, SealedBoxEncryptionClient};
    use crate::ports::outbound::MockSigner;
    use std::time::Duration;

    type TestService =
        BookRightsService<SealedBoxEncryptionClient, MockSigner, Arc<InMemoryRegistry>>;

    fn setup() -> (TestService, MockSigner, Arc<InMemoryRegistry>) {
        let registry = Arc::new(InMemoryRegistry::new());
        let signer = MockSigner::default();
        let service = BookRightsService::new(
            SealedBoxEncryptionClient::new(registry.sealing_public_key()),
            signer.clone(),
            Arc::clone(&registry),
        );
        (service, signer, registry)
    }

    fn draft(title: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: "A".to_string(),
            publisher: "P".to_string(),
            genre: "Science".to_string(),
            pricing_tier: "Premium - $9.99".to_string(),
            distribution_window: "Exclusive - 6 months".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_prepends_locked_record() {
        let (service, _, _) = setup();
        let first = service.register(&draft("First")).await.unwrap();
        let second = service.register(&draft("Second")).await.unwrap();

        let records = service.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), second.id());
        assert_eq!(records[1].id(), first.id());
        assert_eq!(first.lock_state(), LockState::Locked);
        assert!(!service.is_encrypting());
    }

    #[tokio::test]
    async fn test_register_codec_error_fails_fast() {
        let (service, signer, registry) = setup();
        let mut bad = draft("Bad");
        bad.pricing_tier = "Free".to_string();

        let err = service.register(&bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(signer.prompt_count(), 0);
        assert_eq!(registry.registration_submissions(), 0);
    }

    #[tokio::test]
    async fn test_register_disconnected_signer() {
        let (service, signer, registry) = setup();
        signer.set_connected(false);

        let err = service.register(&draft("T")).await.unwrap_err();
        assert!(matches!(err, BookRightsError::SignerUnavailable));
        assert_eq!(registry.registration_submissions(), 0);
        assert!(service.records().is_empty());
    }

    #[tokio::test]
    async fn test_uninitialized_encryptor() {
        let registry = Arc::new(InMemoryRegistry::new());
        let service = BookRightsService::new(
            SealedBoxEncryptionClient::uninitialized(),
            MockSigner::default(),
            Arc::clone(&registry),
        );

        let err = service.register(&draft("T")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encryption);
        assert!(err.kind().is_retryable());
        assert_eq!(registry.registration_submissions(), 0);
    }

    #[tokio::test]
    async fn test_decrypt_unknown_book() {
        let (service, signer, _) = setup();
        let err = service.decrypt(&BookId::new("404")).await.unwrap_err();
        assert!(matches!(err, BookRightsError::NotFound(_)));
        assert_eq!(signer.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_decrypt_disconnected_signer_leaves_record_locked() {
        let (service, signer, registry) = setup();
        let record = service.register(&draft("T")).await.unwrap();
        let mut events = service.subscribe();
        let prompts = signer.prompt_count();

        signer.set_connected(false);
        let err = service.decrypt(record.id()).await.unwrap_err();

        assert!(matches!(err, BookRightsError::SignerUnavailable));
        assert!(events.try_recv().is_err());
        assert_eq!(service.record(record.id()).unwrap(), record);
        assert_eq!(service.in_flight_count(), 0);
        assert_eq!(signer.prompt_count(), prompts);
        assert_eq!(registry.decryption_requests(), 0);
    }

    #[tokio::test]
    async fn test_decrypt_unlocked_is_invalid_state() {
        let (service, signer, _) = setup();
        let record = service.register(&draft("T")).await.unwrap();
        service.decrypt(record.id()).await.unwrap();
        let prompts = signer.prompt_count();

        let err = service.decrypt(record.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(signer.prompt_count(), prompts);
        assert_eq!(
            service.record(record.id()).unwrap().lock_state(),
            LockState::Unlocked
        );
    }

    #[tokio::test]
    async fn test_decrypt_network_error_reverts() {
        let (service, _, registry) = setup();
        let record = service.register(&draft("T")).await.unwrap();

        registry.set_fault(Some(RegistryFault::Network));
        let err = service.decrypt(record.id()).await.unwrap_err();
        assert!(err.kind().is_retryable());
        assert_eq!(service.record(record.id()).unwrap(), record);

        registry.set_fault(None);
        assert!(service.decrypt(record.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_decrypt_releases_slot() {
        let registry = Arc::new(InMemoryRegistry::new().with_latency(Duration::from_millis(200)));
        let service = BookRightsService::new(
            SealedBoxEncryptionClient::new(registry.sealing_public_key()),
            MockSigner::default(),
            Arc::clone(&registry),
        );
        let record = service.register(&draft("T")).await.unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), service.decrypt(record.id())).await;
        assert!(abandoned.is_err());

        assert_eq!(service.in_flight_count(), 0);
        assert_eq!(service.record(record.id()).unwrap(), record);
    }

    #[tokio::test]
    async fn test_events_published() {
        let (service, signer, _) = setup();
        let mut events = service.subscribe();

        let record = service.register(&draft("T")).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            RightsEvent::Registered {
                book_id: record.id().clone(),
                title: "T".to_string()
            }
        );

        signer.set_reject(true);
        assert!(!service.decrypt_book_rights(record.id()).await);
        assert_eq!(
            events.recv().await.unwrap(),
            RightsEvent::UnlockStarted {
                book_id: record.id().clone()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            RightsEvent::UnlockFailed {
                book_id: record.id().clone(),
                kind: ErrorKind::UserRejected
            }
        );
    }

    #[tokio::test]
    async fn test_api_trait_entry_points() {
        let (service, _, _) = setup();
        let api: &dyn BookRightsApi = &service;

        let record = api.register_book(&draft("T")).await.unwrap();
        assert!(api.register_book(&draft("T")).await.is_none()); // duplicate
        assert!(api.decrypt_book_rights(record.id()).await);
        assert_eq!(api.records().len(), 1);
        assert!(!api.is_encrypting());
    }
}
