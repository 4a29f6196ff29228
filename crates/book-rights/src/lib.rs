//! # Book Rights
//!
//! Encrypted field lifecycle manager for digital book records.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A publisher registers a book whose commercially sensitive fields (pricing
//! tier, distribution window) are stored sealed on a public registry. An
//! authorized party later unlocks them through an explicit, wallet-signed,
//! per-record decryption:
//! - Sensitive fields are sealed before they leave the process
//! - Every registration and decryption is signed by the acting wallet
//! - A record is `Locked → Unlocking → {Unlocked | Locked}`, never re-locked
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | Ciphertext iff locked | `RightsTerms` holds exactly one representation |
//! | One operation per record | In-flight set checked under the catalog lock |
//! | No partial progress | Transitions are pure; failures revert to `Locked` |
//! | Signature binds the record | Decrypt payload carries book id + fresh nonce |
//! | No plaintext in errors/logs | Redacted `Debug`, digests only in logs |
//!
//! ## Module Structure
//!
//! ```text
//! book-rights/
//! ├── domain/          # BookRecord, LockState, payloads, errors, events
//! ├── algorithms/      # Field codec, lock state transitions
//! ├── ports/           # BookRightsApi, FieldEncryptor, AuthorizationSigner, RegistryGateway
//! ├── adapters/        # Sealed-box client, in-memory registry, timeout gateway
//! └── service.rs       # BookRightsService (lifecycle manager)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = Arc::new(InMemoryRegistry::new());
//! let config = BookRightsConfig::from_env();
//! let service = BookRightsService::with_config(
//!     SealedBoxEncryptionClient::new(registry.sealing_public_key()),
//!     wallet,
//!     TimeoutGateway::new(Arc::clone(&registry), config.gateway_timeout),
//!     config,
//! );
//!
//! if let Some(record) = service.register_book(&draft).await {
//!     service.decrypt_book_rights(record.id()).await;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryRegistry, RegistryFault, SealedBoxEncryptionClient, TimeoutGateway};
pub use algorithms::{
    begin_unlock, complete_unlock, decode_sensitive, encode_sensitive, fail_unlock,
    validate_draft, SensitiveValue, Transition, TransitionOutcome,
};
pub use domain::{
    invariant_lock_transition, invariant_request_binds_book, invariant_terms_match_lock_state,
    AuthorizationSignature, BookDraft, BookId, BookMetadata, BookRecord, BookRightsConfig,
    BookRightsError, Ciphertext, CodecError, CodecInput, DecryptedFields,
    DecryptionRequestPayload, DistributionWindow, EncryptedRecord, ErrorKind, Genre, LockState,
    PricingTier, RegisteredBook, RegistrationPayload, RightsEvent, RightsTerms,
    SensitiveFieldKind, SigningPayload, ValidatedDraft,
};
pub use ports::{AuthorizationSigner, BookRightsApi, FieldEncryptor, MockSigner, RegistryGateway};
pub use service::BookRightsService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
