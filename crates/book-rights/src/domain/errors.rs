//! # Domain Errors
//!
//! Error types for the rights lifecycle.
//!
//! No variant ever carries a sensitive plaintext value. Codec failures name
//! the field, never the rejected input.

use super::value_objects::{BookId, LockState};
use thiserror::Error;

/// Field codec and draft validation errors.
///
/// Always a caller or UI defect. Never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input is not one of the field's recognized options.
    #[error("Unrecognized option for {field}")]
    UnknownOption {
        /// Field name
        field: &'static str,
    },

    /// Genre is not in the genre option set.
    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    /// Required metadata field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Wire bytes have the wrong length.
    #[error("Malformed codec input: expected {expected} bytes, got {actual}")]
    Malformed {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Wire version byte not understood.
    #[error("Unsupported codec version: {0}")]
    UnsupportedVersion(u8),

    /// Field tag byte not understood.
    #[error("Unknown field tag: {0:#04x}")]
    UnknownFieldTag(u8),

    /// Bytes belong to another field.
    #[error("Field mismatch: expected {expected}, got {actual}")]
    FieldMismatch {
        /// Field the caller asked for
        expected: &'static str,
        /// Field named by the tag
        actual: &'static str,
    },

    /// Option code not defined for the field.
    #[error("Unknown option code {code} for {field}")]
    UnknownCode {
        /// Field name
        field: &'static str,
        /// Code found on the wire
        code: u8,
    },

    /// Canonical serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Rights lifecycle error.
#[derive(Debug, Error)]
pub enum BookRightsError {
    /// Malformed draft or wire input.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Cryptographic context missing or sealing failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// The wallet holder declined to sign.
    #[error("Authorization declined by user")]
    UserRejected,

    /// No identity connected.
    #[error("No signer connected")]
    SignerUnavailable,

    /// Registry refused the submission.
    #[error("Registry rejected submission: {0}")]
    RegistryRejected(String),

    /// Transient transport failure or timeout.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Caller is not authorized to view this record's rights.
    #[error("Decryption denied for book {book_id}")]
    Denied {
        /// Record the request targeted
        book_id: BookId,
    },

    /// Record is not in a state that allows the operation.
    #[error("Invalid state for {subject}: {state}")]
    InvalidState {
        /// Book id or draft fingerprint
        subject: String,
        /// Observed state
        state: String,
    },

    /// No record with this id in the catalog.
    #[error("Book not found: {0}")]
    NotFound(BookId),
}

impl BookRightsError {
    /// Guard rejection for a record in `state`.
    pub fn invalid_lock_state(book_id: &BookId, state: LockState) -> Self {
        Self::InvalidState {
            subject: book_id.to_string(),
            state: state.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Codec(_) => ErrorKind::Codec,
            Self::Encryption(_) => ErrorKind::Encryption,
            Self::UserRejected => ErrorKind::UserRejected,
            Self::SignerUnavailable => ErrorKind::SignerUnavailable,
            Self::RegistryRejected(_) => ErrorKind::RegistryRejected,
            Self::NetworkError(_) => ErrorKind::Network,
            Self::Denied { .. } => ErrorKind::Denied,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Error classification used for retry decisions, events and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input.
    Codec,
    /// Crypto context failure.
    Encryption,
    /// Expected user decision.
    UserRejected,
    /// No connected identity.
    SignerUnavailable,
    /// Terminal for that submission.
    RegistryRejected,
    /// Transient.
    Network,
    /// Authoritative refusal.
    Denied,
    /// Guard rejection.
    InvalidState,
    /// Unknown record.
    NotFound,
}

impl ErrorKind {
    /// Whether repeating the whole operation may succeed without any change
    /// by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Encryption)
    }

    /// Whether this is a normal outcome rather than a defect.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::UserRejected | Self::Denied | Self::InvalidState)
    }

    /// Stable label for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Codec => "codec",
            Self::Encryption => "encryption",
            Self::UserRejected => "user_rejected",
            Self::SignerUnavailable => "signer_unavailable",
            Self::RegistryRejected => "registry_rejected",
            Self::Network => "network",
            Self::Denied => "denied",
            Self::InvalidState => "invalid_state",
            Self::NotFound => "not_found",
        }
    }
}
