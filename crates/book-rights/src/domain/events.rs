//! # Rights Events
//!
//! State changes published to the presentation layer over a
//! `tokio::sync::broadcast` channel. Events carry ids, titles and error
//! kinds, never sensitive plaintext.

use super::errors::ErrorKind;
use super::value_objects::BookId;

/// A lifecycle state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RightsEvent {
    /// A draft was registered and is now locked.
    Registered {
        /// Assigned id.
        book_id: BookId,
        /// Title, for the notification.
        title: String,
    },
    /// A registration attempt failed; the draft is unchanged.
    RegistrationFailed {
        /// Short draft fingerprint.
        draft: String,
        /// Failure class.
        kind: ErrorKind,
    },
    /// A decryption request is in flight.
    UnlockStarted {
        /// Target record.
        book_id: BookId,
    },
    /// Rights were revealed.
    Unlocked {
        /// Unlocked record.
        book_id: BookId,
    },
    /// Decryption failed; the record is locked again.
    UnlockFailed {
        /// Target record.
        book_id: BookId,
        /// Failure class.
        kind: ErrorKind,
    },
}

impl RightsEvent {
    /// Event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::UnlockStarted { .. } => "unlock_started",
            Self::Unlocked { .. } => "unlocked",
            Self::UnlockFailed { .. } => "unlock_failed",
        }
    }
}
