//! # Domain Invariants
//!
//! Rules every catalog record satisfies after each transition.

use super::entities::{BookRecord, DecryptionRequestPayload};
use super::errors::BookRightsError;
use super::value_objects::{BookId, LockState};

/// Invariant: sensitive fields are ciphertext iff the record is `Locked` or
/// `Unlocking`, plaintext iff `Unlocked`.
pub fn invariant_terms_match_lock_state(record: &BookRecord) -> bool {
    record.terms().is_sealed() == record.lock_state().holds_ciphertext()
}

/// Invariant: lock state moves only along `Locked → Unlocking → {Unlocked | Locked}`.
pub fn invariant_lock_transition(
    book_id: &BookId,
    from: LockState,
    to: LockState,
) -> Result<(), BookRightsError> {
    if !from.can_transition_to(to) {
        return Err(BookRightsError::invalid_lock_state(book_id, from));
    }
    Ok(())
}

/// Invariant: a decryption authorization names exactly the record it unlocks.
pub fn invariant_request_binds_book(request: &DecryptionRequestPayload, book_id: &BookId) -> bool {
    request.book_id == *book_id
}
