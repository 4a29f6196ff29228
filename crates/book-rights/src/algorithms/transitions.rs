//! # Lock State Transitions
//!
//! Pure functions from a record (plus an operation result) to a new record
//! and an outcome tag. The lifecycle manager commits the returned record;
//! nothing here mutates.

use crate::domain::{
    invariant_lock_transition, invariant_terms_match_lock_state, BookRecord, BookRightsError,
    DistributionWindow, LockState, PricingTier,
};

/// How a transition affected the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// State moved forward.
    Applied,
    /// An in-flight operation failed; the record is back where it started.
    Reverted,
    /// Result arrived for a record already in the target state.
    Unchanged,
}

/// New record plus outcome tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Record to commit.
    pub record: BookRecord,
    /// Outcome tag.
    pub outcome: TransitionOutcome,
}

impl Transition {
    fn new(record: BookRecord, outcome: TransitionOutcome) -> Self {
        debug_assert!(invariant_terms_match_lock_state(&record));
        Self { record, outcome }
    }
}

/// `Locked → Unlocking`.
///
/// Any other starting state is an `InvalidState` guard rejection.
pub fn begin_unlock(record: &BookRecord) -> Result<Transition, BookRightsError> {
    invariant_lock_transition(record.id(), record.lock_state(), LockState::Unlocking)?;
    Ok(Transition::new(
        record.with_lock_state(LockState::Unlocking),
        TransitionOutcome::Applied,
    ))
}

/// `Unlocking → Unlocked` with the revealed terms.
///
/// Idempotent on an already unlocked record. A `Locked` record has no
/// request in flight, so a late result for it is rejected.
pub fn complete_unlock(
    record: &BookRecord,
    pricing_tier: PricingTier,
    distribution_window: DistributionWindow,
) -> Result<Transition, BookRightsError> {
    match record.lock_state() {
        LockState::Unlocked => Ok(Transition::new(record.clone(), TransitionOutcome::Unchanged)),
        state => {
            invariant_lock_transition(record.id(), state, LockState::Unlocked)?;
            Ok(Transition::new(
                record.revealed(pricing_tier, distribution_window),
                TransitionOutcome::Applied,
            ))
        }
    }
}

/// `Unlocking → Locked` after a failed request.
///
/// Ciphertext is carried over untouched. Other states are left as they are.
pub fn fail_unlock(record: &BookRecord) -> Transition {
    match record.lock_state() {
        LockState::Unlocking => Transition::new(
            record.with_lock_state(LockState::Locked),
            TransitionOutcome::Reverted,
        ),
        LockState::Locked | LockState::Unlocked => {
            Transition::new(record.clone(), TransitionOutcome::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, BookMetadata, Ciphertext, EncryptedRecord, Genre, RegisteredBook};

    fn locked() -> BookRecord {
        BookRecord::from_registered(RegisteredBook {
            id: BookId::new("1"),
            record: EncryptedRecord {
                metadata: BookMetadata {
                    title: "T".to_string(),
                    author: "A".to_string(),
                    publisher: "P".to_string(),
                    genre: Genre::Business,
                },
                pricing_tier: Ciphertext::from_bytes(vec![1; 80]),
                distribution_window: Ciphertext::from_bytes(vec![2; 80]),
            },
            publisher: [0u8; 20],
        })
    }

    #[test]
    fn test_begin_unlock_from_locked() {
        let record = locked();
        let t = begin_unlock(&record).unwrap();
        assert_eq!(t.outcome, TransitionOutcome::Applied);
        assert_eq!(t.record.lock_state(), LockState::Unlocking);
        assert_eq!(t.record.terms(), record.terms());
        // Input untouched
        assert_eq!(record.lock_state(), LockState::Locked);
    }

    #[test]
    fn test_begin_unlock_rejects_other_states() {
        let unlocking = begin_unlock(&locked()).unwrap().record;
        assert!(matches!(
            begin_unlock(&unlocking),
            Err(BookRightsError::InvalidState { .. })
        ));

        let unlocked = complete_unlock(&unlocking, PricingTier::Premium, DistributionWindow::Open)
            .unwrap()
            .record;
        assert!(matches!(
            begin_unlock(&unlocked),
            Err(BookRightsError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_complete_unlock_reveals() {
        let unlocking = begin_unlock(&locked()).unwrap().record;
        let t = complete_unlock(&unlocking, PricingTier::Premium, DistributionWindow::Exclusive)
            .unwrap();
        assert_eq!(t.outcome, TransitionOutcome::Applied);
        assert_eq!(t.record.lock_state(), LockState::Unlocked);
        assert_eq!(t.record.pricing_tier(), Some(PricingTier::Premium));
        assert!(invariant_terms_match_lock_state(&t.record));
    }

    #[test]
    fn test_complete_unlock_idempotent() {
        let unlocking = begin_unlock(&locked()).unwrap().record;
        let unlocked = complete_unlock(&unlocking, PricingTier::Basic, DistributionWindow::Limited)
            .unwrap()
            .record;
        let again = complete_unlock(&unlocked, PricingTier::Basic, DistributionWindow::Limited)
            .unwrap();
        assert_eq!(again.outcome, TransitionOutcome::Unchanged);
        assert_eq!(again.record, unlocked);
    }

    #[test]
    fn test_complete_unlock_rejects_locked() {
        assert!(complete_unlock(&locked(), PricingTier::Basic, DistributionWindow::Open).is_err());
    }

    #[test]
    fn test_fail_unlock_reverts_with_ciphertext_intact() {
        let record = locked();
        let unlocking = begin_unlock(&record).unwrap().record;
        let t = fail_unlock(&unlocking);
        assert_eq!(t.outcome, TransitionOutcome::Reverted);
        assert_eq!(t.record, record);
    }

    #[test]
    fn test_fail_unlock_never_relocks() {
        let unlocking = begin_unlock(&locked()).unwrap().record;
        let unlocked = complete_unlock(&unlocking, PricingTier::Basic, DistributionWindow::Open)
            .unwrap()
            .record;
        let t = fail_unlock(&unlocked);
        assert_eq!(t.outcome, TransitionOutcome::Unchanged);
        assert_eq!(t.record.lock_state(), LockState::Unlocked);
    }
}
