//! # Inbound Ports
//!
//! What the presentation layer may call.

use crate::domain::{BookDraft, BookId, BookRecord};
use async_trait::async_trait;

/// Book rights API - inbound port.
///
/// Both entry points are guarded and safe to call repeatedly. Failures are
/// reported through events and logs; the typed `register`/`decrypt` methods
/// on the service return the error itself.
#[async_trait]
pub trait BookRightsApi: Send + Sync {
    /// Register a draft. `None` if any step failed; the draft is unchanged.
    async fn register_book(&self, draft: &BookDraft) -> Option<BookRecord>;

    /// Decrypt one record's rights. `false` if it stays locked.
    async fn decrypt_book_rights(&self, book_id: &BookId) -> bool;

    /// Visible records, most recent first.
    fn records(&self) -> Vec<BookRecord>;

    /// True while any registration is in flight.
    fn is_encrypting(&self) -> bool;
}
