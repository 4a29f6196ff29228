//! # Domain Module
//!
//! Core domain types for the rights lifecycle.

pub mod entities;
pub mod errors;
pub mod events;
pub mod invariants;
pub mod secure_plaintext;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use events::RightsEvent;
pub use invariants::*;
pub use secure_plaintext::{CodecInput, DecryptedFields};
pub use value_objects::*;
