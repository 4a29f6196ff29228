//! # Ports Module
//!
//! Hexagonal architecture ports (interfaces).

pub mod inbound;
pub mod outbound;

pub use inbound::BookRightsApi;
pub use outbound::{AuthorizationSigner, FieldEncryptor, MockSigner, RegistryGateway};
