//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod in_memory_registry;
pub mod sealed_box_client;
pub mod timeout_gateway;

pub use in_memory_registry::{InMemoryRegistry, RegistryFault};
pub use sealed_box_client::SealedBoxEncryptionClient;
pub use timeout_gateway::TimeoutGateway;
