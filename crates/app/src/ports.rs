//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the classification core and the hub. They
//! are defined here (in `app`) so that both the platforms and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod authenticator;
pub mod hub_client;

pub use authenticator::Authenticator;
pub use hub_client::HubClient;
