//! # homee-bridge-app
//!
//! Application layer — classification engine, entity platforms and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `HubClient` — the live connection to one hub
//!   - `Authenticator` — credential check used by the config flow
//! - Wrap hub nodes for entities (`NodeHandle`) and route value changes
//!   through the host's `homee.set_value` service (`ServiceRegistry`)
//! - Classify nodes per platform (light, cover, switch, sensor, binary
//!   sensor, climate) and build the matching entities
//! - Maintain the provider-based `EntityRegistry`
//! - Drive the per-hub lifecycle (`HomeeIntegration`) and the setup
//!   `ConfigFlow`
//!
//! ## Dependency rule
//! Depends on `homee-bridge-domain` only (plus `tokio` for timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod config_flow;
pub mod discovery;
pub mod entity;
pub mod integration;
pub mod node_handle;
pub mod platforms;
pub mod ports;
pub mod registry;
pub mod service_registry;
pub mod set_value;
