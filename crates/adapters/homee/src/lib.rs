//! # homee-bridge-adapter-homee
//!
//! homee adapter — keeps the live node store of one hub.
//!
//! ## Responsibilities
//! - Decode the JSON messages the hub pushes (`all`, `node`, `attribute`, …)
//! - Keep shared nodes, groups and memberships up to date, notifying node
//!   listeners on attribute changes
//! - Rebuild the entity registry whenever a node snapshot arrives
//! - Queue outbound commands (`GET:all`, `PUT:/nodes/…`) for the transport
//! - Implement the [`HubClient`](homee_bridge_app::ports::HubClient) port
//!
//! The websocket itself is not part of this crate: a transport feeds text
//! frames into [`HomeeConnection`] and drains its [`Outbound`] queue.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `homee-bridge-app` and
//! `homee-bridge-domain`.

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;

pub use config::HomeeConfig;
pub use connection::{ConnectionState, HomeeConnection, Outbound};
pub use error::HomeeError;
