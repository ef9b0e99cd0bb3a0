//! # homee-bridge-domain
//!
//! Pure domain model for bridging a homee hub into a home-automation host.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the hub model: **Nodes**, their **Attributes**, and **Groups**
//! - Define the open code tables for node profiles and attribute types
//! - Provide the pure **value transforms** (position, mired, RGB, brightness)
//! - Define host-facing **entity snapshots**, capability flags and device info
//! - Define **config entries** and the options that drive classification
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

mod macros;

pub mod error;
pub mod id;
pub mod time;

pub mod attribute_type;
pub mod config_entry;
pub mod device;
pub mod entity;
pub mod features;
pub mod hub;
pub mod listener;
pub mod node;
pub mod profile;
pub mod transform;

/// Integration domain, used for service registration and device identifiers.
pub const DOMAIN: &str = "homee";
