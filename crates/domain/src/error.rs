//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! via `#[from]`, so callers can still match on the precise cause.

use crate::attribute_type::AttributeType;

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A node was asked for an attribute type it does not carry.
    #[error("attribute not found")]
    AttributeNotFound(#[from] AttributeNotFoundError),

    /// Setting up a hub connection failed.
    #[error("setup failed")]
    Setup(#[from] SetupError),

    /// The hub client reported an error.
    #[error("hub error")]
    Hub(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain-invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A name field was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A host field was empty.
    #[error("host must not be empty")]
    EmptyHost,

    /// A service call carried a field that could not be read as a number.
    #[error("service field `{field}` is not numeric")]
    InvalidServiceField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An entity was asked to run a service it does not implement.
    #[error("service `{service}` is not supported by {platform} entities")]
    UnsupportedService {
        /// Requested service name.
        service: String,
        /// Platform of the target entity.
        platform: &'static str,
    },

    /// A command needs a capability the entity does not expose.
    #[error("entity does not support `{feature}`")]
    UnsupportedFeature {
        /// The missing capability.
        feature: &'static str,
    },
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// Kind of object looked up (e.g. `"Node"`).
    pub entity: &'static str,
    /// Identifier used for the lookup.
    pub id: String,
}

/// A node does not carry an attribute of the requested type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("attribute of type {attribute_type} not found")]
pub struct AttributeNotFoundError {
    /// The requested attribute-type code.
    pub attribute_type: AttributeType,
}

/// Why a hub could not be set up. Both kinds are retryable from the user's
/// point of view.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum SetupError {
    /// The hub rejected the credentials.
    #[error("invalid credentials")]
    InvalidAuth,

    /// The hub could not be reached.
    #[error("cannot connect to hub")]
    CannotConnect,
}

impl SetupError {
    /// Key of the setup-form error shown to the user.
    #[must_use]
    pub fn form_error(self) -> &'static str {
        match self {
            Self::InvalidAuth => "invalid_auth",
            Self::CannotConnect => "cannot_connect",
        }
    }
}
