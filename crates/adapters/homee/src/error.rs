//! homee adapter error types.

use homee_bridge_domain::error::BridgeError;

/// Errors specific to the homee adapter.
#[derive(Debug, thiserror::Error)]
pub enum HomeeError {
    /// An incoming message was not valid homee JSON.
    #[error("failed to parse homee payload")]
    PayloadParse(#[source] serde_json::Error),

    /// A message was valid JSON but not a single-key object.
    #[error("malformed homee message")]
    MalformedMessage,

    /// The transport side of the connection is gone.
    #[error("homee connection closed")]
    ChannelClosed,

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

impl HomeeError {
    /// Convert into a [`BridgeError::Hub`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Domain(err) => err,
            other => BridgeError::Hub(Box::new(other)),
        }
    }
}

impl From<HomeeError> for BridgeError {
    fn from(err: HomeeError) -> Self {
        err.into_domain()
    }
}
