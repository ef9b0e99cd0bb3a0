//! Authenticator port — credential check used by the config flow.

use std::future::Future;

use homee_bridge_domain::error::BridgeError;

/// Obtains an access token from a hub.
///
/// Implementations must report rejected credentials as
/// [`SetupError::InvalidAuth`](homee_bridge_domain::error::SetupError::InvalidAuth)
/// and unreachable hubs as
/// [`SetupError::CannotConnect`](homee_bridge_domain::error::SetupError::CannotConnect);
/// anything else is shown to the user as an unknown error.
pub trait Authenticator: Send + Sync {
    fn access_token(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, BridgeError>> + Send;
}
