//! Hub client port — the live connection to one hub.

use std::future::Future;

use homee_bridge_domain::error::BridgeError;
use homee_bridge_domain::hub::HubSettings;
use homee_bridge_domain::id::{AttributeId, NodeId};
use homee_bridge_domain::node::{Group, SharedNode};

/// A connected hub as seen by the integration.
///
/// Implementations own the transport. Node snapshots are shared: entities keep
/// the returned [`SharedNode`]s and observe in-place updates through node
/// listeners.
pub trait HubClient: Send + Sync {
    /// Resolve once the hub is connected and its first full snapshot has been
    /// loaded.
    fn wait_until_connected(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Ask the transport to close. Returns immediately.
    fn disconnect(&self);

    /// Resolve once the transport reports the connection closed.
    fn wait_until_disconnected(&self) -> impl Future<Output = ()> + Send;

    /// Request a new target value for an attribute.
    ///
    /// Fire-and-forget: success means the command was queued, not that the
    /// hub applied it.
    fn set_value(
        &self,
        node: NodeId,
        attribute: AttributeId,
        value: f64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Every node currently known, in hub order.
    fn nodes(&self) -> Vec<SharedNode>;

    /// Every group currently known, in hub order.
    fn groups(&self) -> Vec<Group>;

    /// Hub-wide settings.
    fn settings(&self) -> HubSettings;
}
