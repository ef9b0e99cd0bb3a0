//! Per-node convenience wrapper used by every entity.

use std::sync::RwLockReadGuard;

use homee_bridge_domain::DOMAIN;
use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::error::{AttributeNotFoundError, BridgeError};
use homee_bridge_domain::id::{AttributeId, ConfigEntryId, NodeId};
use homee_bridge_domain::listener::Subscription;
use homee_bridge_domain::node::{Attribute, Node, SharedNode, read_node};

use crate::service_registry::ServiceRegistry;
use crate::set_value::{SERVICE_SET_VALUE, SetValueRequest};

/// A shared node plus the means to change it.
///
/// Reads go straight to the node; writes are proxied through the
/// `homee.set_value` host service so they follow the same path as
/// user-initiated service calls.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    node: SharedNode,
    node_id: NodeId,
    entry: ConfigEntryId,
    services: ServiceRegistry,
}

impl NodeHandle {
    #[must_use]
    pub fn new(node: SharedNode, entry: ConfigEntryId, services: ServiceRegistry) -> Self {
        let node_id = read_node(&node).id;
        Self {
            node,
            node_id,
            entry,
            services,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    #[must_use]
    pub fn shared(&self) -> &SharedNode {
        &self.node
    }

    /// Read-lock the node. Do not hold the guard across an `.await`.
    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, Node> {
        read_node(&self.node)
    }

    #[must_use]
    pub fn has_attribute(&self, attribute_type: AttributeType) -> bool {
        self.read().has_attribute(attribute_type)
    }

    /// Current value of the attribute of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeNotFoundError`] when the node has no such attribute.
    pub fn attribute_value(
        &self,
        attribute_type: AttributeType,
    ) -> Result<f64, AttributeNotFoundError> {
        self.read().value(attribute_type)
    }

    /// A copy of the attribute of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeNotFoundError`] when the node has no such attribute.
    pub fn attribute(
        &self,
        attribute_type: AttributeType,
    ) -> Result<Attribute, AttributeNotFoundError> {
        self.read().attribute(attribute_type).cloned()
    }

    /// A copy of the attribute with the given id.
    #[must_use]
    pub fn attribute_by_id(&self, id: AttributeId) -> Option<Attribute> {
        self.read().attribute_by_id(id).cloned()
    }

    /// Set the attribute of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AttributeNotFound`] when the node has no such
    /// attribute, or the service call's error.
    pub async fn set_value(
        &self,
        attribute_type: AttributeType,
        value: f64,
    ) -> Result<(), BridgeError> {
        let id = self.read().attribute(attribute_type)?.id;
        self.set_value_by_id(id, value).await
    }

    /// Set the attribute with the given id through the host service.
    ///
    /// # Errors
    ///
    /// Returns the service call's error, e.g. [`BridgeError::NotFound`] when
    /// the service is not registered.
    #[tracing::instrument(skip(self), fields(node = %self.node_id))]
    pub async fn set_value_by_id(
        &self,
        attribute: AttributeId,
        value: f64,
    ) -> Result<(), BridgeError> {
        let request = SetValueRequest {
            node: self.node_id,
            attribute,
            value,
            entry: Some(self.entry),
        };
        self.services
            .call(DOMAIN, SERVICE_SET_VALUE, request.to_data())
            .await
    }

    /// Observe attribute changes of this node. The callback runs after the
    /// updater released the node, so it may read it.
    pub fn register_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NodeId, &Attribute) + Send + Sync + 'static,
    {
        self.read().add_listener(callback)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use homee_bridge_domain::node::{share, update_node};
    use homee_bridge_domain::profile::NodeProfile;

    use super::*;

    fn handle(services: ServiceRegistry) -> NodeHandle {
        let node = Node::builder()
            .id(NodeId(3))
            .name("Blind")
            .profile(NodeProfile::SHUTTER_POSITION_SWITCH)
            .attribute(
                Attribute::builder()
                    .id(AttributeId(30))
                    .attribute_type(AttributeType::POSITION)
                    .value(25.0)
                    .editable(true)
                    .build(),
            )
            .build();
        NodeHandle::new(share(node), ConfigEntryId::new(), services)
    }

    fn recorder(services: &ServiceRegistry) -> Arc<Mutex<Vec<SetValueRequest>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        services.register(DOMAIN, SERVICE_SET_VALUE, move |data| {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                sink.lock()
                    .unwrap()
                    .push(SetValueRequest::from_data(&data)?);
                Ok(())
            })
        });
        seen
    }

    #[test]
    fn should_read_attribute_value_by_type() {
        let handle = handle(ServiceRegistry::new());
        assert!(handle.has_attribute(AttributeType::POSITION));
        assert!((handle.attribute_value(AttributeType::POSITION).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn should_fail_with_typed_error_for_missing_attribute() {
        let handle = handle(ServiceRegistry::new());
        let err = handle.attribute_value(AttributeType::UP_DOWN).unwrap_err();
        assert_eq!(err.attribute_type, AttributeType::UP_DOWN);
    }

    #[tokio::test]
    async fn should_proxy_set_value_through_service() {
        let services = ServiceRegistry::new();
        let seen = recorder(&services);
        let handle = handle(services);

        handle
            .set_value(AttributeType::POSITION, 80.0)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].node, NodeId(3));
        assert_eq!(seen[0].attribute, AttributeId(30));
        assert!((seen[0].value - 80.0).abs() < 1e-9);
        assert!(seen[0].entry.is_some());
    }

    #[tokio::test]
    async fn should_not_call_service_for_missing_attribute() {
        let services = ServiceRegistry::new();
        let seen = recorder(&services);
        let handle = handle(services);

        let err = handle
            .set_value(AttributeType::UP_DOWN, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::AttributeNotFound(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_fail_when_service_not_registered() {
        let handle = handle(ServiceRegistry::new());
        let err = handle
            .set_value_by_id(AttributeId(30), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[test]
    fn should_notify_listener_on_update() {
        let handle = handle(ServiceRegistry::new());
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&hits);
        let _sub = handle.register_listener(move |_, attribute| {
            sink.lock().unwrap().push(attribute.current_value);
        });

        let mut update = handle.attribute(AttributeType::POSITION).unwrap();
        update.current_value = 60.0;
        update_node(handle.shared(), &update);

        assert_eq!(*hits.lock().unwrap(), vec![60.0]);
    }
}
