//! Integration lifecycle — set up and unload one config entry per hub.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use homee_bridge_domain::DOMAIN;
use homee_bridge_domain::config_entry::ConfigEntry;
use homee_bridge_domain::device::HubDevice;
use homee_bridge_domain::error::{BridgeError, NotFoundError, SetupError};
use homee_bridge_domain::id::ConfigEntryId;

use crate::discovery::DiscoveryContext;
use crate::entity::HomeeEntity;
use crate::platforms;
use crate::ports::HubClient;
use crate::service_registry::ServiceRegistry;
use crate::set_value::{SERVICE_SET_VALUE, SetValueRequest};

/// How long [`HomeeIntegration::setup_entry`] waits for the first snapshot.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type Hubs<H> = Arc<Mutex<Vec<(ConfigEntryId, Arc<H>)>>>;

/// What a successful setup hands to the host.
pub struct SetupResult {
    /// Registry entry of the hub itself.
    pub device: HubDevice,
    /// Entities of all platforms.
    pub entities: Vec<Box<dyn HomeeEntity>>,
}

impl std::fmt::Debug for SetupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.entities.iter().map(|e| e.unique_id()).collect();
        f.debug_struct("SetupResult")
            .field("device", &self.device)
            .field("entities", &ids)
            .finish()
    }
}

/// Owns the loaded hubs and the `homee.set_value` service.
pub struct HomeeIntegration<H> {
    hubs: Hubs<H>,
    services: ServiceRegistry,
    connect_timeout: Duration,
}

impl<H> HomeeIntegration<H>
where
    H: HubClient + 'static,
{
    #[must_use]
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            hubs: Arc::new(Mutex::new(Vec::new())),
            services,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Hub loaded for `entry`, if any.
    #[must_use]
    pub fn hub(&self, entry: ConfigEntryId) -> Option<Arc<H>> {
        self.hubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(id, _)| *id == entry)
            .map(|(_, hub)| Arc::clone(hub))
    }

    /// Ids of all loaded entries, in setup order.
    #[must_use]
    pub fn loaded_entries(&self) -> Vec<ConfigEntryId> {
        self.hubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Load `entry` backed by `hub` and discover its entities.
    ///
    /// A failed setup leaves nothing behind: the hub is forgotten and told
    /// to disconnect.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::CannotConnect`] when the hub does not deliver
    /// its first snapshot within the connect timeout, the hub's own error
    /// when connecting fails, or a validation error for a malformed entry.
    #[tracing::instrument(skip_all, fields(entry = %entry.id, host = %entry.data.host))]
    pub async fn setup_entry(
        &self,
        entry: &ConfigEntry,
        hub: Arc<H>,
    ) -> Result<SetupResult, BridgeError> {
        entry.validate()?;
        self.hubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((entry.id, Arc::clone(&hub)));

        match self.load(entry, &hub).await {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::warn!(error = %err, "hub setup failed");
                self.forget(entry.id);
                hub.disconnect();
                if self.loaded_entries().is_empty() {
                    self.services.remove(DOMAIN, SERVICE_SET_VALUE);
                }
                Err(err)
            }
        }
    }

    async fn load(&self, entry: &ConfigEntry, hub: &H) -> Result<SetupResult, BridgeError> {
        tokio::time::timeout(self.connect_timeout, hub.wait_until_connected())
            .await
            .map_err(|_| BridgeError::from(SetupError::CannotConnect))??;

        let mut settings = hub.settings();
        if settings.homee_name.is_empty() {
            settings.homee_name.clone_from(&entry.title);
        }
        let device = HubDevice::from_settings(entry.unique_id(), &settings)?;

        if !self.services.has_service(DOMAIN, SERVICE_SET_VALUE) {
            self.register_set_value();
        }

        let ctx = DiscoveryContext::new(
            entry,
            &hub.nodes(),
            &hub.groups(),
            self.services.clone(),
            Some(device.identifier.clone()),
        );
        let entities = platforms::discover_all(&ctx);
        tracing::info!(
            nodes = ctx.nodes.len(),
            entities = entities.len(),
            "hub set up"
        );

        Ok(SetupResult { device, entities })
    }

    /// Unload `entry`: disconnect its hub and wait for the transport to
    /// close. The `homee.set_value` service goes away with the last hub.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] when the entry is not loaded.
    #[tracing::instrument(skip(self))]
    pub async fn unload_entry(&self, entry: ConfigEntryId) -> Result<(), BridgeError> {
        let hub = self.forget(entry).ok_or_else(|| NotFoundError {
            entity: "ConfigEntry",
            id: entry.to_string(),
        })?;

        hub.disconnect();
        hub.wait_until_disconnected().await;

        if self.loaded_entries().is_empty() {
            self.services.remove(DOMAIN, SERVICE_SET_VALUE);
        }
        tracing::info!("hub unloaded");
        Ok(())
    }

    fn forget(&self, entry: ConfigEntryId) -> Option<Arc<H>> {
        let mut hubs = self.hubs.lock().unwrap_or_else(PoisonError::into_inner);
        let index = hubs.iter().position(|(id, _)| *id == entry)?;
        Some(hubs.remove(index).1)
    }

    /// Route `homee.set_value` to the hub of the request's entry, or to the
    /// first loaded hub when the request names none.
    fn register_set_value(&self) {
        let hubs = Arc::clone(&self.hubs);
        self.services.register(DOMAIN, SERVICE_SET_VALUE, move |data| {
            let hubs = Arc::clone(&hubs);
            Box::pin(async move {
                let request = SetValueRequest::from_data(&data)?;
                let hub = {
                    let hubs = hubs.lock().unwrap_or_else(PoisonError::into_inner);
                    match request.entry {
                        Some(entry) => hubs.iter().find(|(id, _)| *id == entry),
                        None => hubs.first(),
                    }
                    .map(|(_, hub)| Arc::clone(hub))
                };
                let hub = hub.ok_or_else(|| NotFoundError {
                    entity: "Hub",
                    id: request
                        .entry
                        .map_or_else(|| "any".to_string(), |e| e.to_string()),
                })?;
                tracing::debug!(
                    node = %request.node,
                    attribute = %request.attribute,
                    value = request.value,
                    "set_value"
                );
                hub.set_value(request.node, request.attribute, request.value)
                    .await
            })
        });
    }
}

impl<H> std::fmt::Debug for HomeeIntegration<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .hubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("HomeeIntegration")
            .field("entries", &entries)
            .field("services", &self.services)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, Ordering};

    use homee_bridge_domain::attribute_type::AttributeType;
    use homee_bridge_domain::entity::Platform;
    use homee_bridge_domain::hub::HubSettings;
    use homee_bridge_domain::id::{AttributeId, GroupId, NodeId};
    use homee_bridge_domain::node::{Attribute, Group, Node, SharedNode, share};
    use homee_bridge_domain::profile::NodeProfile;
    use serde_json::{Value, json};

    use super::*;

    struct FakeHub {
        connects: bool,
        refuses: bool,
        nodes: Vec<SharedNode>,
        groups: Vec<Group>,
        writes: Mutex<Vec<(NodeId, AttributeId, f64)>>,
        disconnected: AtomicBool,
    }

    impl FakeHub {
        fn new(connects: bool) -> Self {
            let light = Node::builder()
                .id(NodeId(1))
                .name("Lamp")
                .profile(NodeProfile::DIMMABLE_LIGHT)
                .attribute(
                    Attribute::builder()
                        .id(AttributeId(10))
                        .attribute_type(AttributeType::ON_OFF)
                        .range(0.0, 1.0)
                        .editable(true)
                        .build(),
                )
                .attribute(
                    Attribute::builder()
                        .id(AttributeId(11))
                        .attribute_type(AttributeType::DIMMING_LEVEL)
                        .editable(true)
                        .build(),
                )
                .build();
            let plug = Node::builder()
                .id(NodeId(2))
                .name("Plug")
                .profile(NodeProfile::METERING_PLUG)
                .attribute(
                    Attribute::builder()
                        .id(AttributeId(20))
                        .attribute_type(AttributeType::ON_OFF)
                        .range(0.0, 1.0)
                        .editable(true)
                        .build(),
                )
                .attribute(
                    Attribute::builder()
                        .id(AttributeId(21))
                        .attribute_type(AttributeType::CURRENT_ENERGY_USE)
                        .build(),
                )
                .build();
            Self {
                connects,
                refuses: false,
                nodes: vec![share(light), share(plug)],
                groups: vec![Group {
                    id: GroupId(1),
                    name: "Home".to_string(),
                    category: 0,
                    nodes: vec![NodeId(1), NodeId(2)],
                }],
                writes: Mutex::new(Vec::new()),
                disconnected: AtomicBool::new(false),
            }
        }

        fn refusing() -> Self {
            Self {
                refuses: true,
                ..Self::new(true)
            }
        }
    }

    impl HubClient for FakeHub {
        fn wait_until_connected(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
            let connects = self.connects;
            let refuses = self.refuses;
            async move {
                if refuses {
                    return Err(SetupError::InvalidAuth.into());
                }
                if !connects {
                    std::future::pending::<()>().await;
                }
                Ok(())
            }
        }

        fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }

        fn wait_until_disconnected(&self) -> impl Future<Output = ()> + Send {
            async {}
        }

        fn set_value(
            &self,
            node: NodeId,
            attribute: AttributeId,
            value: f64,
        ) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.writes.lock().unwrap().push((node, attribute, value));
            async { Ok(()) }
        }

        fn nodes(&self) -> Vec<SharedNode> {
            self.nodes.clone()
        }

        fn groups(&self) -> Vec<Group> {
            self.groups.clone()
        }

        fn settings(&self) -> HubSettings {
            HubSettings {
                homee_name: String::new(),
                version: "2.32.0".to_string(),
                mac_address: "aabbccddeeff".to_string(),
            }
        }
    }

    fn entry() -> ConfigEntry {
        ConfigEntry::builder()
            .host("192.168.1.10")
            .credentials("user", "secret")
            .homee_id("A1B2C3")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_discover_entities_of_all_platforms() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let result = integration
            .setup_entry(&entry(), Arc::new(FakeHub::new(true)))
            .await
            .unwrap();

        let platforms: Vec<Platform> = result.entities.iter().map(|e| e.platform()).collect();
        assert_eq!(
            platforms,
            vec![Platform::Light, Platform::Switch, Platform::Sensor]
        );
        assert_eq!(result.device.identifier.id, "A1B2C3");
        assert_eq!(result.device.name, "homee cube at 192.168.1.10");
        assert_eq!(result.device.connections[0].value, "aa:bb:cc:dd:ee:ff");
        assert!(
            integration
                .services()
                .has_service(DOMAIN, SERVICE_SET_VALUE)
        );
    }

    #[tokio::test]
    async fn should_route_entity_commands_to_the_hub() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let hub = Arc::new(FakeHub::new(true));
        let result = integration
            .setup_entry(&entry(), Arc::clone(&hub))
            .await
            .unwrap();

        let light = result
            .entities
            .iter()
            .find(|e| e.platform() == Platform::Light)
            .unwrap();
        light
            .handle_service("turn_on", &json!({"brightness": 255}))
            .await
            .unwrap();

        let writes = hub.writes.lock().unwrap().clone();
        assert_eq!(writes.last(), Some(&(NodeId(1), AttributeId(11), 100.0)));
    }

    #[tokio::test]
    async fn should_default_set_value_fields_to_zero() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let hub = Arc::new(FakeHub::new(true));
        integration
            .setup_entry(&entry(), Arc::clone(&hub))
            .await
            .unwrap();

        integration
            .services()
            .call(DOMAIN, SERVICE_SET_VALUE, json!({"node": "2"}))
            .await
            .unwrap();
        assert_eq!(
            hub.writes.lock().unwrap().as_slice(),
            &[(NodeId(2), AttributeId(0), 0.0)]
        );
    }

    fn assert_nothing_loaded(integration: &HomeeIntegration<FakeHub>, hub: &FakeHub) {
        assert!(integration.loaded_entries().is_empty());
        assert!(hub.disconnected.load(Ordering::SeqCst));
        assert!(
            !integration
                .services()
                .has_service(DOMAIN, SERVICE_SET_VALUE)
        );
    }

    #[tokio::test]
    async fn should_fail_with_cannot_connect_after_timeout() {
        let integration = HomeeIntegration::new(ServiceRegistry::new())
            .with_connect_timeout(Duration::from_millis(20));
        let entry = entry();
        let hub = Arc::new(FakeHub::new(false));
        let err = integration
            .setup_entry(&entry, Arc::clone(&hub))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Setup(SetupError::CannotConnect)));
        assert!(integration.hub(entry.id).is_none());
        assert_nothing_loaded(&integration, &hub);
    }

    #[tokio::test]
    async fn should_forget_hub_that_fails_to_connect() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let hub = Arc::new(FakeHub::refusing());
        let err = integration
            .setup_entry(&entry(), Arc::clone(&hub))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Setup(SetupError::InvalidAuth)));
        assert_nothing_loaded(&integration, &hub);
    }

    #[tokio::test]
    async fn should_forget_hub_without_a_name() {
        let mut entry = entry();
        entry.title = String::new();
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let hub = Arc::new(FakeHub::new(true));
        let err = integration
            .setup_entry(&entry, Arc::clone(&hub))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Validation(_)));
        assert_nothing_loaded(&integration, &hub);
    }

    #[tokio::test]
    async fn should_keep_service_for_other_hubs_when_setup_fails() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        integration
            .setup_entry(&entry(), Arc::new(FakeHub::new(true)))
            .await
            .unwrap();
        let mut nameless = entry();
        nameless.title = String::new();
        integration
            .setup_entry(&nameless, Arc::new(FakeHub::new(true)))
            .await
            .unwrap_err();

        assert_eq!(integration.loaded_entries().len(), 1);
        assert!(
            integration
                .services()
                .has_service(DOMAIN, SERVICE_SET_VALUE)
        );
    }

    #[tokio::test]
    async fn should_remove_service_with_last_hub() {
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let first = entry();
        let second = entry();
        let hub = Arc::new(FakeHub::new(true));
        integration
            .setup_entry(&first, Arc::clone(&hub))
            .await
            .unwrap();
        integration
            .setup_entry(&second, Arc::new(FakeHub::new(true)))
            .await
            .unwrap();

        integration.unload_entry(first.id).await.unwrap();
        assert!(hub.disconnected.load(Ordering::SeqCst));
        assert!(
            integration
                .services()
                .has_service(DOMAIN, SERVICE_SET_VALUE)
        );

        integration.unload_entry(second.id).await.unwrap();
        assert!(
            !integration
                .services()
                .has_service(DOMAIN, SERVICE_SET_VALUE)
        );
    }

    #[tokio::test]
    async fn should_reject_unloading_unknown_entry() {
        let integration: HomeeIntegration<FakeHub> = HomeeIntegration::new(ServiceRegistry::new());
        let err = integration
            .unload_entry(ConfigEntryId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_publish_homee_data_when_enabled() {
        let mut entry = entry();
        entry.options.add_homee_data = true;
        let integration = HomeeIntegration::new(ServiceRegistry::new());
        let result = integration
            .setup_entry(&entry, Arc::new(FakeHub::new(true)))
            .await
            .unwrap();

        let extra = result.entities[0].extra_state_attributes().unwrap();
        assert_eq!(extra["homee_data"]["name"], Value::from("Lamp"));
    }
}
