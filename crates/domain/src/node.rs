//! Hub model — nodes, their attributes, and groups.
//!
//! A [`Node`] is replaced wholesale when the hub pushes a full snapshot and
//! mutated attribute-by-attribute when it pushes value changes. Entities
//! hold a [`SharedNode`] back-reference and read through it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::attribute_type::AttributeType;
use crate::error::AttributeNotFoundError;
use crate::id::{AttributeId, GroupId, NodeId};
use crate::listener::{Listeners, Subscription};
use crate::profile::NodeProfile;
use crate::time::Timestamp;

/// A node shared between the hub connection and the entities built from it.
pub type SharedNode = Arc<RwLock<Node>>;

/// Wrap a node for sharing.
#[must_use]
pub fn share(node: Node) -> SharedNode {
    Arc::new(RwLock::new(node))
}

/// Read-lock a shared node, recovering from poisoning.
pub fn read_node(node: &SharedNode) -> RwLockReadGuard<'_, Node> {
    node.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock a shared node, recovering from poisoning.
pub fn write_node(node: &SharedNode) -> RwLockWriteGuard<'_, Node> {
    node.write().unwrap_or_else(PoisonError::into_inner)
}

/// Apply a value-changed push to a shared node and notify every listener
/// exactly once. Listeners run after the write lock is released.
///
/// Returns `false` (and notifies nobody) when the node has no attribute with
/// the update's id.
pub fn update_node(node: &SharedNode, update: &Attribute) -> bool {
    let (node_id, attribute, listeners) = {
        let mut guard = write_node(node);
        let node_id = guard.id;
        let Some(attribute) = guard.apply_attribute(update).cloned() else {
            return false;
        };
        (node_id, attribute, guard.listeners.share())
    };
    listeners.notify(node_id, &attribute);
    true
}

/// Node state code meaning the device is reachable.
pub const NODE_STATE_AVAILABLE: u16 = 1;

/// A single controllable or observable facet of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub node_id: NodeId,
    /// Channel number on multi-channel devices.
    pub instance: u32,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub minimum: f64,
    pub maximum: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub last_value: f64,
    pub step_value: f64,
    pub unit: String,
    pub editable: bool,
    /// User-assigned name; often empty.
    pub name: String,
    /// Raw vendor payload carried next to the value.
    pub data: String,
    pub last_changed: Option<Timestamp>,
}

impl Attribute {
    /// Create a builder for constructing an [`Attribute`].
    #[must_use]
    pub fn builder() -> AttributeBuilder {
        AttributeBuilder::default()
    }

    /// Copy the mutable state of `update` into `self`. Identity fields
    /// (`id`, `node_id`, `attribute_type`) are kept.
    pub fn apply(&mut self, update: &Attribute) {
        self.instance = update.instance;
        self.minimum = update.minimum;
        self.maximum = update.maximum;
        self.current_value = update.current_value;
        self.target_value = update.target_value;
        self.last_value = update.last_value;
        self.step_value = update.step_value;
        self.unit.clone_from(&update.unit);
        self.editable = update.editable;
        self.name.clone_from(&update.name);
        self.data.clone_from(&update.data);
        self.last_changed = update.last_changed;
    }

    /// The current value read as an on/off flag.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.current_value != 0.0
    }
}

/// Step-by-step builder for [`Attribute`].
#[derive(Debug)]
pub struct AttributeBuilder {
    inner: Attribute,
}

impl Default for AttributeBuilder {
    fn default() -> Self {
        Self {
            inner: Attribute {
                id: AttributeId::default(),
                node_id: NodeId::default(),
                instance: 0,
                attribute_type: AttributeType::NONE,
                minimum: 0.0,
                maximum: 100.0,
                current_value: 0.0,
                target_value: 0.0,
                last_value: 0.0,
                step_value: 1.0,
                unit: String::new(),
                editable: false,
                name: String::new(),
                data: String::new(),
                last_changed: None,
            },
        }
    }
}

impl AttributeBuilder {
    #[must_use]
    pub fn id(mut self, id: AttributeId) -> Self {
        self.inner.id = id;
        self
    }

    #[must_use]
    pub fn node_id(mut self, node_id: NodeId) -> Self {
        self.inner.node_id = node_id;
        self
    }

    #[must_use]
    pub fn instance(mut self, instance: u32) -> Self {
        self.inner.instance = instance;
        self
    }

    #[must_use]
    pub fn attribute_type(mut self, attribute_type: AttributeType) -> Self {
        self.inner.attribute_type = attribute_type;
        self
    }

    #[must_use]
    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.inner.minimum = minimum;
        self.inner.maximum = maximum;
        self
    }

    /// Set both the current and target value.
    #[must_use]
    pub fn value(mut self, value: f64) -> Self {
        self.inner.current_value = value;
        self.inner.target_value = value;
        self
    }

    #[must_use]
    pub fn step(mut self, step: f64) -> Self {
        self.inner.step_value = step;
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.inner.unit = unit.into();
        self
    }

    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.inner.editable = editable;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.inner.data = data.into();
        self
    }

    #[must_use]
    pub fn last_changed(mut self, ts: Timestamp) -> Self {
        self.inner.last_changed = Some(ts);
        self
    }

    #[must_use]
    pub fn build(self) -> Attribute {
        self.inner
    }
}

/// A hub-managed physical or logical device.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub profile: NodeProfile,
    /// Attributes in hub order.
    pub attributes: Vec<Attribute>,
    /// Groups this node belongs to.
    pub groups: Vec<GroupId>,
    pub protocol: u16,
    pub state: u16,
    pub cube_type: u16,
    listeners: Listeners,
}

impl Node {
    /// Create a builder for constructing a [`Node`].
    #[must_use]
    pub fn builder() -> NodeBuilder {
        NodeBuilder::default()
    }

    /// The node's observer list.
    #[must_use]
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Register a change listener; see [`Listeners::add`].
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NodeId, &Attribute) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    /// Whether the hub reports the node as reachable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state == NODE_STATE_AVAILABLE
    }

    /// Whether an attribute of the given type exists.
    #[must_use]
    pub fn has_attribute(&self, attribute_type: AttributeType) -> bool {
        self.attribute_by_type(attribute_type).is_some()
    }

    /// First attribute of the given type, if any.
    #[must_use]
    pub fn attribute_by_type(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.attribute_type == attribute_type)
    }

    /// All attributes of the given type, in hub order.
    pub fn attributes_of_type(
        &self,
        attribute_type: AttributeType,
    ) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(move |a| a.attribute_type == attribute_type)
    }

    /// Attribute with the given id, if any.
    #[must_use]
    pub fn attribute_by_id(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Attribute of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeNotFoundError`] when the node carries no attribute
    /// of that type.
    pub fn attribute(
        &self,
        attribute_type: AttributeType,
    ) -> Result<&Attribute, AttributeNotFoundError> {
        self.attribute_by_type(attribute_type)
            .ok_or(AttributeNotFoundError { attribute_type })
    }

    /// Current value of the attribute of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeNotFoundError`] when the node carries no attribute
    /// of that type.
    pub fn value(&self, attribute_type: AttributeType) -> Result<f64, AttributeNotFoundError> {
        self.attribute(attribute_type).map(|a| a.current_value)
    }

    /// Apply a value-changed push to the matching attribute without
    /// notifying anyone; see [`update_node`] for the notifying variant.
    ///
    /// Returns the updated attribute, or `None` when the node has no
    /// attribute with the update's id.
    pub fn apply_attribute(&mut self, update: &Attribute) -> Option<&Attribute> {
        let attribute = self.attributes.iter_mut().find(|a| a.id == update.id)?;
        attribute.apply(update);
        Some(attribute)
    }

    /// Replace every hub-provided field with those of `fresh`, keeping the
    /// listener list.
    pub fn replace_with(&mut self, fresh: Node) {
        let Node {
            id,
            name,
            profile,
            attributes,
            groups,
            protocol,
            state,
            cube_type,
            listeners: _,
        } = fresh;
        self.id = id;
        self.name = name;
        self.profile = profile;
        self.attributes = attributes;
        self.groups = groups;
        self.protocol = protocol;
        self.state = state;
        self.cube_type = cube_type;
    }
}

/// Step-by-step builder for [`Node`].
#[derive(Debug, Default)]
pub struct NodeBuilder {
    id: NodeId,
    name: String,
    profile: NodeProfile,
    attributes: Vec<Attribute>,
    groups: Vec<GroupId>,
    protocol: u16,
    state: Option<u16>,
    cube_type: u16,
}

impl NodeBuilder {
    #[must_use]
    pub fn id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: NodeProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Append an attribute; its `node_id` is set to the node's id on build.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    #[must_use]
    pub fn group(mut self, group: GroupId) -> Self {
        self.groups.push(group);
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: u16) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn state(mut self, state: u16) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn cube_type(mut self, cube_type: u16) -> Self {
        self.cube_type = cube_type;
        self
    }

    /// Assemble the node. Hub data is taken as-is; nothing is validated.
    #[must_use]
    pub fn build(self) -> Node {
        let id = self.id;
        let attributes = self
            .attributes
            .into_iter()
            .map(|mut a| {
                a.node_id = id;
                a
            })
            .collect();
        Node {
            id,
            name: self.name,
            profile: self.profile,
            attributes,
            groups: self.groups,
            protocol: self.protocol,
            state: self.state.unwrap_or(NODE_STATE_AVAILABLE),
            cube_type: self.cube_type,
            listeners: Listeners::default(),
        }
    }
}

/// A named collection of nodes, used to filter what gets imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub category: u16,
    /// Member nodes in relationship order.
    pub nodes: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn dimmer() -> Node {
        Node::builder()
            .id(NodeId(5))
            .name("Hallway")
            .profile(NodeProfile::DIMMABLE_LIGHT)
            .attribute(
                Attribute::builder()
                    .id(AttributeId(1))
                    .attribute_type(AttributeType::ON_OFF)
                    .range(0.0, 1.0)
                    .editable(true)
                    .build(),
            )
            .attribute(
                Attribute::builder()
                    .id(AttributeId(2))
                    .attribute_type(AttributeType::DIMMING_LEVEL)
                    .value(40.0)
                    .editable(true)
                    .build(),
            )
            .build()
    }

    #[test]
    fn should_stamp_node_id_on_attributes() {
        let node = dimmer();
        assert!(node.attributes.iter().all(|a| a.node_id == NodeId(5)));
    }

    #[test]
    fn should_default_to_available_state() {
        assert!(dimmer().is_available());
    }

    #[test]
    fn should_find_attribute_by_type() {
        let node = dimmer();
        assert!(node.has_attribute(AttributeType::DIMMING_LEVEL));
        assert_eq!(node.value(AttributeType::DIMMING_LEVEL).unwrap(), 40.0);
    }

    #[test]
    fn should_return_typed_error_when_attribute_missing() {
        let node = dimmer();
        let err = node.attribute(AttributeType::POSITION).unwrap_err();
        assert_eq!(err.attribute_type, AttributeType::POSITION);
        assert!(!node.has_attribute(AttributeType::POSITION));
    }

    #[test]
    fn should_apply_update_and_notify_once() {
        let shared = share(dimmer());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _sub = read_node(&shared).add_listener(move |node_id, attribute| {
            assert_eq!(node_id, NodeId(5));
            assert_eq!(attribute.current_value, 80.0);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut update = read_node(&shared).attributes[1].clone();
        update.current_value = 80.0;
        assert!(update_node(&shared, &update));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let value = read_node(&shared).value(AttributeType::DIMMING_LEVEL);
        assert_eq!(value.unwrap(), 80.0);
    }

    #[test]
    fn should_ignore_update_for_unknown_attribute() {
        let shared = share(dimmer());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _sub = read_node(&shared).add_listener(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let update = Attribute::builder().id(AttributeId(99)).build();
        assert!(!update_node(&shared, &update));
        assert!(write_node(&shared).apply_attribute(&update).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_let_listener_lock_the_node_it_observes() {
        let shared = share(dimmer());
        let observed = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&observed);
        let node = Arc::clone(&shared);
        let _sub = read_node(&shared).add_listener(move |_, _| {
            let guard = node.try_read().expect("listener can read its node");
            *sink.lock().unwrap() = Some(guard.value(AttributeType::DIMMING_LEVEL).unwrap());
            drop(guard);
            let mut guard = node.try_write().expect("listener can write its node");
            guard.name = "Touched".to_string();
        });

        let mut update = read_node(&shared).attributes[1].clone();
        update.current_value = 10.0;
        assert!(update_node(&shared, &update));

        assert_eq!(*observed.lock().unwrap(), Some(10.0));
        assert_eq!(read_node(&shared).name, "Touched");
    }

    #[test]
    fn should_keep_identity_when_applying_update() {
        let mut node = dimmer();
        let mut update = node.attributes[0].clone();
        update.attribute_type = AttributeType::POSITION;
        update.current_value = 1.0;
        node.apply_attribute(&update);
        assert_eq!(node.attributes[0].attribute_type, AttributeType::ON_OFF);
        assert!(node.attributes[0].is_on());
    }

    #[test]
    fn should_keep_listeners_when_replaced() {
        let mut node = dimmer();
        let _sub = node.add_listener(|_, _| {});
        node.replace_with(
            Node::builder()
                .id(NodeId(5))
                .name("Renamed")
                .profile(NodeProfile::DIMMABLE_LIGHT)
                .build(),
        );
        assert_eq!(node.name, "Renamed");
        assert!(node.attributes.is_empty());
        assert_eq!(node.listeners().len(), 1);
    }

    #[test]
    fn should_recover_lock_helpers_on_shared_node() {
        let shared = share(dimmer());
        write_node(&shared).name = "Changed".to_string();
        assert_eq!(read_node(&shared).name, "Changed");
    }
}
