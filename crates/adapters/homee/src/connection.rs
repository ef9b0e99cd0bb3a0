//! Live state of one hub connection.
//!
//! [`HomeeConnection`] is transport-agnostic: the transport feeds it text
//! frames through [`HomeeConnection::run`] (or the `on_*` callbacks) and drains
//! the [`Outbound`] queue returned by [`HomeeConnection::new`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use homee_bridge_app::ports::HubClient;
use homee_bridge_app::registry::{EntityEntry, EntityRegistry};
use homee_bridge_domain::entity::Platform;
use homee_bridge_domain::error::BridgeError;
use homee_bridge_domain::hub::HubSettings;
use homee_bridge_domain::id::{AttributeId, NodeId};
use homee_bridge_domain::node::{
    Attribute, Group, Node, SharedNode, read_node, share, update_node, write_node,
};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use crate::command;
use crate::config::HomeeConfig;
use crate::error::HomeeError;
use crate::message::{Message, Relationship, Snapshot, parse_message};

/// Lifecycle of the connection as seen by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Transport open, waiting for the first full snapshot.
    Connecting,
    Connected,
    Disconnecting,
}

/// Frames the transport must send to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Command(String),
    /// Close the websocket.
    Close,
}

#[derive(Debug)]
struct Store {
    nodes: Vec<SharedNode>,
    groups: Vec<Group>,
    relationships: Vec<Relationship>,
    settings: HubSettings,
    registry: EntityRegistry,
}

impl Store {
    fn node(&self, id: NodeId) -> Option<&SharedNode> {
        self.nodes.iter().find(|n| read_node(n).id == id)
    }

    /// Replace the node list, reusing the shared handle of every node that
    /// already exists so entity back-references stay valid.
    fn merge_nodes(&mut self, fresh: Vec<Node>) {
        let mut merged = Vec::with_capacity(fresh.len());
        for node in fresh {
            match self.node(node.id) {
                Some(existing) => {
                    write_node(existing).replace_with(node);
                    merged.push(existing.clone());
                }
                None => merged.push(share(node)),
            }
        }
        self.nodes = merged;
    }

    fn upsert_node(&mut self, node: Node) {
        match self.node(node.id) {
            Some(existing) => write_node(existing).replace_with(node),
            None => self.nodes.push(share(node)),
        }
        self.rebuild_memberships();
    }

    fn rebuild_memberships(&mut self) {
        for group in &mut self.groups {
            group.nodes = self
                .relationships
                .iter()
                .filter(|r| r.group_id == group.id)
                .map(|r| r.node_id)
                .collect();
        }
        for shared in &self.nodes {
            let mut node = write_node(shared);
            let id = node.id;
            node.groups = self
                .relationships
                .iter()
                .filter(|r| r.node_id == id)
                .map(|r| r.group_id)
                .collect();
        }
    }

    fn rebuild_registry(&mut self) {
        self.registry.clear();
        for shared in &self.nodes {
            self.registry.register(&read_node(shared));
        }
    }
}

/// Node store and command queue of one hub; implements [`HubClient`].
#[derive(Debug)]
pub struct HomeeConnection {
    store: Mutex<Store>,
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::Sender<Outbound>,
}

impl HomeeConnection {
    /// Create a disconnected connection and the queue its transport drains.
    #[must_use]
    pub fn new(config: &HomeeConfig) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, rx) = mpsc::channel(config.command_queue.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let connection = Self {
            store: Mutex::new(Store {
                nodes: Vec::new(),
                groups: Vec::new(),
                relationships: Vec::new(),
                settings: HubSettings::default(),
                registry: EntityRegistry::with_default_providers(),
            }),
            state,
            outbound,
        };
        (connection, rx)
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Stream of connection states, starting with the current one.
    #[must_use]
    pub fn state_stream(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.state.subscribe())
    }

    /// Entity descriptors the registry produced for `platform`.
    #[must_use]
    pub fn registry_entries(&self, platform: Platform) -> Vec<EntityEntry> {
        self.store()
            .registry
            .entries_for(platform)
            .cloned()
            .collect()
    }

    /// Transport opened: request the full state.
    pub fn on_open(&self) {
        self.state.send_replace(ConnectionState::Connecting);
        if self
            .outbound
            .try_send(Outbound::Command(command::GET_ALL.to_string()))
            .is_err()
        {
            tracing::warn!("outbound queue unavailable, snapshot not requested");
        }
    }

    /// Transport closed.
    pub fn on_close(&self) {
        self.state.send_replace(ConnectionState::Disconnected);
        tracing::info!("homee connection closed");
    }

    /// Decode and apply one text frame.
    ///
    /// # Errors
    ///
    /// Returns the decoding error; the store is left untouched.
    pub fn on_message(&self, text: &str) -> Result<(), HomeeError> {
        let message = parse_message(text)?;
        self.handle(message);
        Ok(())
    }

    fn handle(&self, message: Message) {
        tracing::trace!(kind = message.kind(), "homee message");
        match message {
            Message::All(snapshot) => self.load_snapshot(snapshot),
            Message::Nodes(nodes) => {
                let mut store = self.store();
                store.merge_nodes(nodes);
                store.rebuild_memberships();
                store.rebuild_registry();
            }
            Message::Node(node) => self.store().upsert_node(node),
            Message::Attribute(attribute) => self.apply_attribute(&attribute),
            Message::Groups(groups) => {
                let mut store = self.store();
                store.groups = groups;
                store.rebuild_memberships();
            }
            Message::Relationships(relationships) => {
                let mut store = self.store();
                store.relationships = relationships;
                store.rebuild_memberships();
            }
            Message::Settings(settings) => self.store().settings = settings,
            Message::Other(kind) => tracing::debug!(kind, "ignoring homee message"),
        }
    }

    fn load_snapshot(&self, snapshot: Snapshot) {
        {
            let mut store = self.store();
            store.merge_nodes(snapshot.nodes);
            store.groups = snapshot.groups;
            store.relationships = snapshot.relationships;
            store.settings = snapshot.settings;
            store.rebuild_memberships();
            store.rebuild_registry();
            tracing::info!(
                nodes = store.nodes.len(),
                groups = store.groups.len(),
                entities = store.registry.len(),
                "homee snapshot loaded"
            );
        }
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                return false;
            }
            *state = ConnectionState::Connected;
            true
        });
    }

    fn apply_attribute(&self, attribute: &Attribute) {
        let Some(node) = self.store().node(attribute.node_id).cloned() else {
            tracing::debug!(node_id = %attribute.node_id, "attribute for unknown node");
            return;
        };
        if !update_node(&node, attribute) {
            tracing::debug!(
                node_id = %attribute.node_id,
                attribute_id = %attribute.id,
                "attribute not found on node"
            );
        }
    }

    /// Drive the connection from a stream of text frames until it ends.
    /// Frames that fail to decode are logged and skipped.
    pub async fn run<S>(&self, mut frames: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        self.on_open();
        while let Some(frame) = frames.next().await {
            if let Err(err) = self.on_message(&frame) {
                tracing::warn!(error = %err, "skipping homee message");
            }
        }
        self.on_close();
    }
}

impl HubClient for HomeeConnection {
    async fn wait_until_connected(&self) -> Result<(), BridgeError> {
        let mut rx = self.state.subscribe();
        rx.wait_for(|state| *state == ConnectionState::Connected)
            .await
            .map(|_| ())
            .map_err(|_| HomeeError::ChannelClosed.into_domain())
    }

    fn disconnect(&self) {
        let closing = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                return false;
            }
            *state = ConnectionState::Disconnecting;
            true
        });
        if !closing {
            return;
        }
        if self.outbound.try_send(Outbound::Close).is_err() {
            // Nobody is left to close the transport and report it.
            tracing::warn!("outbound queue unavailable, close not requested");
            self.state.send_replace(ConnectionState::Disconnected);
        }
    }

    async fn wait_until_disconnected(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await;
    }

    async fn set_value(
        &self,
        node: NodeId,
        attribute: AttributeId,
        value: f64,
    ) -> Result<(), BridgeError> {
        tracing::debug!(%node, %attribute, value, "homee set_value");
        self.outbound
            .send(Outbound::Command(command::set_value(node, attribute, value)))
            .await
            .map_err(|_| HomeeError::ChannelClosed.into_domain())
    }

    fn nodes(&self) -> Vec<SharedNode> {
        self.store().nodes.clone()
    }

    fn groups(&self) -> Vec<Group> {
        self.store().groups.clone()
    }

    fn settings(&self) -> HubSettings {
        self.store().settings.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use homee_bridge_domain::attribute_type::AttributeType;
    use homee_bridge_domain::id::GroupId;

    use super::*;

    const SNAPSHOT: &str = r#"{"all":{
        "nodes":[
            {"id":1,"name":"Lamp","profile":1004,"state":1,"attributes":[
                {"id":10,"node_id":1,"type":1,"editable":1,"maximum":1,"current_value":0},
                {"id":11,"node_id":1,"type":2,"editable":1,"maximum":100,"unit":"%25"}
            ]},
            {"id":2,"name":"Plug","profile":10,"state":1,"attributes":[
                {"id":20,"node_id":2,"type":1,"editable":1,"maximum":1}
            ]}
        ],
        "groups":[{"id":5,"name":"Windows","category":0}],
        "relationships":[{"group_id":5,"node_id":2}],
        "settings":{"homee_name":"homee","version":"2.32","mac_address":"aabbccddeeff"}
    }}"#;

    fn connection() -> (HomeeConnection, mpsc::Receiver<Outbound>) {
        HomeeConnection::new(&HomeeConfig::default())
    }

    fn loaded() -> (HomeeConnection, mpsc::Receiver<Outbound>) {
        let (conn, rx) = connection();
        conn.on_open();
        conn.on_message(SNAPSHOT).unwrap();
        (conn, rx)
    }

    fn node(conn: &HomeeConnection, id: u32) -> SharedNode {
        conn.nodes()
            .into_iter()
            .find(|n| read_node(n).id == NodeId(id))
            .unwrap()
    }

    #[test]
    fn should_request_snapshot_on_open() {
        let (conn, mut rx) = connection();
        conn.on_open();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Command("GET:all".to_string())
        );
    }

    #[test]
    fn should_connect_after_first_snapshot() {
        let (conn, _rx) = loaded();
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(conn.nodes().len(), 2);
        assert_eq!(conn.settings().homee_name, "homee");
    }

    #[test]
    fn should_rebuild_memberships_from_relationships() {
        let (conn, _rx) = loaded();
        assert_eq!(conn.groups()[0].nodes, vec![NodeId(2)]);
        assert_eq!(read_node(&node(&conn, 2)).groups, vec![GroupId(5)]);
        assert!(read_node(&node(&conn, 1)).groups.is_empty());

        conn.on_message(r#"{"relationships":[{"group_id":5,"node_id":1}]}"#)
            .unwrap();
        assert_eq!(conn.groups()[0].nodes, vec![NodeId(1)]);
        assert!(read_node(&node(&conn, 2)).groups.is_empty());
    }

    #[test]
    fn should_rebuild_registry_on_snapshot() {
        let (conn, _rx) = loaded();
        assert_eq!(conn.registry_entries(Platform::Light).len(), 1);
        assert_eq!(conn.registry_entries(Platform::Switch).len(), 1);

        conn.on_message(
            r#"{"all":{"nodes":[{"id":2,"name":"Plug","profile":10,"attributes":[
                {"id":20,"node_id":2,"type":1,"editable":1,"maximum":1}]}]}}"#,
        )
        .unwrap();
        assert!(conn.registry_entries(Platform::Light).is_empty());
        assert_eq!(conn.registry_entries(Platform::Switch).len(), 1);
    }

    #[test]
    fn should_notify_listener_once_and_leave_other_nodes_untouched() {
        let (conn, _rx) = loaded();
        let lamp_calls = Arc::new(AtomicUsize::new(0));
        let plug_calls = Arc::new(AtomicUsize::new(0));
        let lamp = node(&conn, 1);
        let plug = node(&conn, 2);
        let counter = Arc::clone(&lamp_calls);
        let _lamp_sub = read_node(&lamp).add_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&plug_calls);
        let _plug_sub = read_node(&plug).add_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        conn.on_message(
            r#"{"attribute":{"id":10,"node_id":1,"type":1,"editable":1,"maximum":1,"current_value":1}}"#,
        )
        .unwrap();

        assert_eq!(lamp_calls.load(Ordering::SeqCst), 1);
        assert_eq!(plug_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            read_node(&lamp).value(AttributeType::ON_OFF).unwrap(),
            1.0
        );
    }

    #[test]
    fn should_keep_shared_handles_across_snapshots() {
        let (conn, _rx) = loaded();
        let before = node(&conn, 1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = read_node(&before).add_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        conn.on_message(SNAPSHOT).unwrap();
        assert!(Arc::ptr_eq(&before, &node(&conn, 1)));

        conn.on_message(r#"{"attribute":{"id":11,"node_id":1,"type":2,"current_value":40}}"#)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_ignore_attribute_of_unknown_node() {
        let (conn, _rx) = loaded();
        conn.on_message(r#"{"attribute":{"id":99,"node_id":42,"type":1}}"#)
            .unwrap();
        assert_eq!(conn.nodes().len(), 2);
    }

    #[test]
    fn should_upsert_single_node() {
        let (conn, _rx) = loaded();
        conn.on_message(r#"{"node":{"id":3,"name":"New","profile":10,"attributes":[]}}"#)
            .unwrap();
        assert_eq!(conn.nodes().len(), 3);
        conn.on_message(r#"{"node":{"id":3,"name":"Renamed","profile":10,"attributes":[]}}"#)
            .unwrap();
        assert_eq!(conn.nodes().len(), 3);
        assert_eq!(read_node(&node(&conn, 3)).name, "Renamed");
    }

    #[tokio::test]
    async fn should_skip_malformed_messages_when_running() {
        let (conn, mut rx) = connection();
        let frames = tokio_stream::iter(vec![
            "{nope".to_string(),
            SNAPSHOT.to_string(),
            r#"{"user":{}}"#.to_string(),
        ]);

        conn.run(frames).await;

        assert_eq!(conn.nodes().len(), 2);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(matches!(rx.recv().await, Some(Outbound::Command(_))));
    }

    #[tokio::test]
    async fn should_resolve_wait_until_connected() {
        let (conn, _rx) = loaded();
        conn.wait_until_connected().await.unwrap();
    }

    #[tokio::test]
    async fn should_queue_close_on_disconnect() {
        let (conn, mut rx) = loaded();
        let _ = rx.recv().await;
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnecting);
        assert_eq!(rx.recv().await, Some(Outbound::Close));
        conn.on_close();
        conn.wait_until_disconnected().await;
    }

    #[tokio::test]
    async fn should_stay_disconnected_when_transport_already_closed() {
        let (conn, rx) = connection();
        conn.on_open();
        conn.on_close();
        drop(rx);

        conn.disconnect();

        assert_eq!(conn.state(), ConnectionState::Disconnected);
        tokio::time::timeout(Duration::from_millis(500), conn.wait_until_disconnected())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_mark_disconnected_when_close_cannot_be_queued() {
        let (conn, rx) = loaded();
        drop(rx);

        conn.disconnect();

        assert_eq!(conn.state(), ConnectionState::Disconnected);
        tokio::time::timeout(Duration::from_millis(500), conn.wait_until_disconnected())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_queue_set_value_command() {
        let (conn, mut rx) = loaded();
        let _ = rx.recv().await;
        conn.set_value(NodeId(1), AttributeId(11), 50.0)
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(Outbound::Command(
                "PUT:/nodes/1/attributes/11?target_value=50".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn should_fail_set_value_when_transport_gone() {
        let (conn, rx) = connection();
        drop(rx);
        let err = conn
            .set_value(NodeId(1), AttributeId(11), 50.0)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Hub(_)));
    }

    #[tokio::test]
    async fn should_stream_state_changes() {
        let (conn, _rx) = connection();
        let mut states = conn.state_stream();
        assert_eq!(states.next().await, Some(ConnectionState::Disconnected));
        conn.on_open();
        assert_eq!(states.next().await, Some(ConnectionState::Connecting));
    }
}
