//! Decoding of the JSON messages a homee hub pushes over its websocket.
//!
//! Every message is an object with a single key naming its kind
//! (`all`, `nodes`, `node`, `attribute`, `groups`, `relationships`,
//! `settings`, …). Names and units arrive percent-encoded.

use std::borrow::Cow;

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::hub::HubSettings;
use homee_bridge_domain::id::{AttributeId, GroupId, NodeId};
use homee_bridge_domain::node::{Attribute, Group, Node};
use homee_bridge_domain::profile::NodeProfile;
use homee_bridge_domain::time;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::HomeeError;

/// Percent-decode a hub string, keeping it as-is when it is not valid UTF-8
/// after decoding.
#[must_use]
pub fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

/// The hub encodes flags as `0`/`1`; accept real booleans too.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttributeDto {
    id: u32,
    node_id: u32,
    instance: u32,
    minimum: f64,
    maximum: f64,
    current_value: f64,
    target_value: f64,
    last_value: f64,
    unit: String,
    step_value: f64,
    #[serde(deserialize_with = "flag")]
    editable: bool,
    #[serde(rename = "type")]
    attribute_type: u16,
    last_changed: Option<i64>,
    name: String,
    data: String,
}

impl From<AttributeDto> for Attribute {
    fn from(dto: AttributeDto) -> Self {
        Attribute {
            id: AttributeId(dto.id),
            node_id: NodeId(dto.node_id),
            instance: dto.instance,
            attribute_type: AttributeType(dto.attribute_type),
            minimum: dto.minimum,
            maximum: dto.maximum,
            current_value: dto.current_value,
            target_value: dto.target_value,
            last_value: dto.last_value,
            step_value: dto.step_value,
            unit: decode(&dto.unit),
            editable: dto.editable,
            name: decode(&dto.name),
            data: decode(&dto.data),
            last_changed: dto.last_changed.and_then(time::from_unix),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeDto {
    id: u32,
    name: String,
    profile: u16,
    state: Option<u16>,
    protocol: u16,
    cube_type: u16,
    attributes: Vec<AttributeDto>,
}

impl From<NodeDto> for Node {
    fn from(dto: NodeDto) -> Self {
        let mut builder = Node::builder()
            .id(NodeId(dto.id))
            .name(decode(&dto.name))
            .profile(NodeProfile(dto.profile))
            .protocol(dto.protocol)
            .cube_type(dto.cube_type)
            .attributes(dto.attributes.into_iter().map(Attribute::from));
        if let Some(state) = dto.state {
            builder = builder.state(state);
        }
        builder.build()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroupDto {
    id: u32,
    name: String,
    category: u16,
}

impl From<GroupDto> for Group {
    fn from(dto: GroupDto) -> Self {
        Group {
            id: GroupId(dto.id),
            name: decode(&dto.name),
            category: dto.category,
            nodes: Vec::new(),
        }
    }
}

/// Membership of a node in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Relationship {
    pub group_id: GroupId,
    pub node_id: NodeId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsDto {
    homee_name: String,
    version: String,
    mac_address: String,
}

impl From<SettingsDto> for HubSettings {
    fn from(dto: SettingsDto) -> Self {
        HubSettings {
            homee_name: decode(&dto.homee_name),
            version: dto.version,
            mac_address: dto.mac_address,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AllDto {
    nodes: Vec<NodeDto>,
    groups: Vec<GroupDto>,
    relationships: Vec<Relationship>,
    settings: SettingsDto,
}

/// Full hub state delivered in answer to `GET:all`.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub groups: Vec<Group>,
    pub relationships: Vec<Relationship>,
    pub settings: HubSettings,
}

/// A decoded hub message.
#[derive(Debug)]
pub enum Message {
    All(Snapshot),
    Nodes(Vec<Node>),
    Node(Node),
    Attribute(Attribute),
    Groups(Vec<Group>),
    Relationships(Vec<Relationship>),
    Settings(HubSettings),
    /// A message kind the bridge does not use (e.g. `user`, `homeegram`).
    Other(String),
}

impl Message {
    /// Kind of the message, as named by its key.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::All(_) => "all",
            Self::Nodes(_) => "nodes",
            Self::Node(_) => "node",
            Self::Attribute(_) => "attribute",
            Self::Groups(_) => "groups",
            Self::Relationships(_) => "relationships",
            Self::Settings(_) => "settings",
            Self::Other(kind) => kind,
        }
    }
}

fn body<T: DeserializeOwned>(value: Value) -> Result<T, HomeeError> {
    serde_json::from_value(value).map_err(HomeeError::PayloadParse)
}

/// Decode one websocket text frame.
///
/// # Errors
///
/// Returns [`HomeeError::PayloadParse`] for invalid JSON or a body that does
/// not match its kind, and [`HomeeError::MalformedMessage`] when the frame is
/// not a single-key object.
pub fn parse_message(text: &str) -> Result<Message, HomeeError> {
    let value: Value = serde_json::from_str(text).map_err(HomeeError::PayloadParse)?;
    let Value::Object(map) = value else {
        return Err(HomeeError::MalformedMessage);
    };
    if map.len() != 1 {
        return Err(HomeeError::MalformedMessage);
    }
    let Some((kind, value)) = map.into_iter().next() else {
        return Err(HomeeError::MalformedMessage);
    };

    let message = match kind.as_str() {
        "all" => {
            let all: AllDto = body(value)?;
            Message::All(Snapshot {
                nodes: all.nodes.into_iter().map(Node::from).collect(),
                groups: all.groups.into_iter().map(Group::from).collect(),
                relationships: all.relationships,
                settings: all.settings.into(),
            })
        }
        "nodes" => {
            let nodes: Vec<NodeDto> = body(value)?;
            Message::Nodes(nodes.into_iter().map(Node::from).collect())
        }
        "node" => Message::Node(body::<NodeDto>(value)?.into()),
        "attribute" => Message::Attribute(body::<AttributeDto>(value)?.into()),
        "groups" => {
            let groups: Vec<GroupDto> = body(value)?;
            Message::Groups(groups.into_iter().map(Group::from).collect())
        }
        "relationships" => Message::Relationships(body(value)?),
        "settings" => Message::Settings(body::<SettingsDto>(value)?.into()),
        _ => Message::Other(kind),
    };
    Ok(message)
}
