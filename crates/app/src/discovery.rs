//! Inputs shared by the platform discovery functions.

use homee_bridge_domain::config_entry::{ConfigEntry, EntryOptions};
use homee_bridge_domain::device::DeviceIdentifier;
use homee_bridge_domain::id::{ConfigEntryId, GroupId};
use homee_bridge_domain::node::{Group, SharedNode, read_node};

use crate::entity::EntityBase;
use crate::node_handle::NodeHandle;
use crate::service_registry::ServiceRegistry;

/// Nodes of the configured groups, each once, in group then membership
/// order. Without a group filter every group is used. Nodes in no group are
/// never imported.
#[must_use]
pub fn imported_nodes(
    options: &EntryOptions,
    nodes: &[SharedNode],
    groups: &[Group],
) -> Vec<SharedNode> {
    let selected: Vec<GroupId> = match &options.groups {
        Some(ids) => ids.clone(),
        None => groups.iter().map(|g| g.id).collect(),
    };

    let mut imported: Vec<SharedNode> = Vec::new();
    for group_id in selected {
        let Some(group) = groups.iter().find(|g| g.id == group_id) else {
            tracing::debug!(group = %group_id, "configured group not found on hub");
            continue;
        };
        for node_id in &group.nodes {
            if imported.iter().any(|n| read_node(n).id == *node_id) {
                continue;
            }
            if let Some(node) = nodes.iter().find(|n| read_node(n).id == *node_id) {
                imported.push(SharedNode::clone(node));
            }
        }
    }
    imported
}

/// Everything a platform needs to turn nodes into entities.
#[derive(Debug, Clone)]
pub struct DiscoveryContext {
    pub entry_id: ConfigEntryId,
    pub options: EntryOptions,
    pub services: ServiceRegistry,
    pub hub: Option<DeviceIdentifier>,
    /// Nodes selected by the entry's group filter.
    pub nodes: Vec<SharedNode>,
}

impl DiscoveryContext {
    /// Build the context for `entry`, applying its group filter.
    #[must_use]
    pub fn new(
        entry: &ConfigEntry,
        nodes: &[SharedNode],
        groups: &[Group],
        services: ServiceRegistry,
        hub: Option<DeviceIdentifier>,
    ) -> Self {
        Self {
            entry_id: entry.id,
            options: entry.options.clone(),
            services,
            hub,
            nodes: imported_nodes(&entry.options, nodes, groups),
        }
    }

    /// Handle for one of the context's nodes.
    #[must_use]
    pub fn handle(&self, node: &SharedNode) -> NodeHandle {
        NodeHandle::new(SharedNode::clone(node), self.entry_id, self.services.clone())
    }

    /// Entity base with the given unique id.
    #[must_use]
    pub fn base(&self, node: &SharedNode, unique_id: String) -> EntityBase {
        EntityBase {
            handle: self.handle(node),
            unique_id,
            hub: self.hub.clone(),
            add_homee_data: self.options.add_homee_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use homee_bridge_domain::id::NodeId;
    use homee_bridge_domain::node::{Node, share};

    use super::*;

    fn nodes() -> Vec<SharedNode> {
        (1..=4)
            .map(|id| {
                share(
                    Node::builder()
                        .id(NodeId(id))
                        .name(format!("n{id}"))
                        .build(),
                )
            })
            .collect()
    }

    fn groups() -> Vec<Group> {
        vec![
            Group {
                id: GroupId(1),
                name: "Living".to_string(),
                category: 0,
                nodes: vec![NodeId(2), NodeId(1)],
            },
            Group {
                id: GroupId(2),
                name: "Windows".to_string(),
                category: 0,
                nodes: vec![NodeId(1), NodeId(3)],
            },
        ]
    }

    fn ids(nodes: &[SharedNode]) -> Vec<u32> {
        nodes.iter().map(|n| read_node(n).id.get()).collect()
    }

    #[test]
    fn should_import_all_groups_when_unfiltered() {
        let imported = imported_nodes(&EntryOptions::default(), &nodes(), &groups());
        assert_eq!(ids(&imported), vec![2, 1, 3]);
    }

    #[test]
    fn should_import_only_configured_groups_in_configured_order() {
        let options = EntryOptions {
            groups: Some(vec![GroupId(2), GroupId(1)]),
            ..EntryOptions::default()
        };
        let imported = imported_nodes(&options, &nodes(), &groups());
        assert_eq!(ids(&imported), vec![1, 3, 2]);
    }

    #[test]
    fn should_skip_unknown_groups_and_nodes() {
        let mut groups = groups();
        groups[0].nodes.push(NodeId(99));
        let options = EntryOptions {
            groups: Some(vec![GroupId(42), GroupId(1)]),
            ..EntryOptions::default()
        };
        let imported = imported_nodes(&options, &nodes(), &groups);
        assert_eq!(ids(&imported), vec![2, 1]);
    }

    #[test]
    fn should_not_import_ungrouped_nodes() {
        let imported = imported_nodes(&EntryOptions::default(), &nodes(), &groups());
        assert!(!ids(&imported).contains(&4));
    }
}
