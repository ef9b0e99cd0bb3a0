//! Change listeners owned by a [`Node`](crate::node::Node).
//!
//! Registering a listener returns a [`Subscription`]; dropping the
//! subscription removes the listener. Callbacks run outside the list lock and
//! outside the node lock, so a callback may read the node or register and drop
//! other subscriptions.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::id::NodeId;
use crate::node::Attribute;

type Callback = Arc<dyn Fn(NodeId, &Attribute) + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// The observer list of a single node.
#[derive(Default)]
pub struct Listeners {
    slots: Arc<Mutex<Slots>>,
}

impl Listeners {
    /// Register a callback invoked with `(node_id, attribute)` after every
    /// attribute change of the owning node.
    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NodeId, &Attribute) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let id = slots.next_id;
        slots.next_id += 1;
        slots.callbacks.push((id, Arc::new(callback)));
        Subscription {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Another handle on the same observer list.
    pub(crate) fn share(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }

    pub(crate) fn notify(&self, node_id: NodeId, attribute: &Attribute) {
        let callbacks: Vec<Callback> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(node_id, attribute);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Scoped registration of a node listener. Dropping it deregisters the
/// callback; it is a no-op once the node itself is gone.
#[must_use = "dropping a subscription removes the listener immediately"]
pub struct Subscription {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl Subscription {
    /// Explicitly deregister the listener.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::attribute_type::AttributeType;
    use crate::id::AttributeId;
    use crate::node::Node;
    use crate::profile::NodeProfile;

    fn node() -> Node {
        Node::builder()
            .id(NodeId(1))
            .name("Plug")
            .profile(NodeProfile::ON_OFF_PLUG)
            .attribute(
                Attribute::builder()
                    .id(AttributeId(10))
                    .attribute_type(AttributeType::ON_OFF)
                    .build(),
            )
            .build()
    }

    #[test]
    fn should_remove_listener_when_subscription_dropped() {
        let node = node();
        let sub = node.listeners().add(|_, _| {});
        assert_eq!(node.listeners().len(), 1);
        drop(sub);
        assert!(node.listeners().is_empty());
    }

    #[test]
    fn should_remove_listener_when_cancelled() {
        let node = node();
        let sub = node.listeners().add(|_, _| {});
        sub.cancel();
        assert!(node.listeners().is_empty());
    }

    #[test]
    fn should_only_remove_own_listener() {
        let node = node();
        let first = node.listeners().add(|_, _| {});
        let _second = node.listeners().add(|_, _| {});
        drop(first);
        assert_eq!(node.listeners().len(), 1);
    }

    #[test]
    fn should_tolerate_subscription_outliving_node() {
        let node = node();
        let sub = node.listeners().add(|_, _| {});
        drop(node);
        drop(sub);
    }

    #[test]
    fn should_invoke_every_listener() {
        let node = node();
        let calls = Arc::new(AtomicUsize::new(0));
        let c1 = Arc::clone(&calls);
        let c2 = Arc::clone(&calls);
        let _a = node.listeners().add(move |_, _| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let _b = node.listeners().add(move |_, _| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        let attribute = node.attributes[0].clone();
        node.listeners().notify(node.id, &attribute);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
