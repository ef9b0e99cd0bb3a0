//! Host service registry — named async handlers addressed by
//! `(domain, service)`.
//!
//! Entities never talk to the hub directly: value changes go through the
//! registered `homee.set_value` service, the same path automations use.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use homee_bridge_domain::error::{BridgeError, NotFoundError};

/// Boxed future returned by object-safe async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Handler =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<(), BridgeError>> + Send + Sync>;

/// Shared table of service handlers. Clones share the same table.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    handlers: Arc<Mutex<HashMap<(String, String), Handler>>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `domain.service`, replacing any previous one.
    pub fn register<F>(&self, domain: &str, service: &str, handler: F)
    where
        F: Fn(serde_json::Value) -> BoxFuture<'static, Result<(), BridgeError>>
            + Send
            + Sync
            + 'static,
    {
        tracing::debug!(domain, service, "registering service");
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((domain.to_string(), service.to_string()), Arc::new(handler));
    }

    /// Remove a service. Returns whether it was registered.
    pub fn remove(&self, domain: &str, service: &str) -> bool {
        tracing::debug!(domain, service, "removing service");
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(domain.to_string(), service.to_string()))
            .is_some()
    }

    /// Whether `domain.service` is registered.
    #[must_use]
    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(domain.to_string(), service.to_string()))
    }

    /// Invoke a service and wait for its handler to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] when no handler is registered, or
    /// whatever the handler returns.
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        data: serde_json::Value,
    ) -> Result<(), BridgeError> {
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(domain.to_string(), service.to_string()))
            .cloned();
        let handler = handler.ok_or_else(|| NotFoundError {
            entity: "Service",
            id: format!("{domain}.{service}"),
        })?;
        handler(data).await
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(|(domain, service)| format!("{domain}.{service}"))
            .collect();
        names.sort();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(registry: &ServiceRegistry, calls: &Arc<AtomicUsize>) {
        let calls = Arc::clone(calls);
        registry.register("homee", "ping", move |_| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });
    }

    #[tokio::test]
    async fn should_invoke_registered_handler() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        counting(&registry, &calls);

        registry
            .call("homee", "ping", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_service() {
        let registry = ServiceRegistry::new();
        let err = registry
            .call("homee", "missing", serde_json::Value::Null)
            .await
            .unwrap_err();
        match err {
            BridgeError::NotFound(inner) => assert_eq!(inner.id, "homee.missing"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_share_table_between_clones() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        counting(&registry.clone(), &calls);

        assert!(registry.has_service("homee", "ping"));
        assert!(registry.remove("homee", "ping"));
        assert!(!registry.has_service("homee", "ping"));
        assert!(!registry.remove("homee", "ping"));
    }
}
