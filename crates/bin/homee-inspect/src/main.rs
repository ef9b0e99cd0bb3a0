//! # homee-inspect
//!
//! Composition root that wires the homee adapter into the integration and
//! prints what the bridge would expose to the host.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Feed a recorded hub snapshot through [`HomeeConnection`]
//! - Set up the config entry and print the hub device and entity snapshots
//! - Run the configured service calls, then unload the entry
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod replay;

use std::sync::Arc;

use anyhow::Context;
use homee_bridge_adapter_homee::HomeeConnection;
use homee_bridge_app::integration::HomeeIntegration;
use homee_bridge_app::service_registry::ServiceRegistry;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_target(false)
        .compact()
        .init();

    let snapshot = std::fs::read_to_string(&config.snapshot.path)
        .with_context(|| format!("failed to read snapshot {}", config.snapshot.path))?;
    let entry = config.entry()?;

    // Transport
    let (connection, outbound) = HomeeConnection::new(&config.connection);
    let connection = Arc::new(connection);
    let transport = tokio::spawn(replay::run(Arc::clone(&connection), outbound, snapshot));

    // Integration
    let integration = HomeeIntegration::new(ServiceRegistry::new())
        .with_connect_timeout(config.connection.connect_timeout());
    let setup = integration
        .setup_entry(&entry, Arc::clone(&connection))
        .await
        .context("failed to set up homee entry")?;

    for action in &config.actions {
        let entity = setup
            .entities
            .iter()
            .find(|e| e.unique_id() == action.entity)
            .with_context(|| format!("unknown entity {}", action.entity))?;
        entity
            .handle_service(&action.service, &action.data)
            .await
            .with_context(|| format!("{} failed on {}", action.service, action.entity))?;
    }

    let entities: Vec<_> = setup
        .entities
        .iter()
        .map(|entity| {
            json!({
                "snapshot": entity.snapshot(),
                "device": entity.device_info(),
                "homee_data": entity.extra_state_attributes(),
            })
        })
        .collect();
    let report = json!({
        "entry": entry.title,
        "device": setup.device,
        "entities": entities,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    integration.unload_entry(entry.id).await?;
    transport.await?;

    Ok(())
}
