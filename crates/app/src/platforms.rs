//! Entity platforms — one module per host entity kind.
//!
//! Each platform exposes a pure classifier (`is_*_node` plus capability
//! helpers), an entity type implementing [`HomeeEntity`](crate::entity::HomeeEntity)
//! and a `discover` function that turns the nodes of a
//! [`DiscoveryContext`](crate::discovery::DiscoveryContext) into entities.

pub mod binary_sensor;
pub mod climate;
pub mod cover;
pub mod light;
pub mod sensor;
pub mod switch;

use homee_bridge_domain::entity::Platform;

use crate::discovery::DiscoveryContext;
use crate::entity::HomeeEntity;

/// Run one platform's discovery and box its entities.
#[must_use]
pub fn discover(platform: Platform, ctx: &DiscoveryContext) -> Vec<Box<dyn HomeeEntity>> {
    fn boxed<E: HomeeEntity + 'static>(entities: Vec<E>) -> Vec<Box<dyn HomeeEntity>> {
        entities
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn HomeeEntity>)
            .collect()
    }

    match platform {
        Platform::Light => boxed(light::discover(ctx)),
        Platform::Cover => boxed(cover::discover(ctx)),
        Platform::Switch => boxed(switch::discover(ctx)),
        Platform::Sensor => boxed(sensor::discover(ctx)),
        Platform::BinarySensor => boxed(binary_sensor::discover(ctx)),
        Platform::Climate => boxed(climate::discover(ctx)),
    }
}

/// Discover the entities of every platform, in [`Platform::ALL`] order.
#[must_use]
pub fn discover_all(ctx: &DiscoveryContext) -> Vec<Box<dyn HomeeEntity>> {
    Platform::ALL
        .iter()
        .flat_map(|platform| discover(*platform, ctx))
        .collect()
}
