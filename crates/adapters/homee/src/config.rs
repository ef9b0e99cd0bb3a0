//! homee connection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings of a hub connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HomeeConfig {
    /// How long setup waits for the first full snapshot, in seconds.
    pub connect_timeout_secs: u16,
    /// Capacity of the outbound command queue.
    pub command_queue: usize,
}

impl Default for HomeeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            command_queue: 64,
        }
    }
}

impl HomeeConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}
