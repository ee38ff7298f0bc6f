/// Simulation timing and matching configuration.
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("route has no waypoints")]
    EmptyRoute,

    #[error("waypoint {position} is not a valid coordinate")]
    InvalidWaypoint { position: usize },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}

/// Controls how fast a traversal moves and how it talks to the signal
/// authority.
///
/// There is no approval timeout: a traversal waits on a red signal
/// indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock time between movement ticks.
    pub tick_period_ms: u64,
    /// Wall-clock time between signal status polls while paused.
    pub poll_interval_ms: u64,
    /// Per-axis tolerance, in degrees, for matching a position to a signal.
    pub coincidence_tolerance_deg: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 500,
            poll_interval_ms: 1000,
            coincidence_tolerance_deg: 1e-4,
        }
    }
}

impl SimulationConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "tick_period_ms must be positive".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "poll_interval_ms must be positive".into(),
            ));
        }
        let tol = self.coincidence_tolerance_deg;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(ConfigError::InvalidConfig(format!(
                "coincidence_tolerance_deg must be a positive number, got {tol}"
            )));
        }
        Ok(())
    }
}
