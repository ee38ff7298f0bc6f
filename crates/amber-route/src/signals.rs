//! Traffic signals placed along a route.
//!
//! Signals are derived from the waypoint sequence once per route and keep
//! their identity for the lifetime of that route. Only an external authority
//! may turn a signal green.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Waypoint;

/// Ordinal of a signal among the signals derived for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub u32);

impl fmt::Display for SignalId {
    /// Human-facing numbering starts at 1 ("Traffic Signal 1").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Traffic Signal {}", self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    #[default]
    Red,
    Green,
}

impl SignalStatus {
    pub fn is_green(self) -> bool {
        matches!(self, SignalStatus::Green)
    }
}

/// A waypoint that requires preemption approval before it may be passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub index: SignalId,
    #[serde(flatten)]
    pub position: Waypoint,
    #[serde(default)]
    pub status: SignalStatus,
}

impl Signal {
    pub fn new(index: SignalId, position: Waypoint) -> Self {
        Self {
            index,
            position,
            status: SignalStatus::Red,
        }
    }
}

/// Place the route's signals: one a third of the way along, one two thirds
/// of the way along. Routes of two waypoints or fewer get none.
pub fn derive_signals(waypoints: &[Waypoint]) -> Vec<Signal> {
    let n = waypoints.len();
    if n <= 2 {
        return Vec::new();
    }

    [n / 3, (2 * n) / 3]
        .iter()
        .enumerate()
        .map(|(ordinal, &offset)| Signal::new(SignalId(ordinal as u32), waypoints[offset]))
        .collect()
}

/// Waypoint offsets the derived signals sit at, in signal order.
pub fn signal_offsets(len: usize) -> Vec<usize> {
    if len <= 2 {
        Vec::new()
    } else {
        vec![len / 3, (2 * len) / 3]
    }
}
