#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use amber_authority::{AuthorityError, RequestAck, RequestId, SignalAuthority};
use amber_route::{SignalId, SignalStatus, Waypoint};
use amber_sim::{Simulation, SimulationEvent};

/// Straight line of `n` waypoints, 0.0003° apart.
pub fn line(n: usize) -> Vec<Waypoint> {
    (0..n)
        .map(|i| Waypoint::new(12.893943, 77.674585 + i as f64 * 0.0003))
        .collect()
}

/// Authority whose answers follow a fixed script.
///
/// Poll `n` (1-based, per signal) fails while `n <= failing_polls`, then
/// reports green once `green_after` successful polls have been answered.
#[derive(Debug, Default)]
pub struct ScriptedAuthority {
    pub green_after: Option<u32>,
    pub failing_polls: u32,
    pub fail_requests: bool,
    pub(crate) log: Mutex<Log>,
}

#[derive(Debug, Default)]
pub(crate) struct Log {
    requests: Vec<SignalId>,
    polls: HashMap<SignalId, u32>,
}

impl ScriptedAuthority {
    pub fn approving_after(polls: u32) -> Self {
        Self {
            green_after: Some(polls),
            ..Default::default()
        }
    }

    pub fn never_approving() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SignalId> {
        self.log.lock().unwrap().requests.clone()
    }

    pub fn polls(&self, signal: SignalId) -> u32 {
        self.log.lock().unwrap().polls.get(&signal).copied().unwrap_or(0)
    }
}

impl SignalAuthority for ScriptedAuthority {
    async fn request_preemption(&self, signal: SignalId) -> Result<RequestAck, AuthorityError> {
        let mut log = self.log.lock().unwrap();
        log.requests.push(signal);
        if self.fail_requests {
            return Err(AuthorityError::Unreachable("connection refused".into()));
        }
        Ok(RequestAck::Created(RequestId(format!(
            "request-{:04}",
            log.requests.len()
        ))))
    }

    async fn signal_status(&self, signal: SignalId) -> Result<SignalStatus, AuthorityError> {
        let mut log = self.log.lock().unwrap();
        let n = log.polls.entry(signal).or_insert(0);
        *n += 1;
        if *n <= self.failing_polls {
            return Err(AuthorityError::Unreachable("timed out".into()));
        }
        match self.green_after {
            Some(k) if *n - self.failing_polls >= k => Ok(SignalStatus::Green),
            _ => Ok(SignalStatus::Red),
        }
    }
}

/// Drain events until the driver finishes.
pub async fn collect_events(sim: &mut Simulation) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    while let Some(event) = sim.next_event().await {
        events.push(event);
    }
    events
}

/// Positions reported per tick, in tick order.
pub fn reported_positions(events: &[SimulationEvent]) -> Vec<(u64, Waypoint)> {
    events
        .iter()
        .filter_map(|e| match e {
            SimulationEvent::Moved { tick, position, .. }
            | SimulationEvent::SignalReached { tick, position, .. }
            | SimulationEvent::Arrived { tick, position, .. } => Some((*tick, *position)),
            _ => None,
        })
        .collect()
}
