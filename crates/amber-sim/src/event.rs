use amber_authority::RequestAck;
use amber_route::{SignalId, Waypoint};
use serde::Serialize;

/// Progress reported by a running simulation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// The vehicle is at waypoint `index`.
    Moved {
        tick: u64,
        index: usize,
        position: Waypoint,
    },
    /// The vehicle reached a signal and paused.
    SignalReached {
        tick: u64,
        index: usize,
        position: Waypoint,
        signal: SignalId,
    },
    /// The authority acknowledged the preemption request.
    PreemptionRequested { signal: SignalId, ack: RequestAck },
    /// The signal was observed green; movement resumes at `resume_index`.
    SignalCleared { signal: SignalId, resume_index: usize },
    /// The vehicle reached the last waypoint.
    Arrived {
        tick: u64,
        index: usize,
        position: Waypoint,
        facility: Option<String>,
    },
    /// The run was cancelled before arrival.
    Stopped { index: usize },
}
