//! Per-run traversal state.
//!
//! A [`Traversal`] owns everything that changes while a vehicle moves along
//! a route: the waypoint pointer, the pause flag, the set of signals already
//! handled and the run's counters. It performs no I/O and keeps no clock;
//! the driver in `controller` decides when to call [`Traversal::tick`] and
//! when an approval has been observed.
//!
//! Invariants:
//! - `current_index` never decreases and only moves while not paused, except
//!   for the single advance that accompanies clearing a signal.
//! - At most one signal awaits approval at a time.
//! - A processed signal is never matched again within the same run.
//! - `Terminal` and `Stopped` are absorbing.

use std::collections::BTreeSet;
use std::sync::Arc;

use amber_route::{Signal, SignalId, Waypoint};
use serde::Serialize;

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "signal", rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Running,
    AwaitingApproval(SignalId),
    Terminal,
    Stopped,
}

impl ControllerState {
    pub fn is_final(self) -> bool {
        matches!(self, ControllerState::Terminal | ControllerState::Stopped)
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not started, terminal or stopped.
    Inactive,
    /// Paused on a signal; nothing moved.
    Skipped,
    /// Reported `position` and advanced past it.
    Moved {
        tick: u64,
        index: usize,
        position: Waypoint,
    },
    /// Reported `position`, which is a signal; now paused on it.
    SignalReached {
        tick: u64,
        index: usize,
        position: Waypoint,
        signal: SignalId,
    },
    /// Reported the last waypoint; the run is terminal.
    Arrived {
        tick: u64,
        index: usize,
        position: Waypoint,
    },
}

/// Result of clearing the signal a run was paused on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clearance {
    /// Movement resumes at `resume_index` on the next tick.
    Resumed { resume_index: usize },
    /// The signal sat on the last waypoint; the run is terminal.
    Arrived { index: usize, position: Waypoint },
}

/// Point-in-time copy of a run, for rendering and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalSnapshot {
    pub state: ControllerState,
    pub current_index: usize,
    pub position: Option<Waypoint>,
    pub processed: Vec<SignalId>,
    /// Ticks that reported a position.
    pub ticks: u64,
    /// Ticks skipped because the run was paused.
    pub skipped_ticks: u64,
    pub polls: u64,
}

#[derive(Debug, Clone)]
pub struct Traversal {
    waypoints: Arc<[Waypoint]>,
    signals: Vec<(SignalId, Waypoint)>,
    tolerance: f64,
    processed: BTreeSet<SignalId>,
    current_index: usize,
    position: Option<Waypoint>,
    awaiting: Option<SignalId>,
    started: bool,
    paused: bool,
    terminal: bool,
    stopped: bool,
    ticks: u64,
    skipped_ticks: u64,
    polls: u64,
}

impl Traversal {
    /// `waypoints` must be non-empty; the controller checks this before
    /// building a traversal.
    pub fn new(waypoints: Arc<[Waypoint]>, signals: &[Signal], tolerance: f64) -> Self {
        Self {
            waypoints,
            signals: signals.iter().map(|s| (s.index, s.position)).collect(),
            tolerance,
            processed: BTreeSet::new(),
            current_index: 0,
            position: None,
            awaiting: None,
            started: false,
            paused: false,
            terminal: false,
            stopped: false,
            ticks: 0,
            skipped_ticks: 0,
            polls: 0,
        }
    }

    /// Idle → Running. No effect in any other state.
    pub fn begin(&mut self) {
        if !self.started && !self.stopped {
            self.started = true;
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.stopped {
            ControllerState::Stopped
        } else if self.terminal {
            ControllerState::Terminal
        } else if !self.started {
            ControllerState::Idle
        } else if let (true, Some(signal)) = (self.paused, self.awaiting) {
            ControllerState::AwaitingApproval(signal)
        } else {
            ControllerState::Running
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn position(&self) -> Option<Waypoint> {
        self.position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn awaiting(&self) -> Option<SignalId> {
        self.awaiting
    }

    pub fn is_processed(&self, signal: SignalId) -> bool {
        self.processed.contains(&signal)
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.started || self.terminal || self.stopped {
            return TickOutcome::Inactive;
        }
        if self.paused {
            self.skipped_ticks += 1;
            return TickOutcome::Skipped;
        }

        self.ticks += 1;
        let tick = self.ticks;
        let index = self.current_index;
        let position = self.waypoints[index];
        self.position = Some(position);

        let hit = self
            .signals
            .iter()
            .find(|(id, at)| {
                !self.processed.contains(id) && at.coincides_with(&position, self.tolerance)
            })
            .map(|(id, _)| *id);

        if let Some(signal) = hit {
            self.processed.insert(signal);
            self.paused = true;
            self.awaiting = Some(signal);
            return TickOutcome::SignalReached {
                tick,
                index,
                position,
                signal,
            };
        }

        self.current_index += 1;
        if self.current_index == self.waypoints.len() {
            self.terminal = true;
            return TickOutcome::Arrived {
                tick,
                index,
                position,
            };
        }
        TickOutcome::Moved {
            tick,
            index,
            position,
        }
    }

    /// Record that `signal` was observed green. Ignored unless the run is
    /// paused on exactly that signal and has not been stopped.
    pub fn clear_signal(&mut self, signal: SignalId) -> Option<Clearance> {
        if self.stopped || !self.paused || self.awaiting != Some(signal) {
            return None;
        }

        self.paused = false;
        self.awaiting = None;
        let index = self.current_index;
        self.current_index += 1;

        if self.current_index == self.waypoints.len() {
            self.terminal = true;
            return Some(Clearance::Arrived {
                index,
                position: self.waypoints[index],
            });
        }
        Some(Clearance::Resumed {
            resume_index: self.current_index,
        })
    }

    pub fn record_poll(&mut self) {
        if !self.stopped {
            self.polls += 1;
        }
    }

    /// Stop the run. Returns true if this call changed the state; terminal
    /// and already stopped runs are left untouched.
    pub fn stop(&mut self) -> bool {
        if self.stopped || self.terminal {
            return false;
        }
        self.stopped = true;
        true
    }

    pub fn snapshot(&self) -> TraversalSnapshot {
        TraversalSnapshot {
            state: self.state(),
            current_index: self.current_index,
            position: self.position,
            processed: self.processed.iter().copied().collect(),
            ticks: self.ticks,
            skipped_ticks: self.skipped_ticks,
            polls: self.polls,
        }
    }
}
