//! The simulation controller and its driver task.
//!
//! One driver task runs per traversal. Movement ticks and status polls are
//! multiplexed in a single `select!` loop, so they never run concurrently and
//! polling only happens while the traversal is paused.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use amber_authority::SignalAuthority;
use amber_route::{derive_signals, Facility, Route, Signal, SignalId, SignalStatus, Waypoint};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::event::SimulationEvent;
use crate::traversal::{Clearance, ControllerState, TickOutcome, Traversal, TraversalSnapshot};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns a route's waypoints and signals and starts traversals over them.
///
/// Signal statuses live as long as the controller; each traversal gets its
/// own processed set.
#[derive(Debug, Clone)]
pub struct SimulationController {
    waypoints: Arc<[Waypoint]>,
    signals: Arc<Mutex<Vec<Signal>>>,
    facility: Option<Facility>,
    config: SimulationConfig,
}

impl SimulationController {
    pub fn new(
        waypoints: Vec<Waypoint>,
        signals: Vec<Signal>,
        config: SimulationConfig,
    ) -> Result<Self, ConfigError> {
        if waypoints.is_empty() {
            return Err(ConfigError::EmptyRoute);
        }
        if let Some(position) = waypoints.iter().position(|w| !w.is_valid()) {
            return Err(ConfigError::InvalidWaypoint { position });
        }
        config.validate()?;

        Ok(Self {
            waypoints: waypoints.into(),
            signals: Arc::new(Mutex::new(signals)),
            facility: None,
            config,
        })
    }

    /// Build a controller for a supplied route, deriving its signals.
    pub fn from_route(route: &Route, config: SimulationConfig) -> Result<Self, ConfigError> {
        let signals = derive_signals(route.waypoints());
        let mut controller = Self::new(route.route_coordinates.clone(), signals, config)?;
        controller.facility = Some(route.best_hospital.clone());
        Ok(controller)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Current local view of the route's signals.
    pub fn signals(&self) -> Vec<Signal> {
        lock(&self.signals).clone()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// A fresh, idle traversal over this route.
    pub fn traversal(&self) -> Traversal {
        let signals = lock(&self.signals);
        Traversal::new(
            self.waypoints.clone(),
            &signals,
            self.config.coincidence_tolerance_deg,
        )
    }

    /// Start a new traversal on the current tokio runtime.
    ///
    /// The first tick fires one `tick_period` after this call.
    pub fn start<A>(&self, authority: Arc<A>) -> Simulation
    where
        A: SignalAuthority + 'static,
    {
        let mut traversal = self.traversal();
        traversal.begin();
        let shared = Arc::new(Mutex::new(traversal));

        let (stop_tx, stop_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            traversal: shared.clone(),
            board: self.signals.clone(),
            authority,
            events: events_tx,
            stop: stop_rx,
            facility: self.facility.as_ref().map(|f| f.name.clone()),
            config: self.config.clone(),
        };
        let task = tokio::spawn(driver.run());

        Simulation {
            traversal: shared,
            stop_tx,
            events: events_rx,
            task,
        }
    }
}

/// Handle to a running traversal.
///
/// Dropping the handle cancels the traversal.
#[derive(Debug)]
pub struct Simulation {
    traversal: Arc<Mutex<Traversal>>,
    stop_tx: watch::Sender<bool>,
    events: mpsc::UnboundedReceiver<SimulationEvent>,
    task: JoinHandle<()>,
}

impl Simulation {
    /// Cancel ticking and polling. Once this returns the traversal state no
    /// longer changes. Safe to call repeatedly and after arrival.
    pub fn stop(&self) {
        let changed = lock(&self.traversal).stop();
        if changed {
            info!("simulation stopped");
        }
        self.stop_tx.send_replace(true);
    }

    pub fn state(&self) -> ControllerState {
        lock(&self.traversal).state()
    }

    pub fn snapshot(&self) -> TraversalSnapshot {
        lock(&self.traversal).snapshot()
    }

    /// Next event, or `None` once the driver has finished and every event
    /// has been drained.
    pub async fn next_event(&mut self) -> Option<SimulationEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SimulationEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the driver to finish and return the final state.
    ///
    /// Never returns while the traversal awaits a signal that is never
    /// approved, unless [`Simulation::stop`] is called.
    pub async fn wait(self) -> ControllerState {
        let Simulation {
            traversal,
            stop_tx,
            events: _events,
            task,
        } = self;
        if let Err(e) = task.await {
            warn!(error = %e, "simulation driver task failed");
        }
        drop(stop_tx);
        let state = lock(&traversal).state();
        state
    }
}

struct Driver<A> {
    traversal: Arc<Mutex<Traversal>>,
    board: Arc<Mutex<Vec<Signal>>>,
    authority: Arc<A>,
    events: mpsc::UnboundedSender<SimulationEvent>,
    stop: watch::Receiver<bool>,
    facility: Option<String>,
    config: SimulationConfig,
}

impl<A: SignalAuthority> Driver<A> {
    async fn run(mut self) {
        let period = self.config.tick_period();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let poll = time::sleep(self.config.poll_interval());
        tokio::pin!(poll);
        let mut awaiting: Option<SignalId> = None;

        loop {
            tokio::select! {
                biased;
                _ = self.stop.changed() => break,
                _ = ticker.tick() => {
                    let outcome = lock(&self.traversal).tick();
                    match outcome {
                        TickOutcome::Inactive => break,
                        TickOutcome::Skipped => {}
                        TickOutcome::Moved { tick, index, position } => {
                            debug!(tick, index, %position, "moved");
                            self.emit(SimulationEvent::Moved { tick, index, position });
                        }
                        TickOutcome::Arrived { tick, index, position } => {
                            self.arrive(tick, index, position);
                            return;
                        }
                        TickOutcome::SignalReached { tick, index, position, signal } => {
                            info!(%signal, index, "signal reached, awaiting approval");
                            self.emit(SimulationEvent::SignalReached { tick, index, position, signal });
                            if !self.request_preemption(signal).await {
                                break;
                            }
                            awaiting = Some(signal);
                            poll.as_mut().reset(Instant::now());
                        }
                    }
                }
                _ = &mut poll, if awaiting.is_some() => {
                    let Some(signal) = awaiting else { continue };
                    lock(&self.traversal).record_poll();

                    let authority = self.authority.clone();
                    let Some(status) = self.until_stopped(authority.signal_status(signal)).await else {
                        break;
                    };
                    match status {
                        Ok(SignalStatus::Green) => {
                            awaiting = None;
                            let clearance = lock(&self.traversal).clear_signal(signal);
                            match clearance {
                                Some(Clearance::Resumed { resume_index }) => {
                                    self.mark_green(signal);
                                    info!(%signal, resume_index, "signal cleared");
                                    self.emit(SimulationEvent::SignalCleared { signal, resume_index });
                                }
                                Some(Clearance::Arrived { index, position }) => {
                                    self.mark_green(signal);
                                    info!(%signal, "signal cleared");
                                    self.emit(SimulationEvent::SignalCleared {
                                        signal,
                                        resume_index: index + 1,
                                    });
                                    let tick = lock(&self.traversal).snapshot().ticks;
                                    self.arrive(tick, index, position);
                                    return;
                                }
                                // Stopped between the poll and now.
                                None => break,
                            }
                        }
                        Ok(SignalStatus::Red) => debug!(%signal, "signal still red"),
                        Err(e) => warn!(%signal, error = %e, "signal status poll failed"),
                    }
                    poll.as_mut().reset(Instant::now() + self.config.poll_interval());
                }
            }
        }

        let snapshot = lock(&self.traversal).snapshot();
        if snapshot.state == ControllerState::Stopped {
            self.emit(SimulationEvent::Stopped {
                index: snapshot.current_index,
            });
        }
    }

    /// Fire the preemption request. Delivery failures are logged and leave
    /// the traversal paused; returns false only if stopped meanwhile.
    async fn request_preemption(&mut self, signal: SignalId) -> bool {
        let authority = self.authority.clone();
        match self.until_stopped(authority.request_preemption(signal)).await {
            None => false,
            Some(Ok(ack)) => {
                info!(%signal, request = %ack.request_id(), "preemption requested");
                self.emit(SimulationEvent::PreemptionRequested { signal, ack });
                true
            }
            Some(Err(e)) => {
                warn!(%signal, error = %e, "preemption request not delivered");
                true
            }
        }
    }

    /// Run `fut` unless the simulation is stopped first.
    async fn until_stopped<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.stop.changed() => None,
            out = fut => Some(out),
        }
    }

    fn mark_green(&self, signal: SignalId) {
        let mut board = lock(&self.board);
        if let Some(s) = board.iter_mut().find(|s| s.index == signal) {
            s.status = SignalStatus::Green;
        }
    }

    fn arrive(&self, tick: u64, index: usize, position: Waypoint) {
        info!(tick, %position, facility = ?self.facility, "ambulance has arrived");
        self.emit(SimulationEvent::Arrived {
            tick,
            index,
            position,
            facility: self.facility.clone(),
        });
    }

    fn emit(&self, event: SimulationEvent) {
        // A dropped receiver means nobody is watching; the run still proceeds.
        let _ = self.events.send(event);
    }
}
