pub mod config;
pub mod controller;
pub mod event;
pub mod traversal;

pub use config::{ConfigError, SimulationConfig};
pub use controller::{Simulation, SimulationController};
pub use event::SimulationEvent;
pub use traversal::{Clearance, ControllerState, TickOutcome, Traversal, TraversalSnapshot};
