pub mod parse;
pub mod signals;
pub mod supplier;
pub mod types;

pub use parse::{parse_route, validate_route, ParseError, RouteError};
pub use signals::{derive_signals, signal_offsets, Signal, SignalId, SignalStatus};
pub use supplier::{FileRouteSupplier, RouteSupplier, StaticRouteSupplier, SupplyError};
pub use types::{Facility, Route, Waypoint};
