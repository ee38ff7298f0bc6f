use crate::types::Route;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid route: {0}")]
    Invalid(#[from] RouteError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route has no waypoints")]
    Empty,

    #[error("waypoint {position} is not a valid coordinate")]
    InvalidCoordinate { position: usize },
}

/// Parse and validate a route document.
pub fn parse_route(json: &str) -> Result<Route, ParseError> {
    let route: Route = serde_json::from_str(json)?;
    validate_route(&route)?;
    Ok(route)
}

pub fn validate_route(route: &Route) -> Result<(), RouteError> {
    if route.route_coordinates.is_empty() {
        return Err(RouteError::Empty);
    }
    if let Some(position) = route.route_coordinates.iter().position(|w| !w.is_valid()) {
        return Err(RouteError::InvalidCoordinate { position });
    }
    Ok(())
}
