use std::future::Future;
use std::path::PathBuf;

use crate::parse::{parse_route, validate_route, ParseError, RouteError};
use crate::types::Route;

#[derive(Debug, thiserror::Error)]
pub enum SupplyError {
    #[error("failed to read route from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Source of the route a traversal follows.
///
/// Route computation itself happens elsewhere; a supplier only hands over the
/// latest result.
pub trait RouteSupplier {
    fn fetch_route(&self) -> impl Future<Output = Result<Route, SupplyError>> + Send;
}

/// Reads a route document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileRouteSupplier {
    path: PathBuf,
}

impl FileRouteSupplier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteSupplier for FileRouteSupplier {
    async fn fetch_route(&self) -> Result<Route, SupplyError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SupplyError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_route(&json)?)
    }
}

/// Hands out a route held in memory.
#[derive(Debug, Clone)]
pub struct StaticRouteSupplier {
    route: Route,
}

impl StaticRouteSupplier {
    pub fn new(route: Route) -> Self {
        Self { route }
    }
}

impl RouteSupplier for StaticRouteSupplier {
    async fn fetch_route(&self) -> Result<Route, SupplyError> {
        validate_route(&self.route)?;
        Ok(self.route.clone())
    }
}
