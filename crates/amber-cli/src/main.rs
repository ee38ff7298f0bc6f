mod config;
mod police;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use amber_authority::InMemoryAuthority;
use amber_route::{FileRouteSupplier, RouteSupplier, SupplyError};
use amber_sim::{ConfigError, ControllerState, SimulationController, SimulationEvent};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use crate::config::{AmberConfig, ConfigFileError};

/// Drive an ambulance along a precomputed route, requesting signal
/// preemption from a simulated police console.
#[derive(Parser, Debug)]
#[command(name = "amber", version, about)]
struct Cli {
    /// Route document (JSON) produced by the route service.
    #[arg(value_name = "ROUTE")]
    route: PathBuf,

    /// Optional JSON config with `simulation` and `police` sections.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the police operator's RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final traversal snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Route(#[from] SupplyError),

    #[error(transparent)]
    Simulation(#[from] ConfigError),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(ControllerState::Terminal) => ExitCode::SUCCESS,
        Ok(state) => {
            warn!(?state, "simulation ended before arrival");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "amber failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ControllerState, CliError> {
    let mut config = match &cli.config {
        Some(path) => AmberConfig::load(path)?,
        None => AmberConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.police.seed = seed;
    }

    let route = FileRouteSupplier::new(&cli.route).fetch_route().await?;
    let controller = SimulationController::from_route(&route, config.simulation.clone())?;
    info!(
        route = %route.id,
        waypoints = route.len(),
        hospital = %route.best_hospital.name,
        beds = route.best_hospital.availability,
        "route loaded"
    );

    let authority = Arc::new(InMemoryAuthority::with_signals(&controller.signals()));
    for signal in controller.signals() {
        info!(signal = %signal.index, position = %signal.position, "signal initialized");
    }
    let operator = police::spawn_operator(authority.clone(), config.police.clone());

    let mut sim = controller.start(authority);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = sim.next_event() => match event {
                Some(event) => report(&event),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                info!("interrupt received, stopping simulation");
                sim.stop();
            }
        }
    }
    operator.abort();

    let snapshot = sim.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(sim.wait().await)
}

fn report(event: &SimulationEvent) {
    match event {
        SimulationEvent::Moved { tick, position, .. } => {
            info!(tick, %position, "ambulance moved");
        }
        SimulationEvent::SignalReached { signal, .. } => {
            info!(%signal, "request sent to traffic police, waiting for approval");
        }
        SimulationEvent::PreemptionRequested { signal, ack } => {
            info!(%signal, request = %ack.request_id(), "preemption request acknowledged");
        }
        SimulationEvent::SignalCleared { signal, .. } => {
            info!(%signal, "signal green, resuming");
        }
        SimulationEvent::Arrived { facility, .. } => {
            info!(facility = facility.as_deref().unwrap_or("destination"), "ambulance has arrived");
        }
        SimulationEvent::Stopped { index } => {
            info!(index, "simulation stopped");
        }
    }
}
