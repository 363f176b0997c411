//! Headless reef runner.
//!
//! Loads a scenario, drives the event scheduler either as fast as possible or
//! against the wall clock, and periodically reports population gauges.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use reef_world::{ScenarioFile, Simulation};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Run a reef scenario on the discrete-event scheduler
#[derive(Parser, Debug)]
#[command(name = "reef-runner")]
#[command(about = "Run a reef scenario and report population over time")]
struct Args {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Logical milliseconds to simulate, overriding the scenario
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Random seed, overriding the scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Advance logical time with the wall clock
    #[arg(long)]
    realtime: bool,

    /// Write the final world snapshot to this file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// OpenTelemetry collector endpoint; sampling is off without one
    #[arg(long)]
    otel_endpoint: Option<String>,
}

type SharedSimulation = Arc<Mutex<Simulation>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.otel_endpoint.as_deref())?;

    let result = run(&args).await;
    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
    }

    telemetry::shutdown_telemetry();
    result
}

async fn run(args: &Args) -> Result<()> {
    let mut file = ScenarioFile::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    if let Some(duration_ms) = args.duration_ms {
        file.config.duration_ms = duration_ms;
    }
    if let Some(seed) = args.seed {
        file.config.seed = seed;
    }

    let mut simulation = Simulation::from_scenario(&file)?;
    simulation.start();
    simulation.emit_population_metrics();

    let report_interval = Duration::from_millis(file.config.report_interval_ms.max(1));
    let simulation: SharedSimulation = Arc::new(Mutex::new(simulation));

    info!(
        scenario = %args.scenario.display(),
        realtime = args.realtime,
        duration_ms = file.config.duration_ms,
        seed = file.config.seed,
        "Starting reef run"
    );

    let reporter = tokio::spawn(run_reporter(simulation.clone(), report_interval));

    let outcome = tokio::select! {
        result = drive(simulation.clone(), args.realtime) => result,
        _ = shutdown_signal() => {
            info!("Run interrupted");
            Ok(())
        }
    };
    reporter.abort();
    outcome?;

    let sim = simulation.lock();
    let fired = sim.events_fired();
    sim.emit_population_metrics();
    record_counter!("events_fired", fired);
    record_gauge!("simulated_time_ms", sim.now());
    info!(
        time = sim.now(),
        fired,
        entities = sim.world().entity_count(),
        "Run finished"
    );

    if let Some(path) = &args.snapshot {
        let json = serde_json::to_string_pretty(&sim.snapshot())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        info!(path = %path.display(), "Snapshot written");
    }

    Ok(())
}

async fn drive(simulation: SharedSimulation, realtime: bool) -> Result<()> {
    if realtime {
        run_realtime(simulation).await
    } else {
        run_fast(simulation).await
    }
}

/// Step through logical time without waiting.
async fn run_fast(simulation: SharedSimulation) -> Result<()> {
    loop {
        {
            let mut sim = simulation.lock();
            let duration = sim.config().duration_ms;
            if sim.now() >= duration {
                break;
            }
            let target = sim
                .now()
                .saturating_add(sim.config().tick_period_ms)
                .min(duration);
            sim.advance_to(target)?;
        }
        // Let the reporter and the shutdown signal in between steps.
        tokio::task::yield_now().await;
    }
    Ok(())
}

/// Logical time follows elapsed wall-clock milliseconds.
async fn run_realtime(simulation: SharedSimulation) -> Result<()> {
    let (tick_period, duration) = {
        let sim = simulation.lock();
        (sim.config().tick_period_ms, sim.config().duration_ms)
    };

    let start = Instant::now();
    let mut ticker = interval(Duration::from_millis(tick_period));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let target = elapsed.min(duration);
        simulation.lock().advance_to(target)?;
        if target >= duration {
            break;
        }
    }
    Ok(())
}

async fn run_reporter(simulation: SharedSimulation, period: Duration) {
    let mut ticker = interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        simulation.lock().emit_population_metrics();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
