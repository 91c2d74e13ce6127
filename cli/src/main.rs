use anyhow::Context;
use champsim::core::forecast::forecast_upcoming_races;
use champsim::core::handle_championship::{
    handle_championship_parallel, spawn_championship, ChampionshipInput,
};
use champsim::core::simulator::SimulationPars;
use champsim::interfaces::worker_interface::SimulationEvent;
use champsim::post::championship_result::ChampionshipResult;
use champsim::pre::read_sim_config::read_sim_pars;
use champsim::pre::read_snapshot::{parse_event_datetime, read_snapshot};
use champsim::pre::sim_opts::SimOpts;
use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// run_in_background executes the simulation on a worker thread and reports its progress in steps
/// of ten percent.
fn run_in_background(
    input: ChampionshipInput,
    sim_pars: SimulationPars,
) -> anyhow::Result<ChampionshipResult> {
    let worker = spawn_championship(input, sim_pars);
    let mut last_decile = 0;

    for event in worker.events().iter() {
        match event {
            SimulationEvent::Progress(progress) => {
                let decile = (10.0 * progress.fraction()).floor() as u32;
                if decile > last_decile {
                    last_decile = decile;
                    info!(
                        "Simulated {}/{} seasons",
                        progress.finished_trials, progress.no_trials
                    );
                }
            }
            SimulationEvent::Finished(result) => return Ok(result),
            SimulationEvent::Cancelled => anyhow::bail!("Simulation was cancelled!"),
            SimulationEvent::Failed(e) => return Err(e).context("Simulation failed!"),
        }
    }

    anyhow::bail!("Simulation worker terminated without result!")
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_logging(sim_opts.debug);

    // get simulation parameters
    let mut sim_pars = if let Some(config_path) = &sim_opts.config_path {
        info!("Reading simulation parameters from {}", config_path.display());
        read_sim_pars(config_path)?
    } else {
        SimulationPars::default()
    };

    if let Some(no_simulations) = sim_opts.no_simulations {
        sim_pars.no_simulations = no_simulations;
    }
    if sim_opts.seed.is_some() {
        sim_pars.seed = sim_opts.seed;
    }

    let now = match &sim_opts.now {
        Some(s) => parse_event_datetime(s).context("Invalid reference time!")?,
        None => Utc::now(),
    };

    // get season snapshot
    info!("Reading season snapshot from {}", sim_opts.snapshot_path.display());
    let snapshot = read_snapshot(&sim_opts.snapshot_path)?;
    let input = snapshot.to_input(sim_opts.championship, now)?;

    if input.standings.is_empty() {
        warn!("Snapshot contains no {} standings", sim_opts.championship);
    }

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();

    let result = if sim_opts.background {
        run_in_background(input.clone(), sim_pars.clone())?
    } else {
        handle_championship_parallel(&input, &sim_pars, None, None)?
    };

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    result.print_table()?;

    if let Some(csv_path) = &sim_opts.csv_path {
        result.write_csv(csv_path)?;
        info!("Results written to {}", csv_path.display());
    }

    if sim_opts.forecast {
        match &input.schedule {
            Some(schedule) => {
                let mut rng = match sim_pars.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let pars = sim_pars.for_kind(input.kind);
                let forecasts = forecast_upcoming_races(
                    &input.standings,
                    schedule,
                    now,
                    &pars,
                    sim_opts.horizon,
                    pars.no_simulations,
                    &mut rng,
                )?;

                if forecasts.is_empty() {
                    info!("No remaining event to forecast");
                }
                for forecast in forecasts.iter() {
                    println!("{}", forecast.format_table()?);
                }
            }
            None => warn!("No schedule available, skipping the race forecast"),
        }
    }

    Ok(())
}
