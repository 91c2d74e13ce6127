use crate::core::competitor::{leader_idx, validate_standings, ChampionshipKind, CompetitorStanding};
use crate::core::metrics::derive_metrics;
use crate::core::schedule::{calc_remaining_schedule, RemainingSchedule, ScheduleEvent};
use crate::core::simulator::{CancelToken, ChampionshipSimulator, SimulationPars, TrialTally};
use crate::error::SimError;
use crate::interfaces::worker_interface::{SimulationEvent, SimulationProgress};
use crate::post::championship_result::{ChampionshipResult, SimulationResult};
use chrono::{DateTime, Utc};
use flume::{Receiver, Sender};
use rand::Rng;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// * `kind` - Drivers' or constructors' championship
/// * `season` - Season the snapshot belongs to (only used for labelling)
/// * `standings` - Standings snapshot, ordered by championship position
/// * `schedule` - Event list of the season, None if not available
/// * `now` - Point in time separating completed from remaining events
#[derive(Debug, Clone)]
pub struct ChampionshipInput {
    pub kind: ChampionshipKind,
    pub season: Option<i32>,
    pub standings: Vec<CompetitorStanding>,
    pub schedule: Option<Vec<ScheduleEvent>>,
    pub now: DateTime<Utc>,
}

/// handle_championship validates the inserted snapshot, simulates the remaining season with the
/// inserted random number generator and returns the results for post-processing.
pub fn handle_championship<R: Rng>(
    input: &ChampionshipInput,
    sim_pars: &SimulationPars,
    rng: &mut R,
) -> Result<ChampionshipResult, SimError> {
    let (pars, remaining) = prepare(input, sim_pars)?;
    let no_trials = pars.clamp_no_simulations(pars.no_simulations);
    let sim = ChampionshipSimulator::new(
        &pars,
        &input.standings,
        remaining.remaining_race_count,
        remaining.completed_race_count,
    )?;

    let t_start = Instant::now();
    let tally = sim.simulate(no_trials, rng);
    debug!("Simulation took {}ms", t_start.elapsed().as_millis());

    Ok(build_result(input, &pars, &remaining, no_trials, &tally))
}

/// handle_championship_parallel does the same as handle_championship but spreads the trials
/// over the rayon thread pool. The seed is taken from the parameters or drawn randomly. If a
/// sender is inserted, progress updates are sent after every finished chunk.
pub fn handle_championship_parallel(
    input: &ChampionshipInput,
    sim_pars: &SimulationPars,
    cancel: Option<&CancelToken>,
    tx: Option<&Sender<SimulationEvent>>,
) -> Result<ChampionshipResult, SimError> {
    let (pars, remaining) = prepare(input, sim_pars)?;
    let no_trials = pars.clamp_no_simulations(pars.no_simulations);
    let sim = ChampionshipSimulator::new(
        &pars,
        &input.standings,
        remaining.remaining_race_count,
        remaining.completed_race_count,
    )?;

    let seed = pars.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);

    let t_start = Instant::now();
    let tally = sim.simulate_parallel(no_trials, seed, cancel, |finished_trials| {
        if let Some(tx) = tx {
            let progress = SimulationProgress {
                finished_trials,
                no_trials: no_trials as u64,
            };
            if tx.send(SimulationEvent::Progress(progress)).is_err() {
                debug!("Progress receiver dropped");
            }
        }
    })?;
    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    Ok(build_result(input, &pars, &remaining, no_trials, &tally))
}

fn prepare(
    input: &ChampionshipInput,
    sim_pars: &SimulationPars,
) -> Result<(SimulationPars, RemainingSchedule), SimError> {
    validate_standings(&input.standings)?;
    let pars = sim_pars.for_kind(input.kind);
    pars.validate()?;

    if input.schedule.is_none() {
        warn!("No schedule available, treating the season as finished");
    }
    let remaining = calc_remaining_schedule(input.schedule.as_deref(), input.now, &pars.scoring);

    info!(
        "{} championship: {} competitors, {} races completed, {} remaining, {} pts available",
        input.kind,
        input.standings.len(),
        remaining.completed_race_count,
        remaining.remaining_race_count,
        remaining.max_remaining_points
    );

    Ok((pars, remaining))
}

fn build_result(
    input: &ChampionshipInput,
    pars: &SimulationPars,
    remaining: &RemainingSchedule,
    no_trials: u32,
    tally: &TrialTally,
) -> ChampionshipResult {
    let win_probabilities = tally.win_probabilities();
    let expected_points = tally.expected_points();
    let leader = leader_idx(&input.standings);
    let leader_points = leader.map_or(0.0, |idx| input.standings[idx].points);

    let mut results: Vec<SimulationResult> = input
        .standings
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let metrics = derive_metrics(
                c.points,
                leader_points,
                leader == Some(idx),
                remaining,
                &pars.scoring,
            );

            SimulationResult {
                id: c.id.to_owned(),
                name: c.name.to_owned(),
                position: c.position,
                current_points: c.points,
                win_probability: win_probabilities[idx],
                expected_points: expected_points[idx],
                points_behind_leader: metrics.points_behind_leader,
                max_possible_points: metrics.max_possible_points,
                points_needed: metrics.points_needed,
                can_win: metrics.can_win,
                average_finish_needed: metrics.average_finish_needed,
                races_to_clinch: metrics.races_to_clinch,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.win_probability
            .total_cmp(&a.win_probability)
            .then(a.position.cmp(&b.position))
    });

    ChampionshipResult {
        kind: input.kind,
        season: input.season,
        completed_race_count: remaining.completed_race_count,
        remaining_race_count: remaining.remaining_race_count,
        max_remaining_points: remaining.max_remaining_points,
        no_simulations: no_trials,
        results,
    }
}

// -------------------------------------------------------------------------------------------------
// BACKGROUND EXECUTION ----------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// ChampionshipWorker is the caller's handle of a simulation running on a separate thread.
/// Dropping the handle cancels the simulation.
pub struct ChampionshipWorker {
    handle: Option<JoinHandle<()>>,
    rx: Receiver<SimulationEvent>,
    cancel: CancelToken,
}

impl ChampionshipWorker {
    /// The method requests the worker to stop. The worker answers with SimulationEvent::Cancelled
    /// unless it already finished.
    pub fn cancel(&self) {
        self.cancel.cancel()
    }

    pub fn events(&self) -> &Receiver<SimulationEvent> {
        &self.rx
    }

    /// The method blocks until the worker terminates and returns its result. Progress updates
    /// that were not consumed via events() are skipped.
    pub fn wait(mut self) -> Result<ChampionshipResult, SimError> {
        let mut outcome = Err(SimError::WorkerDisconnected);

        for event in self.rx.iter() {
            match event {
                SimulationEvent::Progress(progress) => {
                    debug!("Simulation progress {:.0}%", 100.0 * progress.fraction())
                }
                SimulationEvent::Finished(result) => {
                    outcome = Ok(result);
                    break;
                }
                SimulationEvent::Cancelled => {
                    outcome = Err(SimError::Cancelled);
                    break;
                }
                SimulationEvent::Failed(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Simulation worker panicked");
            }
        }

        outcome
    }
}

impl Drop for ChampionshipWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

/// spawn_championship runs handle_championship_parallel on a separate thread so that the caller
/// stays responsive. All state of the simulation is local to the worker, i.e. dropping or
/// cancelling it has no side effects.
pub fn spawn_championship(input: ChampionshipInput, sim_pars: SimulationPars) -> ChampionshipWorker {
    let (tx, rx) = flume::unbounded();
    let cancel = CancelToken::new();
    let cancel_thread = cancel.clone();

    let handle = thread::spawn(move || {
        let res =
            handle_championship_parallel(&input, &sim_pars, Some(&cancel_thread), Some(&tx));
        let event = match res {
            Ok(result) => SimulationEvent::Finished(result),
            Err(SimError::Cancelled) => {
                info!("Simulation cancelled");
                SimulationEvent::Cancelled
            }
            Err(e) => SimulationEvent::Failed(e),
        };

        if tx.send(event).is_err() {
            debug!("Result receiver dropped");
        }
    });

    ChampionshipWorker {
        handle: Some(handle),
        rx,
        cancel,
    }
}
