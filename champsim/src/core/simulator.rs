use crate::core::competitor::{leader_idx, validate_standings, ChampionshipKind, CompetitorStanding};
use crate::core::scoring::ScoringModel;
use crate::error::SimError;
use helpers::general::{argmax, argsort, argsort_into, round_to, InputValueError, SortOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// * `no_simulations` - Number of simulated season completions (trials)
/// * `max_simulations` - Upper bound for the number of trials, larger requests are clamped
/// * `max_field_size` - Number of competitors (those with the most points) taking part in the
/// simulation
/// * `points_offset` - Offset added to the points before the proximity weighting, keeps
/// competitors without points in the race
/// * `proximity_exponent` - Power-law exponent applied to the share of the points pool
/// * `form_exponent` - Exponent amplifying the form factor (win rate and points rate)
/// * `win_rate_weight` - Weight of the win rate within the form factor
/// * `variance_band` - Lower and upper bound of the uniform race-to-race performance multiplier
/// * `chunk_size` - Trials per parallel work package
/// * `seed` - Seed for reproducible runs, None draws a seed from the OS
/// * `scoring` - Points tables and bonus event probabilities
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationPars {
    pub no_simulations: u32,
    pub max_simulations: u32,
    pub max_field_size: usize,
    pub points_offset: f64,
    pub proximity_exponent: f64,
    pub form_exponent: f64,
    pub win_rate_weight: f64,
    pub variance_band: [f64; 2],
    pub chunk_size: u32,
    pub seed: Option<u64>,
    pub scoring: ScoringModel,
}

impl Default for SimulationPars {
    fn default() -> Self {
        SimulationPars {
            no_simulations: 50_000,
            max_simulations: 200_000,
            max_field_size: 20,
            points_offset: 1.0,
            proximity_exponent: 0.8,
            form_exponent: 1.5,
            win_rate_weight: 1.0,
            variance_band: [0.6, 1.4],
            chunk_size: 1_000,
            seed: None,
            scoring: ScoringModel::default(),
        }
    }
}

impl SimulationPars {
    /// The method returns a copy of the parameters with the number of scoring cars adjusted to
    /// the given championship.
    pub fn for_kind(&self, kind: ChampionshipKind) -> SimulationPars {
        let mut pars = self.clone();
        pars.scoring.entries_per_competitor = kind.entries_per_competitor();
        pars
    }

    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.no_simulations == 0 {
            return Err(InputValueError::new("no_simulations must be at least 1"));
        }
        if self.max_simulations == 0 {
            return Err(InputValueError::new("max_simulations must be at least 1"));
        }
        if self.max_field_size == 0 {
            return Err(InputValueError::new("max_field_size must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(InputValueError::new("chunk_size must be at least 1"));
        }
        if !self.points_offset.is_finite() || self.points_offset <= 0.0 {
            return Err(InputValueError::new("points_offset must be positive"));
        }
        for (name, val) in [
            ("proximity_exponent", self.proximity_exponent),
            ("form_exponent", self.form_exponent),
            ("win_rate_weight", self.win_rate_weight),
        ]
        .iter()
        {
            if !val.is_finite() || *val < 0.0 {
                return Err(InputValueError::new(format!(
                    "{} must be finite and non-negative, got {}",
                    name, val
                )));
            }
        }

        let [low, high] = self.variance_band;
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || low >= high {
            return Err(InputValueError::new(format!(
                "variance_band must fulfill 0 < low < high, got [{}, {}]",
                low, high
            )));
        }

        self.scoring.validate()
    }

    /// The method limits the requested number of trials to max_simulations.
    pub fn clamp_no_simulations(&self, requested: u32) -> u32 {
        if requested > self.max_simulations {
            warn!(
                "Requested {} simulations, clamping to the maximum of {}",
                requested, self.max_simulations
            );
            self.max_simulations
        } else {
            requested
        }
    }
}

/// CancelToken is shared between the caller and a running simulation. Cancelling stops the
/// simulation before the next chunk of trials is started.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// TrialTally accumulates the outcome of a number of trials. Tallies of independent trial chunks
/// are merged by simple addition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialTally {
    pub trials: u64,
    pub win_counts: Vec<u64>,
    pub points_sums: Vec<f64>,
}

impl TrialTally {
    pub fn new(no_competitors: usize) -> TrialTally {
        TrialTally {
            trials: 0,
            win_counts: vec![0; no_competitors],
            points_sums: vec![0.0; no_competitors],
        }
    }

    /// Records one trial. totals holds the final points of the field members, field maps them to
    /// their standings index.
    fn record(&mut self, winner: usize, totals: &[f64], field: &[usize]) {
        self.trials += 1;
        self.win_counts[winner] += 1;
        for (&idx, total) in field.iter().zip(totals) {
            self.points_sums[idx] += total;
        }
    }

    pub fn merge(&mut self, other: &TrialTally) {
        self.trials += other.trials;
        for (a, b) in self.win_counts.iter_mut().zip(&other.win_counts) {
            *a += b;
        }
        for (a, b) in self.points_sums.iter_mut().zip(&other.points_sums) {
            *a += b;
        }
    }

    /// The method returns the championship win probability in percent (one decimal) for every
    /// competitor.
    pub fn win_probabilities(&self) -> Vec<f64> {
        if self.trials == 0 {
            return vec![0.0; self.win_counts.len()];
        }

        self.win_counts
            .iter()
            .map(|&w| round_to(100.0 * w as f64 / self.trials as f64, 1))
            .collect()
    }

    /// The method returns the mean simulated final points total for every competitor.
    pub fn expected_points(&self) -> Vec<f64> {
        if self.trials == 0 {
            return vec![0.0; self.points_sums.len()];
        }

        self.points_sums
            .iter()
            .map(|&s| s / self.trials as f64)
            .collect()
    }
}

/// RaceOdds contains single race probabilities in percent (one decimal).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
pub struct RaceOdds {
    pub win: f64,
    pub podium: f64,
    pub points_finish: f64,
}

/// Scratch buffers reused across all trials of one thread.
struct TrialBuffers {
    totals: Vec<f64>,
    performances: Vec<f64>,
    order: Vec<usize>,
}

impl TrialBuffers {
    fn new(field_size: usize, no_entries: usize) -> TrialBuffers {
        TrialBuffers {
            totals: vec![0.0; field_size],
            performances: vec![0.0; no_entries],
            order: Vec::with_capacity(no_entries),
        }
    }
}

#[derive(Debug)]
pub struct ChampionshipSimulator<'a> {
    pars: &'a SimulationPars,
    standings: &'a [CompetitorStanding],
    field: Vec<usize>,
    remaining_race_count: u32,
    weights: Vec<f64>,
    entry_owners: Vec<usize>,
    variance: Uniform<f64>,
    sprint: Bernoulli,
    fastest_lap: Bernoulli,
}

impl<'a> ChampionshipSimulator<'a> {
    pub fn new(
        pars: &'a SimulationPars,
        standings: &'a [CompetitorStanding],
        remaining_race_count: u32,
        completed_race_count: u32,
    ) -> Result<ChampionshipSimulator<'a>, SimError> {
        pars.validate()?;
        validate_standings(standings)?;

        let field = select_field(standings, pars.max_field_size);
        if field.len() < standings.len() {
            warn!(
                "Only the {} best placed of {} competitors take part in the simulation",
                field.len(),
                standings.len()
            );
        }

        let weights = calc_weights(pars, standings, &field, completed_race_count);
        let entry_owners: Vec<usize> = (0..field.len())
            .flat_map(|k| std::iter::repeat(k).take(pars.scoring.entries_per_competitor))
            .collect();

        let sprint = Bernoulli::new(pars.scoring.sprint_probability)
            .map_err(|e| InputValueError::new(format!("sprint_probability: {}", e)))?;
        let fastest_lap = Bernoulli::new(pars.scoring.fastest_lap_probability)
            .map_err(|e| InputValueError::new(format!("fastest_lap_probability: {}", e)))?;

        debug!(?weights, "Calculated performance weights");

        Ok(ChampionshipSimulator {
            pars,
            standings,
            field,
            remaining_race_count,
            weights,
            entry_owners,
            variance: Uniform::new(pars.variance_band[0], pars.variance_band[1]),
            sprint,
            fastest_lap,
        })
    }

    /// Performance weights of the simulated field, in standings order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHODS --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method simulates no_trials season completions sequentially with the inserted random
    /// number generator. Identical generator states lead to identical tallies.
    pub fn simulate<R: Rng>(&self, no_trials: u32, rng: &mut R) -> TrialTally {
        if let Some(tally) = self.trivial_tally(no_trials) {
            return tally;
        }

        info!(
            "Simulating {} trials for {} competitors over {} remaining races",
            no_trials,
            self.field.len(),
            self.remaining_race_count
        );

        let mut tally = self.run_trials(no_trials, rng);
        self.add_unsimulated_points(&mut tally, no_trials as u64);
        tally
    }

    /// The method simulates no_trials season completions on the rayon thread pool. The trials
    /// are split into chunks of chunk_size, chunk k draws its random numbers from a generator
    /// seeded with seed + k and the chunk results are merged in chunk order, i.e. the result does
    /// not depend on the number of threads. on_progress receives the number of finished trials.
    pub fn simulate_parallel<F>(
        &self,
        no_trials: u32,
        seed: u64,
        cancel: Option<&CancelToken>,
        on_progress: F,
    ) -> Result<TrialTally, SimError>
    where
        F: Fn(u64) + Sync,
    {
        if let Some(tally) = self.trivial_tally(no_trials) {
            on_progress(no_trials as u64);
            return Ok(tally);
        }

        let chunk_size = self.pars.chunk_size as u64;
        let no_trials_tot = no_trials as u64;
        let no_chunks = (no_trials_tot + chunk_size - 1) / chunk_size;

        info!(
            "Simulating {} trials in {} chunks for {} competitors over {} remaining races",
            no_trials,
            no_chunks,
            self.field.len(),
            self.remaining_race_count
        );

        let finished = AtomicU64::new(0);
        let tallies = (0..no_chunks as u32)
            .into_par_iter()
            .map(|chunk_idx| {
                if cancel.map_or(false, |c| c.is_cancelled()) {
                    return Err(SimError::Cancelled);
                }

                let chunk_idx = chunk_idx as u64;
                let no_chunk_trials = chunk_size.min(no_trials_tot - chunk_idx * chunk_size);
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(chunk_idx));
                let tally = self.run_trials(no_chunk_trials as u32, &mut rng);

                let done = finished.fetch_add(no_chunk_trials, Ordering::Relaxed) + no_chunk_trials;
                on_progress(done);
                Ok(tally)
            })
            .collect::<Result<Vec<TrialTally>, SimError>>()?;

        let mut tally = TrialTally::new(self.standings.len());
        for chunk_tally in tallies.iter() {
            tally.merge(chunk_tally);
        }
        self.add_unsimulated_points(&mut tally, no_trials_tot);

        Ok(tally)
    }

    /// The method simulates the next race no_trials times and returns win, podium and points
    /// finish odds per competitor. Constructors count once per race even if both cars finish on
    /// the podium.
    pub fn simulate_next_race<R: Rng>(&self, no_trials: u32, rng: &mut R) -> Vec<RaceOdds> {
        let mut odds = vec![RaceOdds::default(); self.standings.len()];
        if no_trials == 0 || self.field.is_empty() {
            return odds;
        }

        let no_points_positions = self.pars.scoring.race_points.len();
        let mut counts = vec![[0u64; 3]; self.field.len()];
        let mut best_pos = vec![usize::MAX; self.field.len()];
        let mut buf = TrialBuffers::new(self.field.len(), self.entry_owners.len());

        for _ in 0..no_trials {
            self.rank_entries(rng, &mut buf);
            best_pos.iter_mut().for_each(|p| *p = usize::MAX);

            for (pos, &entry) in buf.order.iter().enumerate() {
                let owner = self.entry_owners[entry];
                best_pos[owner] = best_pos[owner].min(pos);
            }

            for (count, &pos) in counts.iter_mut().zip(best_pos.iter()) {
                if pos == 0 {
                    count[0] += 1;
                }
                if pos < 3 {
                    count[1] += 1;
                }
                if pos < no_points_positions {
                    count[2] += 1;
                }
            }
        }

        let to_pct = |n: u64| round_to(100.0 * n as f64 / no_trials as f64, 1);
        for (&idx, count) in self.field.iter().zip(counts.iter()) {
            odds[idx] = RaceOdds {
                win: to_pct(count[0]),
                podium: to_pct(count[1]),
                points_finish: to_pct(count[2]),
            };
        }

        odds
    }

    // ---------------------------------------------------------------------------------------------
    // SIMULATOR PARTS -----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Cases that need no random numbers: nobody to simulate, a single competitor, or nothing
    /// left to race for. The outcome is certain, so a single trial represents any trial count.
    fn trivial_tally(&self, no_trials: u32) -> Option<TrialTally> {
        let winner = if self.field.is_empty() {
            None
        } else if self.field.len() == 1 || self.remaining_race_count == 0 {
            leader_idx(self.standings)
        } else {
            return None;
        };

        let no_trials = (no_trials as u64).max(1);
        let mut tally = TrialTally::new(self.standings.len());
        tally.trials = no_trials;
        if let Some(winner) = winner {
            tally.win_counts[winner] = no_trials;
        }

        let gain_alone = if self.field.len() == 1 {
            self.remaining_race_count as f64 * self.pars.scoring.expected_points_uncontested()
        } else {
            0.0
        };
        for (sum, c) in tally.points_sums.iter_mut().zip(self.standings) {
            *sum = c.points * no_trials as f64;
        }
        for &idx in self.field.iter() {
            tally.points_sums[idx] += gain_alone * no_trials as f64;
        }

        debug!("Trivial simulation case, no random trials required");
        Some(tally)
    }

    fn run_trials<R: Rng>(&self, no_trials: u32, rng: &mut R) -> TrialTally {
        let mut tally = TrialTally::new(self.standings.len());
        let mut buf = TrialBuffers::new(self.field.len(), self.entry_owners.len());

        for _ in 0..no_trials {
            let winner = self.simulate_trial(rng, &mut buf);
            tally.record(self.field[winner], &buf.totals, &self.field);
        }

        tally
    }

    /// Competitors outside of the simulated field keep their current points.
    fn add_unsimulated_points(&self, tally: &mut TrialTally, no_trials: u64) {
        for (idx, (sum, c)) in tally.points_sums.iter_mut().zip(self.standings).enumerate() {
            if !self.field.contains(&idx) {
                *sum += c.points * no_trials as f64;
            }
        }
    }

    /// One trial: all remaining races are simulated on a fresh copy of the current points, the
    /// first competitor holding the maximum total afterwards wins the championship. Returns the
    /// winner's index within the field.
    fn simulate_trial<R: Rng>(&self, rng: &mut R, buf: &mut TrialBuffers) -> usize {
        for (total, &idx) in buf.totals.iter_mut().zip(self.field.iter()) {
            *total = self.standings[idx].points;
        }

        for _ in 0..self.remaining_race_count {
            self.simulate_race(rng, buf);
        }

        argmax(&buf.totals)
    }

    fn simulate_race<R: Rng>(&self, rng: &mut R, buf: &mut TrialBuffers) {
        let scoring = &self.pars.scoring;
        self.rank_entries(rng, buf);

        for (pos, &entry) in buf.order.iter().enumerate().take(scoring.race_points.len()) {
            buf.totals[self.entry_owners[entry]] += scoring.race_points_for(pos);
        }

        if self.sprint.sample(rng) {
            for (pos, &entry) in buf.order.iter().enumerate().take(scoring.sprint_points.len()) {
                buf.totals[self.entry_owners[entry]] += scoring.sprint_points_for(pos);
            }
        }

        let no_fl_positions = scoring.fastest_lap_eligible_positions.min(buf.order.len());
        if self.fastest_lap.sample(rng) && no_fl_positions > 0 {
            let pos = rng.gen_range(0..no_fl_positions);
            buf.totals[self.entry_owners[buf.order[pos]]] += scoring.fastest_lap_bonus;
        }
    }

    /// The method draws one performance multiplier per entry and ranks the entries by weight
    /// times multiplier (descending, ties keep standings order).
    fn rank_entries<R: Rng>(&self, rng: &mut R, buf: &mut TrialBuffers) {
        for (perf, &owner) in buf.performances.iter_mut().zip(self.entry_owners.iter()) {
            *perf = self.weights[owner] * self.variance.sample(rng);
        }

        argsort_into(&buf.performances, SortOrder::Descending, &mut buf.order);
    }
}

/// select_field returns the indices of the max_field_size competitors with the most points
/// (ties keep standings order), listed in standings order. The leader is always part of it.
fn select_field(standings: &[CompetitorStanding], max_field_size: usize) -> Vec<usize> {
    let points: Vec<f64> = standings.iter().map(|c| c.points).collect();
    let mut field: Vec<usize> = argsort(&points, SortOrder::Descending)
        .into_iter()
        .take(max_field_size)
        .collect();
    field.sort_unstable();
    field
}

/// calc_weights returns the base performance weight of every field member: a power-law share of
/// the points pool times a form factor built from win rate and points rate over the completed
/// races.
fn calc_weights(
    pars: &SimulationPars,
    standings: &[CompetitorStanding],
    field: &[usize],
    completed_race_count: u32,
) -> Vec<f64> {
    let pool: f64 = field
        .iter()
        .map(|&idx| standings[idx].points + pars.points_offset)
        .sum();
    let race_win_points = pars.scoring.race_win_points();

    field
        .iter()
        .map(|&idx| {
            let c = &standings[idx];
            let proximity = ((c.points + pars.points_offset) / pool).powf(pars.proximity_exponent);

            let form = if completed_race_count > 0 && race_win_points > 0.0 {
                let no_races = completed_race_count as f64;
                let win_rate = c.wins as f64 / no_races;
                let points_rate = c.points / (no_races * race_win_points);
                (1.0 + pars.win_rate_weight * win_rate + points_rate).powf(pars.form_exponent)
            } else {
                1.0
            };

            proximity * form
        })
        .collect()
}
