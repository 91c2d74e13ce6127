use crate::core::competitor::CompetitorStanding;
use crate::core::schedule::{calc_remaining_schedule, upcoming_events, ScheduleEvent};
use crate::core::simulator::{ChampionshipSimulator, RaceOdds, SimulationPars};
use crate::error::SimError;
use crate::post::championship_result::{CompetitorRaceOdds, NextRaceForecast};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

/// forecast_upcoming_races estimates win, podium and points finish odds for the next `horizon`
/// points-scoring events using the same race model as the championship simulation. Every event
/// draws its own trials. Returns an empty list if the season has no remaining event.
pub fn forecast_upcoming_races<R: Rng>(
    standings: &[CompetitorStanding],
    schedule: &[ScheduleEvent],
    now: DateTime<Utc>,
    pars: &SimulationPars,
    horizon: usize,
    no_trials: u32,
    rng: &mut R,
) -> Result<Vec<NextRaceForecast>, SimError> {
    let events = upcoming_events(schedule, now, horizon);
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let remaining = calc_remaining_schedule(Some(schedule), now, &pars.scoring);
    let sim = ChampionshipSimulator::new(pars, standings, 1, remaining.completed_race_count)?;
    let no_trials = pars.clamp_no_simulations(no_trials);

    let mut forecasts = Vec::with_capacity(events.len());
    for event in events {
        info!(
            "Forecasting round {} ({}) with {} trials",
            event.round, event.name, no_trials
        );
        let odds = sim.simulate_next_race(no_trials, rng);
        forecasts.push(NextRaceForecast {
            round: event.round,
            event_name: event.name.to_owned(),
            odds: rank_odds(standings, odds),
        });
    }

    Ok(forecasts)
}

/// Sorts the odds by podium odds first, win odds second and standings order last.
fn rank_odds(standings: &[CompetitorStanding], odds: Vec<RaceOdds>) -> Vec<CompetitorRaceOdds> {
    let mut rows: Vec<(usize, CompetitorRaceOdds)> = standings
        .iter()
        .zip(odds.into_iter())
        .enumerate()
        .map(|(idx, (c, odds))| {
            (
                idx,
                CompetitorRaceOdds {
                    id: c.id.to_owned(),
                    name: c.name.to_owned(),
                    predicted_position: 0,
                    odds,
                },
            )
        })
        .collect();

    rows.sort_by(|(idx_a, a), (idx_b, b)| {
        b.odds
            .podium
            .total_cmp(&a.odds.podium)
            .then(b.odds.win.total_cmp(&a.odds.win))
            .then(idx_a.cmp(idx_b))
    });

    rows.into_iter()
        .enumerate()
        .map(|(pos, (_, mut row))| {
            row.predicted_position = pos as u32 + 1;
            row
        })
        .collect()
}
