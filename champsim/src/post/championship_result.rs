use crate::core::competitor::ChampionshipKind;
use crate::core::metrics::points_behind_display;
use crate::core::simulator::RaceOdds;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// SimulationResult contains the championship outlook of a single competitor. It is created fresh
/// by every simulation run and only used for display.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationResult {
    pub id: String,
    pub name: String,
    pub position: u32,
    pub current_points: f64,
    pub win_probability: f64,
    pub expected_points: f64,
    pub points_behind_leader: f64,
    pub max_possible_points: f64,
    pub points_needed: f64,
    pub can_win: bool,
    pub average_finish_needed: Option<f64>,
    pub races_to_clinch: Option<u32>,
}

/// ChampionshipResult contains all information that is required for post-processing the results
/// of one championship simulation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChampionshipResult {
    pub kind: ChampionshipKind,
    pub season: Option<i32>,
    pub completed_race_count: u32,
    pub remaining_race_count: u32,
    pub max_remaining_points: f64,
    pub no_simulations: u32,
    pub results: Vec<SimulationResult>,
}

impl ChampionshipResult {
    /// The method returns the result row of the given competitor.
    pub fn get(&self, id: &str) -> Option<&SimulationResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// The method returns the sum of all win probabilities (100 within rounding for a non-empty
    /// field).
    pub fn total_win_probability(&self) -> f64 {
        self.results.iter().map(|r| r.win_probability).sum()
    }

    /// format_table renders the results as a fixed width text table.
    pub fn format_table(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();

        match self.season {
            Some(season) => writeln!(
                &mut out,
                "RESULT: {} {} championship outlook",
                season, self.kind
            )?,
            None => writeln!(&mut out, "RESULT: {} championship outlook", self.kind)?,
        }
        writeln!(
            &mut out,
            "{} races completed, {} remaining ({} pts available), {} simulations",
            self.completed_race_count,
            self.remaining_race_count,
            self.max_remaining_points,
            self.no_simulations
        )?;
        writeln!(
            &mut out,
            "{:>3}  {:<24} {:>7} {:>7} {:>8} {:>7} {:>7} {:>8} {:>7} {:>7}",
            "pos", "name", "points", "win %", "exp pts", "behind", "max", "can win", "avg fin", "races"
        )?;

        for r in self.results.iter() {
            let behind = points_behind_display(r.points_behind_leader);
            let avg_finish = r
                .average_finish_needed
                .map(|p| format!("P{:.1}", p))
                .unwrap_or_else(|| String::from("-"));
            let races = r
                .races_to_clinch
                .map(|n| n.to_string())
                .unwrap_or_else(|| String::from("-"));

            writeln!(
                &mut out,
                "{:>3}  {:<24} {:>7.1} {:>7.1} {:>8.1} {:>7} {:>7.0} {:>8} {:>7} {:>7}",
                r.position,
                r.name,
                r.current_points,
                r.win_probability,
                r.expected_points,
                behind,
                r.max_possible_points,
                if r.can_win { "yes" } else { "no" },
                avg_finish,
                races
            )?;
        }

        Ok(out)
    }

    /// print_table prints the results to the console output.
    pub fn print_table(&self) -> anyhow::Result<()> {
        print!("{}", self.format_table()?);
        Ok(())
    }

    /// write_csv writes one row per competitor to the given CSV file.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .context(format!("Failed to create output directory {}!", dir.display()))?;
            }
        }

        let mut wtr = csv::Writer::from_path(path)
            .context(format!("Failed to open output file {}!", path.display()))?;
        for r in self.results.iter() {
            wtr.serialize(r)
                .context(format!("Failed to write result row for {}!", r.id))?;
        }
        wtr.flush()?;

        Ok(())
    }
}

/// * `round` - Round number of the next event
/// * `event_name` - Name of the next event
/// * `odds` - Per competitor race odds, sorted by podium probability (descending)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NextRaceForecast {
    pub round: u32,
    pub event_name: String,
    pub odds: Vec<CompetitorRaceOdds>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompetitorRaceOdds {
    pub id: String,
    pub name: String,
    pub predicted_position: u32,
    pub odds: RaceOdds,
}

impl NextRaceForecast {
    pub fn format_table(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(
            &mut out,
            "RESULT: Round {} ({}) race outlook",
            self.round, self.event_name
        )?;
        writeln!(
            &mut out,
            "{:>3}  {:<24} {:>7} {:>8} {:>8}",
            "pos", "name", "win %", "podium %", "points %"
        )?;
        for o in self.odds.iter() {
            writeln!(
                &mut out,
                "{:>3}  {:<24} {:>7.1} {:>8.1} {:>8.1}",
                o.predicted_position, o.name, o.odds.win, o.odds.podium, o.odds.points_finish
            )?;
        }
        Ok(out)
    }
}
