use crate::core::competitor::ChampionshipKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "CHAMPSIM",
    about = "A Monte Carlo championship outcome simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Run the simulation on a background worker and show its progress
    #[clap(short, long)]
    pub background: bool,

    /// Additionally forecast the upcoming races
    #[clap(short, long)]
    pub forecast: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the season snapshot file (standings and schedule as JSON)
    #[clap(short, long)]
    pub snapshot_path: PathBuf,

    /// Set path to a simulation parameter file (OPTIONAL: compiled defaults are used otherwise)
    #[clap(short, long)]
    pub config_path: Option<PathBuf>,

    /// Set the championship to simulate (drivers or constructors)
    #[clap(short = 'k', long, default_value = "drivers")]
    pub championship: ChampionshipKind,

    /// Set number of simulation runs (overrides the parameter file)
    #[clap(short, long)]
    pub no_simulations: Option<u32>,

    /// Set the random seed for a reproducible run (overrides the parameter file)
    #[clap(long)]
    pub seed: Option<u64>,

    /// Set the reference time as RFC 3339 timestamp, e.g. 2025-09-01T00:00:00Z (OPTIONAL: current
    /// time is used otherwise)
    #[clap(long)]
    pub now: Option<String>,

    /// Set number of upcoming races covered by the forecast
    #[clap(long, default_value = "1")]
    pub horizon: usize,

    /// Set path of the CSV file the results are written to (OPTIONAL)
    #[clap(long)]
    pub csv_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_command_line() {
        let opts = SimOpts::try_parse_from(&["champsim", "-s", "snapshot.json"]).unwrap();
        assert_eq!(opts.snapshot_path, PathBuf::from("snapshot.json"));
        assert_eq!(opts.championship, ChampionshipKind::Drivers);
        assert!(opts.no_simulations.is_none());
        assert!(!opts.background);
        assert_eq!(opts.horizon, 1);
    }

    #[test]
    fn parses_full_command_line() {
        let opts = SimOpts::try_parse_from(&[
            "champsim",
            "--snapshot-path",
            "snapshot.json",
            "--championship",
            "constructors",
            "-n",
            "20000",
            "--seed",
            "42",
            "--now",
            "2025-09-01T00:00:00Z",
            "-b",
            "-f",
            "--horizon",
            "5",
        ])
        .unwrap();
        assert_eq!(opts.championship, ChampionshipKind::Constructors);
        assert_eq!(opts.no_simulations, Some(20_000));
        assert_eq!(opts.seed, Some(42));
        assert!(opts.background);
        assert!(opts.forecast);
        assert_eq!(opts.horizon, 5);
    }
}
