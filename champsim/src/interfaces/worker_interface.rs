use crate::error::SimError;
use crate::post::championship_result::ChampionshipResult;

/// * `finished_trials` - Trials finished so far
/// * `no_trials` - Trials of the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationProgress {
    pub finished_trials: u64,
    pub no_trials: u64,
}

impl SimulationProgress {
    pub fn fraction(&self) -> f64 {
        if self.no_trials == 0 {
            1.0
        } else {
            self.finished_trials as f64 / self.no_trials as f64
        }
    }
}

/// SimulationEvent is sent from the simulation worker thread to the caller. Exactly one of
/// Finished, Cancelled or Failed terminates the stream.
#[derive(Debug)]
pub enum SimulationEvent {
    Progress(SimulationProgress),
    Finished(ChampionshipResult),
    Cancelled,
    Failed(SimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_fraction() {
        let p = SimulationProgress {
            finished_trials: 250,
            no_trials: 1_000,
        };
        assert!((p.fraction() - 0.25).abs() < 1e-12);
        assert!((SimulationProgress::default().fraction() - 1.0).abs() < 1e-12);
    }
}
