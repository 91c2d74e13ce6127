use crate::core::competitor::ChampionshipKind;
use helpers::general::InputValueError;
use serde::{Deserialize, Serialize};

/// * `race_points` - Points for finishing positions 1, 2, ... of a grand prix (zero beyond)
/// * `sprint_points` - Points for finishing positions 1, 2, ... of a sprint (zero beyond)
/// * `sprint_probability` - Probability that a simulated race weekend also holds a sprint
/// * `fastest_lap_bonus` - Bonus points for the fastest lap
/// * `fastest_lap_probability` - Probability that the fastest lap bonus is awarded at all
/// * `fastest_lap_eligible_positions` - The bonus goes to a position drawn uniformly from the top
/// n finishers
/// * `entries_per_competitor` - Cars scoring for one competitor (1 for drivers, 2 for
/// constructors)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringModel {
    pub race_points: Vec<f64>,
    pub sprint_points: Vec<f64>,
    pub sprint_probability: f64,
    pub fastest_lap_bonus: f64,
    pub fastest_lap_probability: f64,
    pub fastest_lap_eligible_positions: usize,
    pub entries_per_competitor: usize,
}

impl Default for ScoringModel {
    fn default() -> Self {
        ScoringModel {
            race_points: vec![25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0],
            sprint_points: vec![8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
            sprint_probability: 0.25,
            fastest_lap_bonus: 1.0,
            fastest_lap_probability: 0.2,
            fastest_lap_eligible_positions: 10,
            entries_per_competitor: 1,
        }
    }
}

impl ScoringModel {
    pub fn for_kind(kind: ChampionshipKind) -> ScoringModel {
        ScoringModel {
            entries_per_competitor: kind.entries_per_competitor(),
            ..ScoringModel::default()
        }
    }

    /// The method returns the race points for the given finishing position (0-based).
    pub fn race_points_for(&self, pos: usize) -> f64 {
        self.race_points.get(pos).copied().unwrap_or(0.0)
    }

    /// The method returns the sprint points for the given finishing position (0-based).
    pub fn sprint_points_for(&self, pos: usize) -> f64 {
        self.sprint_points.get(pos).copied().unwrap_or(0.0)
    }

    /// The method returns the points a competitor scores with a perfect grand prix, i.e. all its
    /// cars on the top positions (25 for drivers, 25 + 18 for constructors).
    pub fn race_win_points(&self) -> f64 {
        self.race_points
            .iter()
            .take(self.entries_per_competitor)
            .sum()
    }

    /// The method returns the maximum number of points a competitor can gain on one race weekend
    /// under the rules used by the simulator. It is the ceiling of the remaining schedule
    /// calculation, which keeps mathematically eliminated competitors at zero simulated wins.
    pub fn max_points_per_race(&self) -> f64 {
        let mut max_points = self.race_win_points();

        if self.fastest_lap_probability > 0.0 && self.fastest_lap_eligible_positions > 0 {
            max_points += self.fastest_lap_bonus;
        }

        if self.sprint_probability > 0.0 {
            max_points += self
                .sprint_points
                .iter()
                .take(self.entries_per_competitor)
                .sum::<f64>();
        }

        max_points
    }

    /// The method returns the expected points per race weekend of a competitor without any
    /// opponents, i.e. one that finishes all its cars on the top positions every time.
    pub fn expected_points_uncontested(&self) -> f64 {
        let sprint: f64 = self
            .sprint_points
            .iter()
            .take(self.entries_per_competitor)
            .sum();
        let fastest_lap = if self.fastest_lap_eligible_positions > 0 {
            self.fastest_lap_probability * self.fastest_lap_bonus
        } else {
            0.0
        };

        self.race_win_points() + self.sprint_probability * sprint + fastest_lap
    }

    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.race_points.is_empty() {
            return Err(InputValueError::new("race_points must not be empty"));
        }

        for (name, table) in [
            ("race_points", &self.race_points),
            ("sprint_points", &self.sprint_points),
        ]
        .iter()
        {
            if table.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(InputValueError::new(format!(
                    "{} must only contain finite non-negative values",
                    name
                )));
            }
            if table.windows(2).any(|w| w[1] > w[0]) {
                return Err(InputValueError::new(format!(
                    "{} must be non-increasing",
                    name
                )));
            }
        }

        for (name, prob) in [
            ("sprint_probability", self.sprint_probability),
            ("fastest_lap_probability", self.fastest_lap_probability),
        ]
        .iter()
        {
            if !(0.0..=1.0).contains(prob) {
                return Err(InputValueError::new(format!(
                    "{} must be in the range [0, 1], got {}",
                    name, prob
                )));
            }
        }

        if !self.fastest_lap_bonus.is_finite() || self.fastest_lap_bonus < 0.0 {
            return Err(InputValueError::new("fastest_lap_bonus must be non-negative"));
        }

        if self.entries_per_competitor == 0 {
            return Err(InputValueError::new("entries_per_competitor must be at least 1"));
        }

        Ok(())
    }
}
