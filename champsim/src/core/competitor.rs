use crate::error::SimError;
use helpers::general::argmax;
use serde::{Deserialize, Serialize};
use std::fmt;

/// * `id` - Competitor identifier, e.g. max_verstappen or red_bull
/// * `name` - Display name, e.g. Max Verstappen
/// * `points` - Current championship points (half points are possible, therefore f64)
/// * `wins` - Number of wins in the current season
/// * `position` - Current championship position (1-based), supplied by the standings source
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompetitorStanding {
    pub id: String,
    pub name: String,
    pub points: f64,
    pub wins: u32,
    pub position: u32,
}

impl CompetitorStanding {
    pub fn new(id: &str, name: &str, points: f64, wins: u32, position: u32) -> CompetitorStanding {
        CompetitorStanding {
            id: id.to_owned(),
            name: name.to_owned(),
            points,
            wins,
            position,
        }
    }
}

/// ChampionshipKind distinguishes the drivers' from the constructors' championship. Constructors
/// score with two cars per race.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChampionshipKind {
    Drivers,
    Constructors,
}

impl Default for ChampionshipKind {
    fn default() -> Self {
        ChampionshipKind::Drivers
    }
}

impl ChampionshipKind {
    pub fn entries_per_competitor(&self) -> usize {
        match self {
            ChampionshipKind::Drivers => 1,
            ChampionshipKind::Constructors => 2,
        }
    }
}

impl fmt::Display for ChampionshipKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChampionshipKind::Drivers => write!(f, "drivers"),
            ChampionshipKind::Constructors => write!(f, "constructors"),
        }
    }
}

impl std::str::FromStr for ChampionshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drivers" | "driver" | "wdc" => Ok(ChampionshipKind::Drivers),
            "constructors" | "constructor" | "teams" | "wcc" => Ok(ChampionshipKind::Constructors),
            _ => Err(format!("Unknown championship kind '{}'", s)),
        }
    }
}

/// validate_standings rejects snapshots with NaN, infinite or negative points. Corrupted inputs
/// would otherwise silently turn into plausible looking probabilities.
pub fn validate_standings(standings: &[CompetitorStanding]) -> Result<(), SimError> {
    match standings
        .iter()
        .find(|c| !c.points.is_finite() || c.points < 0.0)
    {
        Some(c) => Err(SimError::InvalidPoints {
            id: c.id.to_owned(),
            points: c.points,
        }),
        None => Ok(()),
    }
}

/// leader_idx returns the index of the first competitor (in supplied order) holding the maximum
/// number of points.
pub fn leader_idx(standings: &[CompetitorStanding]) -> Option<usize> {
    if standings.is_empty() {
        return None;
    }

    let points: Vec<f64> = standings.iter().map(|c| c.points).collect();
    Some(argmax(&points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_is_first_at_maximum() {
        let standings = vec![
            CompetitorStanding::new("a", "A", 100.0, 2, 1),
            CompetitorStanding::new("b", "B", 120.0, 1, 2),
            CompetitorStanding::new("c", "C", 120.0, 3, 3),
        ];
        assert_eq!(leader_idx(&standings), Some(1));
        assert_eq!(leader_idx(&[]), None);
    }

    #[test]
    fn negative_and_nan_points_are_rejected() {
        let negative = vec![CompetitorStanding::new("a", "A", -1.0, 0, 1)];
        assert!(matches!(
            validate_standings(&negative),
            Err(SimError::InvalidPoints { .. })
        ));

        let nan = vec![
            CompetitorStanding::new("a", "A", 10.0, 0, 1),
            CompetitorStanding::new("b", "B", f64::NAN, 0, 2),
        ];
        match validate_standings(&nan) {
            Err(SimError::InvalidPoints { id, .. }) => assert_eq!(id, "b"),
            other => panic!("unexpected result {:?}", other),
        }

        assert!(validate_standings(&[CompetitorStanding::new("a", "A", 0.0, 0, 1)]).is_ok());
    }

    #[test]
    fn championship_kind_parses_aliases() {
        assert_eq!("WCC".parse::<ChampionshipKind>(), Ok(ChampionshipKind::Constructors));
        assert_eq!("drivers".parse::<ChampionshipKind>(), Ok(ChampionshipKind::Drivers));
        assert!("karting".parse::<ChampionshipKind>().is_err());
        assert_eq!(ChampionshipKind::Constructors.entries_per_competitor(), 2);
    }
}
