use crate::core::schedule::RemainingSchedule;
use crate::core::scoring::ScoringModel;
use helpers::general::{lin_interp, round_to};
use serde::{Deserialize, Serialize};

/// Average finishing position the current leader is asked to keep up.
pub const MAINTAIN_TARGET_POSITION: f64 = 3.0;

/// * `points_behind_leader` - (pts) Gap to the leader, negative or zero for the leader itself
/// * `max_possible_points` - (pts) Current points plus the points ceiling of the remaining races
/// * `points_needed` - (pts) Points required to pass the leader, 0 for the leader
/// * `can_win` - False if the competitor is mathematically eliminated
/// * `average_finish_needed` - Approximate average finishing position required over the
/// remaining races, None if nothing remains
/// * `races_to_clinch` - Race wins required to make up points_needed, None if nothing remains
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ChampionshipMetrics {
    pub points_behind_leader: f64,
    pub max_possible_points: f64,
    pub points_needed: f64,
    pub can_win: bool,
    pub average_finish_needed: Option<f64>,
    pub races_to_clinch: Option<u32>,
}

/// points_behind_display formats the gap to the leader for reports ("—" if not behind).
pub fn points_behind_display(points_behind_leader: f64) -> String {
    if points_behind_leader > 0.0 {
        format!("{}", points_behind_leader)
    } else {
        String::from("—")
    }
}

/// derive_metrics calculates the championship figures of a single competitor from its current
/// points, the leader's points and the remaining schedule.
pub fn derive_metrics(
    points: f64,
    leader_points: f64,
    is_leader: bool,
    schedule: &RemainingSchedule,
    scoring: &ScoringModel,
) -> ChampionshipMetrics {
    let max_possible_points = points + schedule.max_remaining_points;
    let can_win = is_leader || max_possible_points >= leader_points;
    let points_needed = if is_leader {
        0.0
    } else {
        (leader_points - points + 1.0).max(0.0)
    };

    let remaining = schedule.remaining_race_count;
    let (average_finish_needed, races_to_clinch) = if remaining == 0 {
        (None, None)
    } else {
        let average_finish = if is_leader {
            MAINTAIN_TARGET_POSITION
        } else {
            let no_entries = (remaining as usize * scoring.entries_per_competitor) as f64;
            average_finish_for(points_needed / no_entries, &scoring.race_points)
        };

        let race_win_points = scoring.race_win_points();
        let races = if race_win_points > 0.0 {
            Some((points_needed / race_win_points).ceil() as u32)
        } else {
            None
        };

        (Some(average_finish), races)
    };

    ChampionshipMetrics {
        points_behind_leader: leader_points - points,
        max_possible_points,
        points_needed,
        can_win,
        average_finish_needed,
        races_to_clinch,
    }
}

/// average_finish_for maps the required average points per race onto an approximate finishing
/// position using the points table as step function (>= 25 -> P1, >= 18 -> P2, ...). Below the
/// last scoring position the result is interpolated between the last scoring position and the
/// first non-scoring one.
pub fn average_finish_for(avg_points: f64, race_points: &[f64]) -> f64 {
    let scoring_points: Vec<f64> = race_points.iter().copied().filter(|&p| p > 0.0).collect();

    for (pos, &pts) in scoring_points.iter().enumerate() {
        if avg_points >= pts {
            return (pos + 1) as f64;
        }
    }

    let no_scoring = scoring_points.len();
    if no_scoring == 0 {
        return 1.0;
    }

    let last_points = scoring_points[no_scoring - 1];
    let pos = lin_interp(
        avg_points,
        &[0.0, last_points],
        &[(no_scoring + 1) as f64, no_scoring as f64],
    );
    round_to(pos, 1)
}
