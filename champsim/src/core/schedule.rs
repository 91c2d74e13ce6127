use crate::core::scoring::ScoringModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// * `round` - Round number within the season (0 for pre-season testing)
/// * `name` - Event name, e.g. Italian Grand Prix
/// * `race_datetime` - Start of the points-scoring race, None if not yet known
/// * `is_test_session` - True for testing events that do not award championship points
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScheduleEvent {
    pub round: u32,
    pub name: String,
    pub race_datetime: Option<DateTime<Utc>>,
    pub is_test_session: bool,
}

impl ScheduleEvent {
    /// The method returns true if the event awards points and takes place after now.
    pub fn is_remaining(&self, now: DateTime<Utc>) -> bool {
        !self.is_test_session && matches!(self.race_datetime, Some(t) if t > now)
    }

    /// The method returns true if the event awarded points and took place at or before now.
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        !self.is_test_session && matches!(self.race_datetime, Some(t) if t <= now)
    }
}

/// * `completed_race_count` - Points-scoring events already held
/// * `remaining_race_count` - Points-scoring events still to come
/// * `max_remaining_points` - Points ceiling of the remaining events for a single competitor
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
pub struct RemainingSchedule {
    pub completed_race_count: u32,
    pub remaining_race_count: u32,
    pub max_remaining_points: f64,
}

impl RemainingSchedule {
    /// The method creates a remaining schedule from a plain race count, e.g. for hypothetical
    /// seasons without an event list.
    pub fn from_counts(
        completed_race_count: u32,
        remaining_race_count: u32,
        scoring: &ScoringModel,
    ) -> RemainingSchedule {
        RemainingSchedule {
            completed_race_count,
            remaining_race_count,
            max_remaining_points: remaining_race_count as f64 * scoring.max_points_per_race(),
        }
    }
}

/// calc_remaining_schedule classifies the events of a season into completed and remaining ones
/// at the given point in time. A missing or empty schedule yields zero remaining races, i.e. no
/// contention claims can be made.
pub fn calc_remaining_schedule(
    events: Option<&[ScheduleEvent]>,
    now: DateTime<Utc>,
    scoring: &ScoringModel,
) -> RemainingSchedule {
    let events = match events {
        Some(events) if !events.is_empty() => events,
        _ => {
            debug!("No schedule data available, assuming no remaining races");
            return RemainingSchedule::default();
        }
    };

    let remaining = events.iter().filter(|e| e.is_remaining(now)).count() as u32;
    let completed = events.iter().filter(|e| e.is_completed(now)).count() as u32;

    debug!(
        completed,
        remaining, "Classified {} schedule events", events.len()
    );

    RemainingSchedule::from_counts(completed, remaining, scoring)
}

/// upcoming_events returns the next (at most) horizon points-scoring events after now, earliest
/// first.
pub fn upcoming_events(
    events: &[ScheduleEvent],
    now: DateTime<Utc>,
    horizon: usize,
) -> Vec<&ScheduleEvent> {
    let mut upcoming: Vec<&ScheduleEvent> = events.iter().filter(|e| e.is_remaining(now)).collect();
    upcoming.sort_by_key(|e| e.race_datetime);
    upcoming.truncate(horizon);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn event(round: u32, month: u32, day: u32, is_test_session: bool) -> ScheduleEvent {
        ScheduleEvent {
            round,
            name: format!("Round {}", round),
            race_datetime: Some(Utc.with_ymd_and_hms(2025, month, day, 14, 0, 0).unwrap()),
            is_test_session,
        }
    }

    fn season() -> Vec<ScheduleEvent> {
        vec![
            event(0, 2, 26, true),
            event(1, 3, 16, false),
            event(2, 3, 23, false),
            event(3, 4, 6, false),
            event(4, 4, 13, false),
            event(0, 4, 20, true),
        ]
    }

    #[test]
    fn splits_completed_and_remaining_races() {
        let now = Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        let scoring = ScoringModel::default();
        let events = season();
        let remaining = calc_remaining_schedule(Some(events.as_slice()), now, &scoring);

        assert_eq!(remaining.completed_race_count, 2);
        assert_eq!(remaining.remaining_race_count, 2);
        assert_relative_eq!(remaining.max_remaining_points, 2.0 * 34.0);
    }

    #[test]
    fn race_at_now_counts_as_completed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 16, 14, 0, 0).unwrap();
        let events = season();
        let remaining = calc_remaining_schedule(Some(events.as_slice()), now, &ScoringModel::default());

        assert_eq!(remaining.completed_race_count, 1);
        assert_eq!(remaining.remaining_race_count, 3);
    }

    #[test]
    fn missing_schedule_means_nothing_remains() {
        let now = Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        let scoring = ScoringModel::default();

        assert_eq!(
            calc_remaining_schedule(None, now, &scoring),
            RemainingSchedule::default()
        );
        assert_eq!(
            calc_remaining_schedule(Some(&[][..]), now, &scoring),
            RemainingSchedule::default()
        );
    }

    #[test]
    fn undated_events_are_ignored() {
        let now = Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        let mut events = season();
        events[3].race_datetime = None;
        let remaining = calc_remaining_schedule(Some(events.as_slice()), now, &ScoringModel::default());

        assert_eq!(remaining.remaining_race_count, 1);
    }

    #[test]
    fn upcoming_events_skip_tests_and_past_races() {
        let now = Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        let mut events = season();
        events.swap(3, 4);
        let rounds = |n: usize| -> Vec<u32> {
            upcoming_events(&events, now, n).iter().map(|e| e.round).collect()
        };

        assert_eq!(rounds(1), vec![3]);
        assert_eq!(rounds(5), vec![3, 4]);
        assert!(rounds(0).is_empty());

        let late = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        assert!(upcoming_events(&events, late, 5).is_empty());
    }
}
