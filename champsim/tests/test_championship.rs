//! Scenario tests of the championship simulation through its public entry points.

use champsim::core::competitor::{ChampionshipKind, CompetitorStanding};
use champsim::core::handle_championship::{
    handle_championship, handle_championship_parallel, ChampionshipInput,
};
use champsim::core::schedule::ScheduleEvent;
use champsim::core::simulator::SimulationPars;
use champsim::error::SimError;
use champsim::pre::read_snapshot::SeasonSnapshot;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Season with `completed` races before and `remaining` races after the reference time.
fn season(
    kind: ChampionshipKind,
    standings: Vec<CompetitorStanding>,
    completed: u32,
    remaining: u32,
) -> ChampionshipInput {
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
    let mut schedule = vec![ScheduleEvent {
        round: 0,
        name: String::from("Pre-Season Testing"),
        race_datetime: None,
        is_test_session: true,
    }];

    for i in 0..(completed + remaining) {
        // completed races lie in the past, remaining ones start a week after now
        let weeks = if i < completed {
            i as i64 - completed as i64
        } else {
            (i - completed) as i64 + 1
        };
        schedule.push(ScheduleEvent {
            round: i + 1,
            name: format!("Grand Prix {}", i + 1),
            race_datetime: Some(now + Duration::days(7 * weeks)),
            is_test_session: false,
        });
    }

    ChampionshipInput {
        kind,
        season: Some(2025),
        standings,
        schedule: Some(schedule),
        now,
    }
}

fn abc() -> Vec<CompetitorStanding> {
    vec![
        CompetitorStanding::new("A", "Driver A", 350.0, 8, 1),
        CompetitorStanding::new("B", "Driver B", 300.0, 5, 2),
        CompetitorStanding::new("C", "Driver C", 50.0, 0, 3),
    ]
}

fn pars(no_simulations: u32) -> SimulationPars {
    SimulationPars {
        no_simulations,
        seed: Some(2025),
        ..SimulationPars::default()
    }
}

#[test]
fn late_season_example() {
    let input = season(ChampionshipKind::Drivers, abc(), 22, 2);
    let result = handle_championship(&input, &pars(20_000), &mut StdRng::seed_from_u64(11)).unwrap();

    assert_eq!(result.remaining_race_count, 2);
    assert_eq!(result.completed_race_count, 22);
    assert_eq!(result.max_remaining_points, 68.0);

    let a = result.get("A").unwrap();
    let b = result.get("B").unwrap();
    let c = result.get("C").unwrap();

    assert!(!c.can_win);
    assert_eq!(c.max_possible_points, 118.0);
    assert_eq!(c.win_probability, 0.0);
    assert!(b.can_win);
    assert!(a.win_probability > b.win_probability);
    assert!((a.win_probability + b.win_probability - 100.0).abs() <= 0.1);

    assert_eq!(a.points_needed, 0.0);
    assert_eq!(a.average_finish_needed, Some(3.0));
    assert_eq!(b.points_needed, 51.0);
    assert_eq!(b.races_to_clinch, Some(3));
    assert_eq!(result.results[0].id, "A");
}

#[test]
fn finished_season_goes_to_the_leader() {
    let input = season(ChampionshipKind::Drivers, abc(), 24, 0);
    let result = handle_championship(&input, &pars(5_000), &mut StdRng::seed_from_u64(3)).unwrap();

    assert_eq!(result.remaining_race_count, 0);
    assert_eq!(result.get("A").unwrap().win_probability, 100.0);
    assert_eq!(result.get("B").unwrap().win_probability, 0.0);
    assert!(!result.get("B").unwrap().can_win);
    assert_eq!(result.get("B").unwrap().races_to_clinch, None);
}

#[test]
fn single_and_empty_fields() {
    let single = season(
        ChampionshipKind::Drivers,
        vec![CompetitorStanding::new("solo", "Solo", 10.0, 0, 1)],
        3,
        5,
    );
    let result = handle_championship(&single, &pars(1_000), &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].win_probability, 100.0);
    assert!(result.results[0].expected_points > 10.0);

    let empty = season(ChampionshipKind::Drivers, Vec::new(), 3, 5);
    let result = handle_championship(&empty, &pars(1_000), &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(result.results.is_empty());
}

#[test]
fn more_points_never_lower_the_win_probability() {
    let low = season(ChampionshipKind::Drivers, abc(), 18, 6);
    let mut standings = abc();
    standings[1].points = 320.0;
    let high = season(ChampionshipKind::Drivers, standings, 18, 6);

    let pars = pars(10_000);
    let p_low = handle_championship(&low, &pars, &mut StdRng::seed_from_u64(99)).unwrap();
    let p_high = handle_championship(&high, &pars, &mut StdRng::seed_from_u64(99)).unwrap();

    assert!(
        p_high.get("B").unwrap().win_probability >= p_low.get("B").unwrap().win_probability
    );
}

#[test]
fn seeded_runs_are_reproducible() {
    let input = season(ChampionshipKind::Drivers, abc(), 14, 10);
    let pars = pars(12_345);

    let first = handle_championship(&input, &pars, &mut StdRng::seed_from_u64(8)).unwrap();
    let second = handle_championship(&input, &pars, &mut StdRng::seed_from_u64(8)).unwrap();
    assert_eq!(first, second);

    let first = handle_championship_parallel(&input, &pars, None, None).unwrap();
    let second = handle_championship_parallel(&input, &pars, None, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.no_simulations, 12_345);
}

#[test]
fn constructors_championship() {
    let standings = vec![
        CompetitorStanding::new("mclaren", "McLaren", 650.0, 13, 1),
        CompetitorStanding::new("ferrari", "Ferrari", 300.0, 0, 2),
        CompetitorStanding::new("mercedes", "Mercedes", 290.0, 2, 3),
        CompetitorStanding::new("red_bull", "Red Bull", 280.0, 3, 4),
    ];
    let input = season(ChampionshipKind::Constructors, standings, 16, 8);
    let result = handle_championship(&input, &pars(10_000), &mut StdRng::seed_from_u64(4)).unwrap();

    assert_eq!(result.kind, ChampionshipKind::Constructors);
    assert_eq!(result.max_remaining_points, 8.0 * 59.0);

    let ferrari = result.get("ferrari").unwrap();
    assert!(ferrari.can_win);
    assert_eq!(ferrari.races_to_clinch, Some(9));
    assert!(result.get("mclaren").unwrap().win_probability > 90.0);
    assert!((result.total_win_probability() - 100.0).abs() <= 0.25);
}

#[test]
fn snapshot_to_result() {
    let snapshot: SeasonSnapshot = serde_json::from_str(
        r#"{
            "season": 2025,
            "drivers": [
                {"position": 1, "points": 100.0, "wins": 1, "driverId": "x",
                 "givenName": "Max", "familyName": "X"},
                {"position": 2, "points": 95.0, "wins": 0, "driverId": "y",
                 "givenName": "Yuki", "familyName": "Y"}
            ],
            "schedule": [
                {"RoundNumber": 1, "EventName": "Opener", "Session5Date": "2025-03-01T14:00:00Z"},
                {"RoundNumber": 2, "EventName": "Finale", "Session5Date": "2025-12-01T14:00:00Z"}
            ]
        }"#,
    )
    .unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let input = snapshot.to_input(ChampionshipKind::Drivers, now).unwrap();
    let result = handle_championship(&input, &pars(2_000), &mut StdRng::seed_from_u64(6)).unwrap();

    assert_eq!(result.completed_race_count, 1);
    assert_eq!(result.remaining_race_count, 1);
    assert!(result.get("x").unwrap().win_probability > result.get("y").unwrap().win_probability);
    assert!(result.get("y").unwrap().win_probability > 0.0);
}

#[test]
fn zero_simulations_are_rejected() {
    let input = season(ChampionshipKind::Drivers, abc(), 20, 4);
    let res = handle_championship(&input, &pars(0), &mut StdRng::seed_from_u64(1));

    assert!(matches!(res, Err(SimError::InputValue(_))));
}

#[test]
fn leader_listed_last_is_simulated() {
    let standings = vec![
        CompetitorStanding::new("B", "Driver B", 300.0, 5, 2),
        CompetitorStanding::new("C", "Driver C", 50.0, 0, 3),
        CompetitorStanding::new("A", "Driver A", 350.0, 8, 1),
    ];
    let input = season(ChampionshipKind::Drivers, standings, 22, 2);
    let pars = SimulationPars {
        max_field_size: 2,
        ..pars(5_000)
    };
    let result = handle_championship(&input, &pars, &mut StdRng::seed_from_u64(12)).unwrap();

    assert!(result.get("A").unwrap().win_probability > 0.0);
    for r in result.results.iter().filter(|r| !r.can_win) {
        assert_eq!(r.win_probability, 0.0, "{} is eliminated", r.id);
    }
    assert!((result.total_win_probability() - 100.0).abs() <= 0.15);
}
