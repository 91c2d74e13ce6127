use crate::core::competitor::{ChampionshipKind, CompetitorStanding};
use crate::core::handle_championship::ChampionshipInput;
use crate::core::schedule::ScheduleEvent;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// Driver standings entry as delivered by the standings API.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverStandingPayload {
    pub position: Option<u32>,
    pub points: Option<f64>,
    #[serde(default)]
    pub wins: u32,
    pub driver_id: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

/// Constructor standings entry as delivered by the standings API.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStandingPayload {
    pub position: Option<u32>,
    pub points: Option<f64>,
    #[serde(default)]
    pub wins: u32,
    pub constructor_id: String,
    #[serde(default)]
    pub constructor_name: String,
}

/// Schedule entry as delivered by the schedule API. Session 5 is the race.
#[derive(Debug, Deserialize, Clone)]
pub struct RaceEventPayload {
    #[serde(rename = "RoundNumber")]
    pub round_number: u32,
    #[serde(rename = "EventName", default)]
    pub event_name: String,
    #[serde(rename = "EventFormat", default)]
    pub event_format: Option<String>,
    #[serde(rename = "Session5Date", default)]
    pub session5_date: Option<String>,
    #[serde(rename = "Session5DateUtc", default)]
    pub session5_date_utc: Option<String>,
}

/// * `season` - Season year
/// * `drivers` - Drivers' standings
/// * `constructors` - Constructors' standings
/// * `schedule` - Event schedule, None if the schedule could not be fetched
#[derive(Debug, Deserialize, Clone)]
pub struct SeasonSnapshot {
    pub season: Option<i32>,
    #[serde(default)]
    pub drivers: Vec<DriverStandingPayload>,
    #[serde(default)]
    pub constructors: Vec<ConstructorStandingPayload>,
    #[serde(default)]
    pub schedule: Option<Vec<RaceEventPayload>>,
}

impl SeasonSnapshot {
    /// The method converts the standings of the given championship, ordered by position.
    /// Entries without position keep their place behind the ranked ones.
    pub fn standings(&self, kind: ChampionshipKind) -> anyhow::Result<Vec<CompetitorStanding>> {
        let mut standings = match kind {
            ChampionshipKind::Drivers => self
                .drivers
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let name = format!("{} {}", d.given_name, d.family_name);
                    Ok(CompetitorStanding {
                        id: d.driver_id.to_owned(),
                        name: name.trim().to_owned(),
                        points: required_points(d.points, &d.driver_id)?,
                        wins: d.wins,
                        position: d.position.unwrap_or(i as u32 + 1),
                    })
                })
                .collect::<anyhow::Result<Vec<CompetitorStanding>>>()?,
            ChampionshipKind::Constructors => self
                .constructors
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    Ok(CompetitorStanding {
                        id: c.constructor_id.to_owned(),
                        name: c.constructor_name.to_owned(),
                        points: required_points(c.points, &c.constructor_id)?,
                        wins: c.wins,
                        position: c.position.unwrap_or(i as u32 + 1),
                    })
                })
                .collect::<anyhow::Result<Vec<CompetitorStanding>>>()?,
        };

        standings.sort_by_key(|c| c.position);
        Ok(standings)
    }

    /// The method converts the schedule, None if the snapshot contains no schedule.
    pub fn schedule_events(&self) -> anyhow::Result<Option<Vec<ScheduleEvent>>> {
        let payload = match &self.schedule {
            Some(payload) => payload,
            None => return Ok(None),
        };

        let events = payload
            .iter()
            .map(|e| {
                let date = e.session5_date_utc.as_ref().or_else(|| e.session5_date.as_ref());
                let race_datetime = match date {
                    Some(s) => Some(parse_event_datetime(s).context(format!(
                        "Invalid race date of round {} ({})!",
                        e.round_number, e.event_name
                    ))?),
                    None => None,
                };
                let is_testing = e
                    .event_format
                    .as_deref()
                    .map_or(false, |f| f.eq_ignore_ascii_case("testing"));

                Ok(ScheduleEvent {
                    round: e.round_number,
                    name: e.event_name.to_owned(),
                    race_datetime,
                    is_test_session: e.round_number == 0 || is_testing,
                })
            })
            .collect::<anyhow::Result<Vec<ScheduleEvent>>>()?;

        Ok(Some(events))
    }

    /// The method assembles the input of a championship simulation at the given point in time.
    pub fn to_input(
        &self,
        kind: ChampionshipKind,
        now: DateTime<Utc>,
    ) -> anyhow::Result<ChampionshipInput> {
        Ok(ChampionshipInput {
            kind,
            season: self.season,
            standings: self.standings(kind)?,
            schedule: self.schedule_events()?,
            now,
        })
    }
}

fn required_points(points: Option<f64>, id: &str) -> anyhow::Result<f64> {
    points.ok_or_else(|| anyhow::anyhow!("Standings entry {} has no points value!", id))
}

/// parse_event_datetime accepts RFC 3339 timestamps, naive timestamps (interpreted as UTC) and
/// plain dates (midnight UTC).
pub fn parse_event_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"].iter() {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&t));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&t));
        }
    }

    anyhow::bail!("Could not parse date '{}'", s)
}

/// read_snapshot reads the JSON file and decodes it into a season snapshot.
pub fn read_snapshot(filepath: &Path) -> anyhow::Result<SeasonSnapshot> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open snapshot file {}!", filepath.display()))?;
    let snapshot = serde_json::from_reader(&fh).context(format!(
        "Failed to parse snapshot file {}!",
        filepath.display()
    ))?;
    Ok(snapshot)
}
