use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::http_cache::fetch_cached;
use crate::http_client::http_client;
use crate::player::PlayerRecord;
use crate::teams;

pub const BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
pub const FIXTURES_URL: &str = "https://fantasy.premierleague.com/api/fixtures/";

/// Used for teams with no upcoming fixture in the feed.
pub const DEFAULT_FIXTURE_DIFFICULTY: f64 = 3.0;
const LOOKAHEAD_FIXTURES: usize = 3;
const CACHE_MAX_AGE_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedElement {
    pub id: u32,
    pub web_name: String,
    pub team: u32,
    pub element_type: u8,
    pub now_cost: i64,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub form: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub total_points: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub threat: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub expected_goals: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub expected_assists: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub clean_sheets: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub saves: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub minutes: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedTeam {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub elements: Vec<FeedElement>,
    #[serde(default)]
    pub teams: Vec<FeedTeam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedFixture {
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub kickoff_time: Option<String>,
    #[serde(default)]
    pub finished: bool,
    pub team_h: u32,
    pub team_a: u32,
    pub team_h_difficulty: f64,
    pub team_a_difficulty: f64,
}

#[derive(Debug, Clone)]
pub struct FetchedSnapshot {
    pub records: Vec<PlayerRecord>,
    pub team_mismatches: Vec<String>,
}

// The feed sends most decimals as strings ("4.5") and counts as numbers.
fn de_opt_num<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

pub fn parse_bootstrap_json(raw: &str) -> Result<Bootstrap> {
    serde_json::from_str::<Bootstrap>(raw).context("parse bootstrap-static payload")
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<FeedFixture>> {
    serde_json::from_str::<Vec<FeedFixture>>(raw).context("parse fixtures payload")
}

/// Average difficulty of each team's next three unfinished fixtures, ordered
/// by gameweek then kickoff. Fixtures without a gameweek sort last.
pub fn next_three_difficulty(fixtures: &[FeedFixture]) -> HashMap<u32, f64> {
    let mut upcoming: Vec<&FeedFixture> = fixtures.iter().filter(|f| !f.finished).collect();
    upcoming.sort_by(|a, b| {
        a.event
            .unwrap_or(u32::MAX)
            .cmp(&b.event.unwrap_or(u32::MAX))
            .then_with(|| a.kickoff_time.cmp(&b.kickoff_time))
    });

    let mut per_team: HashMap<u32, Vec<f64>> = HashMap::new();
    for f in upcoming {
        for (team, difficulty) in [
            (f.team_h, f.team_h_difficulty),
            (f.team_a, f.team_a_difficulty),
        ] {
            let list = per_team.entry(team).or_default();
            if list.len() < LOOKAHEAD_FIXTURES {
                list.push(difficulty);
            }
        }
    }

    per_team
        .into_iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(team, list)| (team, list.iter().sum::<f64>() / list.len() as f64))
        .collect()
}

pub fn build_records(bootstrap: &Bootstrap, difficulty: &HashMap<u32, f64>) -> Vec<PlayerRecord> {
    bootstrap
        .elements
        .iter()
        .map(|e| PlayerRecord {
            id: e.id,
            web_name: e.web_name.clone(),
            team: e.team,
            element_type: e.element_type,
            now_cost: e.now_cost,
            form: e.form,
            total_points: e.total_points,
            threat: e.threat,
            expected_goals: e.expected_goals,
            expected_assists: e.expected_assists,
            clean_sheets: e.clean_sheets,
            saves: e.saves,
            minutes: e.minutes,
            next_3_gw_fixtures: Some(
                difficulty
                    .get(&e.team)
                    .copied()
                    .unwrap_or(DEFAULT_FIXTURE_DIFFICULTY),
            ),
        })
        .collect()
}

/// Turns the two raw payloads into snapshot records.
pub fn snapshot_from_payloads(bootstrap_raw: &str, fixtures_raw: &str) -> Result<FetchedSnapshot> {
    let bootstrap = parse_bootstrap_json(bootstrap_raw)?;
    let fixtures = parse_fixtures_json(fixtures_raw)?;
    let difficulty = next_three_difficulty(&fixtures);

    let team_mismatches =
        teams::table_mismatches(bootstrap.teams.iter().map(|t| (t.id, t.name.as_str())));
    for line in &team_mismatches {
        warn!("team table: {line}");
    }

    let records = build_records(&bootstrap, &difficulty);
    Ok(FetchedSnapshot {
        records,
        team_mismatches,
    })
}

pub fn fetch_snapshot() -> Result<FetchedSnapshot> {
    let client = http_client()?;
    info!("fetching FPL player data");
    let bootstrap_raw = fetch_cached(client, BOOTSTRAP_URL, CACHE_MAX_AGE_SECS)?;
    info!("fetching FPL fixtures");
    let fixtures_raw = fetch_cached(client, FIXTURES_URL, CACHE_MAX_AGE_SECS)?;
    snapshot_from_payloads(&bootstrap_raw, &fixtures_raw)
}
