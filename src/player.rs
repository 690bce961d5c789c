use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, SkipReason};
use crate::teams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

/// Prediction group. Each class has its own feature set and model pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionClass {
    Defensive,
    Attacking,
}

impl Position {
    pub fn from_code(code: u8) -> Result<Self, RecordError> {
        match code {
            1 => Ok(Self::Goalkeeper),
            2 => Ok(Self::Defender),
            3 => Ok(Self::Midfielder),
            4 => Ok(Self::Forward),
            _ => Err(RecordError::UnknownPosition { code }),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Goalkeeper => 1,
            Self::Defender => 2,
            Self::Midfielder => 3,
            Self::Forward => 4,
        }
    }

    pub fn class(self) -> PositionClass {
        match self {
            Self::Goalkeeper | Self::Defender => PositionClass::Defensive,
            Self::Midfielder | Self::Forward => PositionClass::Attacking,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Self::Goalkeeper => "GKP",
            Self::Defender => "DEF",
            Self::Midfielder => "MID",
            Self::Forward => "FWD",
        }
    }
}

impl fmt::Display for PositionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defensive => f.write_str("defensive"),
            Self::Attacking => f.write_str("attacking"),
        }
    }
}

/// One row of the flat player table, shaped like the FPL feed.
/// `now_cost` stays in tenths here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub web_name: String,
    pub team: u32,
    pub element_type: u8,
    pub now_cost: i64,
    #[serde(default)]
    pub form: Option<f64>,
    #[serde(default)]
    pub total_points: Option<f64>,
    #[serde(default)]
    pub threat: Option<f64>,
    #[serde(default)]
    pub expected_goals: Option<f64>,
    #[serde(default)]
    pub expected_assists: Option<f64>,
    #[serde(default)]
    pub clean_sheets: Option<f64>,
    #[serde(default)]
    pub saves: Option<f64>,
    #[serde(default)]
    pub minutes: Option<f64>,
    #[serde(default)]
    pub next_3_gw_fixtures: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: u32,
    pub display_name: String,
    pub team_id: u32,
    pub team_name: &'static str,
    pub position: Position,
    /// Whole units (feed tenths / 10).
    pub cost: f64,
    pub form: Option<f64>,
    pub total_points: Option<f64>,
    pub threat: Option<f64>,
    pub expected_goals: Option<f64>,
    pub expected_assists: Option<f64>,
    pub clean_sheets: Option<f64>,
    pub saves: Option<f64>,
    pub minutes: Option<f64>,
    pub fixture_difficulty_next_3: Option<f64>,
}

impl Player {
    pub fn from_record(record: PlayerRecord) -> Result<Self, RecordError> {
        let position = Position::from_code(record.element_type)?;
        let team_name = teams::team_name(record.team)?;
        Ok(Self {
            id: record.id,
            display_name: record.web_name,
            team_id: record.team,
            team_name,
            position,
            cost: record.now_cost as f64 / 10.0,
            form: record.form,
            total_points: record.total_points,
            threat: record.threat,
            expected_goals: record.expected_goals,
            expected_assists: record.expected_assists,
            clean_sheets: record.clean_sheets,
            saves: record.saves,
            minutes: record.minutes,
            fixture_difficulty_next_3: record.next_3_gw_fixtures,
        })
    }

    pub fn class(&self) -> PositionClass {
        self.position.class()
    }
}

/// Immutable in-memory player table. Players are kept in id order, which is
/// also the tie-break order used when ranking candidates.
#[derive(Debug, Clone, Default)]
pub struct PlayerCatalog {
    players: Vec<Player>,
    index: HashMap<u32, usize>,
    rejected: HashMap<u32, RecordError>,
}

impl PlayerCatalog {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PlayerRecord>,
    {
        let mut players: Vec<Player> = Vec::new();
        let mut rejected = HashMap::new();

        for record in records {
            let id = record.id;
            match Player::from_record(record) {
                Ok(player) => players.push(player),
                Err(err) => {
                    warn!("rejecting player {id}: {err}");
                    rejected.insert(id, err);
                }
            }
        }

        players.sort_by_key(|p| p.id);
        let before = players.len();
        players.dedup_by_key(|p| p.id);
        if players.len() != before {
            warn!(
                "dropped {} duplicate player rows from snapshot",
                before - players.len()
            );
        }

        let index = players
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id, idx))
            .collect();
        Self {
            players,
            index,
            rejected,
        }
    }

    pub fn get(&self, id: u32) -> Option<&Player> {
        self.index.get(&id).map(|idx| &self.players[*idx])
    }

    /// Like `get`, but explains a miss.
    pub fn lookup(&self, id: u32) -> Result<&Player, SkipReason> {
        if let Some(player) = self.get(id) {
            return Ok(player);
        }
        match self.rejected.get(&id) {
            Some(error) => Err(SkipReason::InvalidRecord {
                error: error.clone(),
            }),
            None => Err(SkipReason::NotInCatalog),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn rejected(&self) -> &HashMap<u32, RecordError> {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, element_type: u8, team: u32) -> PlayerRecord {
        PlayerRecord {
            id,
            web_name: format!("P{id}"),
            team,
            element_type,
            now_cost: 55,
            form: Some(3.0),
            total_points: None,
            threat: None,
            expected_goals: None,
            expected_assists: None,
            clean_sheets: None,
            saves: None,
            minutes: None,
            next_3_gw_fixtures: None,
        }
    }

    #[test]
    fn position_codes_map_to_fixed_classes() {
        for code in [1u8, 2] {
            assert_eq!(
                Position::from_code(code).unwrap().class(),
                PositionClass::Defensive
            );
        }
        for code in [3u8, 4] {
            assert_eq!(
                Position::from_code(code).unwrap().class(),
                PositionClass::Attacking
            );
        }
        assert_eq!(
            Position::from_code(0),
            Err(RecordError::UnknownPosition { code: 0 })
        );
        assert_eq!(
            Position::from_code(5),
            Err(RecordError::UnknownPosition { code: 5 })
        );
    }

    #[test]
    fn cost_is_normalized_from_tenths() {
        let player = Player::from_record(record(1, 2, 3)).unwrap();
        assert!((player.cost - 5.5).abs() < 1e-12);
        assert_eq!(player.team_name, "Bournemouth");
    }

    #[test]
    fn catalog_keeps_rejections_observable() {
        let catalog =
            PlayerCatalog::from_records(vec![record(3, 3, 1), record(1, 9, 1), record(2, 1, 42)]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(3).is_some());
        assert_eq!(
            catalog.lookup(1).unwrap_err(),
            SkipReason::InvalidRecord {
                error: RecordError::UnknownPosition { code: 9 }
            }
        );
        assert_eq!(
            catalog.lookup(2).unwrap_err(),
            SkipReason::InvalidRecord {
                error: RecordError::UnknownTeam { team_id: 42 }
            }
        );
        assert_eq!(catalog.lookup(99).unwrap_err(), SkipReason::NotInCatalog);
    }

    #[test]
    fn catalog_orders_by_id_and_drops_duplicates() {
        let catalog =
            PlayerCatalog::from_records(vec![record(5, 3, 1), record(2, 3, 1), record(5, 4, 1)]);
        let ids: Vec<u32> = catalog.players().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 5]);
        assert_eq!(catalog.get(5).unwrap().position, Position::Midfielder);
    }
}
