use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::error::{SkipReason, SkippedPlayer};
use crate::player::{Player, PlayerCatalog, Position};
use crate::predictor::PointPredictor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: u32,
    pub display_name: String,
    pub cost: f64,
    pub predicted_points: f64,
    pub position: Position,
    pub team_name: &'static str,
}

impl PlayerSummary {
    pub fn new(player: &Player, predicted_points: f64) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name.clone(),
            cost: player.cost,
            predicted_points,
            position: player.position,
            team_name: player.team_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SquadAnalysis {
    pub players: Vec<PlayerSummary>,
    pub skipped: Vec<SkippedPlayer>,
}

/// Resolve requested ids against the catalog, keeping input order.
/// Repeats and misses are recorded, never fatal.
pub(crate) fn resolve_squad<'a>(
    catalog: &'a PlayerCatalog,
    squad_ids: &[u32],
) -> (Vec<&'a Player>, Vec<SkippedPlayer>) {
    let mut seen = HashSet::with_capacity(squad_ids.len());
    let mut found = Vec::with_capacity(squad_ids.len());
    let mut skipped = Vec::new();

    for &id in squad_ids {
        if !seen.insert(id) {
            skipped.push(SkippedPlayer {
                id,
                reason: SkipReason::Duplicate,
            });
            continue;
        }
        match catalog.lookup(id) {
            Ok(player) => found.push(player),
            Err(reason) => {
                debug!("squad player {id} skipped: {reason}");
                skipped.push(SkippedPlayer { id, reason });
            }
        }
    }
    (found, skipped)
}

/// Expected points for every resolvable player in the squad.
pub fn analyze_squad(
    catalog: &PlayerCatalog,
    predictor: &PointPredictor,
    squad_ids: &[u32],
) -> SquadAnalysis {
    let (found, mut skipped) = resolve_squad(catalog, squad_ids);
    let mut players = Vec::with_capacity(found.len());

    for (player, scored) in predictor.predict_many(&found) {
        match scored {
            Ok(points) => players.push(PlayerSummary::new(player, points)),
            Err(error) => {
                debug!("squad player {} not scored: {error}", player.id);
                skipped.push(SkippedPlayer {
                    id: player.id,
                    reason: SkipReason::ScoringFailed { error },
                });
            }
        }
    }

    SquadAnalysis { players, skipped }
}
