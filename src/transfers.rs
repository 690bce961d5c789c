use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{SkipReason, SkippedPlayer};
use crate::player::{Player, PlayerCatalog, Position};
use crate::predictor::PointPredictor;
use crate::squad::{PlayerSummary, resolve_squad};

/// Upgrades at or below this many points are not worth a transfer.
pub const MIN_POINTS_GAIN: f64 = 0.5;
/// Collect this many times the requested count before the final re-rank.
pub const OVERSAMPLE_FACTOR: usize = 2;
// Costs are tenths divided by ten; absorb float noise in `cost + budget`.
const COST_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub outgoing: PlayerSummary,
    pub incoming: PlayerSummary,
    pub points_gain: f64,
    pub cost_change: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TransferPlan {
    pub suggestions: Vec<Suggestion>,
    pub skipped: Vec<SkippedPlayer>,
    /// Available players dropped from the candidate pool because scoring failed.
    pub unscored_pool: usize,
}

#[derive(Debug, Clone, Copy)]
struct Scored<'a> {
    player: &'a Player,
    points: f64,
}

impl Suggestion {
    fn new(outgoing: Scored<'_>, incoming: Scored<'_>) -> Self {
        Self {
            points_gain: incoming.points - outgoing.points,
            cost_change: incoming.player.cost - outgoing.player.cost,
            outgoing: PlayerSummary::new(outgoing.player, outgoing.points),
            incoming: PlayerSummary::new(incoming.player, incoming.points),
        }
    }
}

/// Greedy single-step upgrade search.
///
/// Squad players are visited weakest first. Each one is paired with the
/// highest scoring available player of the same position that it can afford
/// (`incoming.cost <= outgoing.cost + budget`) and that beats it by more than
/// [`MIN_POINTS_GAIN`]. An incoming player is used at most once per plan.
/// Affordability is checked per substitution, not against a squad total.
/// A non-finite budget affords nothing and yields an empty plan.
pub fn recommend_transfers(
    catalog: &PlayerCatalog,
    predictor: &PointPredictor,
    squad_ids: &[u32],
    budget: f64,
    free_transfers: usize,
) -> TransferPlan {
    if squad_ids.is_empty() || free_transfers == 0 {
        return TransferPlan::default();
    }
    if !budget.is_finite() {
        warn!("refusing transfer search with non-finite budget {budget}");
        return TransferPlan::default();
    }

    let (found, mut skipped) = resolve_squad(catalog, squad_ids);
    let mut squad: Vec<Scored<'_>> = Vec::with_capacity(found.len());
    for (player, scored) in predictor.predict_many(&found) {
        match scored {
            Ok(points) => squad.push(Scored { player, points }),
            Err(error) => skipped.push(SkippedPlayer {
                id: player.id,
                reason: SkipReason::ScoringFailed { error },
            }),
        }
    }

    let owned: HashSet<u32> = squad_ids.iter().copied().collect();
    let available: Vec<&Player> = catalog
        .players()
        .iter()
        .filter(|p| !owned.contains(&p.id))
        .collect();

    let mut unscored_pool = 0usize;
    let mut pool: HashMap<Position, Vec<Scored<'_>>> = HashMap::new();
    for (player, scored) in predictor.predict_many(&available) {
        match scored {
            Ok(points) => pool
                .entry(player.position)
                .or_default()
                .push(Scored { player, points }),
            Err(error) => {
                debug!("available player {} not scored: {error}", player.id);
                unscored_pool += 1;
            }
        }
    }

    squad.sort_by(|a, b| a.points.total_cmp(&b.points));

    let limit = free_transfers.saturating_mul(OVERSAMPLE_FACTOR);
    let mut used_incoming: HashSet<u32> = HashSet::new();
    let mut suggestions: Vec<Suggestion> = Vec::new();

    for outgoing in &squad {
        if suggestions.len() >= limit {
            break;
        }
        let Some(candidates) = pool.get(&outgoing.player.position) else {
            continue;
        };
        let max_cost = outgoing.player.cost + budget + COST_EPSILON;

        let mut best: Option<&Scored<'_>> = None;
        for candidate in candidates {
            if used_incoming.contains(&candidate.player.id) {
                continue;
            }
            if candidate.player.cost > max_cost {
                continue;
            }
            if candidate.points - outgoing.points <= MIN_POINTS_GAIN {
                continue;
            }
            if best.is_none_or(|b| candidate.points > b.points) {
                best = Some(candidate);
            }
        }

        if let Some(incoming) = best {
            used_incoming.insert(incoming.player.id);
            suggestions.push(Suggestion::new(*outgoing, *incoming));
        }
    }

    suggestions.sort_by(|a, b| b.points_gain.total_cmp(&a.points_gain));
    suggestions.truncate(free_transfers);

    debug!(
        "recommended {} transfers from {} squad players ({} skipped)",
        suggestions.len(),
        squad.len(),
        skipped.len()
    );

    TransferPlan {
        suggestions,
        skipped,
        unscored_pool,
    }
}
