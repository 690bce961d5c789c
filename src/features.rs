use crate::player::{Player, PositionClass};

/// Column order the defensive model was trained on. Never reorder.
pub const DEFENSIVE_FEATURE_NAMES: [&str; 5] = [
    "now_cost",
    "form",
    "next_3_gw_fixtures",
    "clean_sheets",
    "saves",
];

/// Column order the attacking model was trained on. Never reorder.
pub const ATTACKING_FEATURE_NAMES: [&str; 6] = [
    "now_cost",
    "form",
    "next_3_gw_fixtures",
    "expected_goals",
    "expected_assists",
    "threat",
];

pub fn feature_names(class: PositionClass) -> &'static [&'static str] {
    match class {
        PositionClass::Defensive => &DEFENSIVE_FEATURE_NAMES,
        PositionClass::Attacking => &ATTACKING_FEATURE_NAMES,
    }
}

/// Raw (unscaled) feature vector for the player's own class.
/// Absent statistics become 0.
pub fn feature_vector(player: &Player) -> Vec<f64> {
    let v = |x: Option<f64>| x.unwrap_or(0.0);
    match player.class() {
        PositionClass::Defensive => vec![
            player.cost,
            v(player.form),
            v(player.fixture_difficulty_next_3),
            v(player.clean_sheets),
            v(player.saves),
        ],
        PositionClass::Attacking => vec![
            player.cost,
            v(player.form),
            v(player.fixture_difficulty_next_3),
            v(player.expected_goals),
            v(player.expected_assists),
            v(player.threat),
        ],
    }
}
