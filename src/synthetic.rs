//! Seeded synthetic player tables and a matching linear model, for the
//! `--demo` mode, benchmarks and randomized tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::features::{ATTACKING_FEATURE_NAMES, DEFENSIVE_FEATURE_NAMES};
use crate::model::{
    LinearRegressor, ModelArtifact, PipelineArtifact, RegressorArtifact, StandardScaler,
};
use crate::player::PlayerRecord;
use crate::teams::TEAM_NAMES;

const SURNAMES: [&str; 16] = [
    "Adeyemi", "Barros", "Castell", "Dunmore", "Eriksen", "Fofana", "Gallagher", "Hale",
    "Ibarra", "Jansen", "Kovac", "Lindqvist", "Mensah", "Novak", "Okafor", "Pereira",
];

pub fn synthetic_records(count: usize, seed: u64) -> Vec<PlayerRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            // Roughly the real squad mix: 2 GK, 5 DEF, 5 MID, 3 FWD per 15.
            let element_type = match idx % 15 {
                0 | 1 => 1,
                2..=6 => 2,
                7..=11 => 3,
                _ => 4,
            };
            let attacking = element_type >= 3;
            let minutes = rng.gen_range(0.0..2700.0_f64).round();
            let games = (minutes / 90.0).max(1.0);
            PlayerRecord {
                id: idx as u32 + 1,
                web_name: format!("{} {}", SURNAMES[idx % SURNAMES.len()], idx + 1),
                team: rng.gen_range(1..=TEAM_NAMES.len() as u32),
                element_type,
                now_cost: rng.gen_range(40..=130),
                form: Some((rng.gen_range(0.0..9.0_f64) * 10.0).round() / 10.0),
                total_points: Some((rng.gen_range(0.0..8.0_f64) * games).round()),
                threat: Some(if attacking {
                    rng.gen_range(0.0..900.0_f64).round()
                } else {
                    rng.gen_range(0.0..120.0_f64).round()
                }),
                expected_goals: Some(if attacking {
                    rng.gen_range(0.0..0.6_f64) * games
                } else {
                    rng.gen_range(0.0..0.08_f64) * games
                }),
                expected_assists: Some(rng.gen_range(0.0..0.3_f64) * games),
                clean_sheets: Some((rng.gen_range(0.0..0.45_f64) * games).floor()),
                saves: Some(if element_type == 1 {
                    (rng.gen_range(1.0..4.0_f64) * games).floor()
                } else {
                    0.0
                }),
                minutes: Some(minutes),
                next_3_gw_fixtures: Some(
                    (rng.gen_range(2.0..4.5_f64) * 100.0).round() / 100.0,
                ),
            }
        })
        .collect()
}

/// Linear pipelines with hand-picked weights, standardized around the
/// ranges `synthetic_records` draws from.
pub fn synthetic_model_artifact() -> ModelArtifact {
    ModelArtifact {
        version: 1,
        generated_at: "synthetic".to_string(),
        source: Some("synthetic".to_string()),
        defensive: PipelineArtifact {
            feature_names: owned_names(&DEFENSIVE_FEATURE_NAMES),
            scaler: StandardScaler {
                mean: vec![5.0, 4.5, 3.25, 3.0, 10.0],
                scale: vec![1.0, 2.6, 0.7, 3.0, 25.0],
            },
            regressor: RegressorArtifact::Linear(LinearRegressor {
                intercept: 6.0,
                coeffs: vec![0.8, 2.2, -0.9, 1.1, 0.4],
            }),
        },
        attacking: PipelineArtifact {
            feature_names: owned_names(&ATTACKING_FEATURE_NAMES),
            scaler: StandardScaler {
                mean: vec![7.5, 4.5, 3.25, 4.0, 2.5, 400.0],
                scale: vec![2.5, 2.6, 0.7, 4.0, 2.5, 260.0],
            },
            regressor: RegressorArtifact::Linear(LinearRegressor {
                intercept: 7.0,
                coeffs: vec![1.0, 2.4, -1.2, 1.6, 0.9, 0.7],
            }),
        },
    }
}

fn owned_names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}
