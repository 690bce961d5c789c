use std::collections::HashSet;

use fpl_improver::Engine;
use fpl_improver::error::SkipReason;
use fpl_improver::features::{ATTACKING_FEATURE_NAMES, DEFENSIVE_FEATURE_NAMES};
use fpl_improver::model::{
    LinearRegressor, ModelArtifact, PipelineArtifact, RegressorArtifact, StandardScaler,
};
use fpl_improver::player::PlayerRecord;
use fpl_improver::synthetic::{synthetic_model_artifact, synthetic_records};
use fpl_improver::transfers::MIN_POINTS_GAIN;

const GK: u8 = 1;
const DEF: u8 = 2;
const MID: u8 = 3;
const FWD: u8 = 4;

/// Predicted points equal the player's form.
fn form_pipeline(names: &[&str]) -> PipelineArtifact {
    let n = names.len();
    let mut coeffs = vec![0.0; n];
    coeffs[1] = 1.0;
    PipelineArtifact {
        feature_names: names.iter().map(|s| s.to_string()).collect(),
        scaler: StandardScaler {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        },
        regressor: RegressorArtifact::Linear(LinearRegressor {
            intercept: 0.0,
            coeffs,
        }),
    }
}

fn form_model() -> ModelArtifact {
    ModelArtifact {
        version: 1,
        generated_at: "test".to_string(),
        source: None,
        defensive: form_pipeline(&DEFENSIVE_FEATURE_NAMES),
        attacking: form_pipeline(&ATTACKING_FEATURE_NAMES),
    }
}

fn player(id: u32, element_type: u8, now_cost: i64, points: f64) -> PlayerRecord {
    PlayerRecord {
        id,
        web_name: format!("Player {id}"),
        team: (id % 20) + 1,
        element_type,
        now_cost,
        form: Some(points),
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

fn engine(records: Vec<PlayerRecord>) -> Engine {
    Engine::from_parts(records, form_model()).expect("engine should build")
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn upgrades_a_defender_within_budget() {
    let engine = engine(vec![
        player(1, DEF, 45, 2.0),
        player(2, DEF, 50, 3.0),
        player(3, MID, 40, 10.0),
    ]);

    let plan = engine.recommend_transfers(&[1], 1.0, 1);
    assert_eq!(plan.suggestions.len(), 1);
    let s = &plan.suggestions[0];
    assert_eq!(s.outgoing.id, 1);
    assert_eq!(s.incoming.id, 2);
    assert!(approx(s.points_gain, 1.0));
    assert!(approx(s.cost_change, 0.5));
    assert!(plan.skipped.is_empty());
}

#[test]
fn small_gains_are_not_suggested() {
    let engine = engine(vec![player(1, MID, 50, 4.0), player(2, MID, 50, 4.3)]);
    let plan = engine.recommend_transfers(&[1], 0.0, 1);
    assert!(plan.suggestions.is_empty());
}

#[test]
fn gain_threshold_is_strict() {
    let engine = engine(vec![player(1, MID, 50, 4.0), player(2, MID, 50, 4.5)]);
    assert!(engine.recommend_transfers(&[1], 0.0, 1).suggestions.is_empty());
}

#[test]
fn empty_squad_or_no_transfers_gives_empty_plan() {
    let engine = engine(vec![player(1, FWD, 60, 1.0), player(2, FWD, 60, 9.0)]);
    assert!(engine.recommend_transfers(&[], 5.0, 3).suggestions.is_empty());
    assert!(engine.recommend_transfers(&[1], 5.0, 0).suggestions.is_empty());
}

#[test]
fn non_finite_budget_affords_nothing() {
    let engine = Engine::from_parts(synthetic_records(300, 5), synthetic_model_artifact()).unwrap();
    let squad: Vec<u32> = (0..15).map(|i| 1 + i * 19).collect();
    assert!(!engine.recommend_transfers(&squad, 1.0, 3).suggestions.is_empty());

    for budget in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let plan = engine.recommend_transfers(&squad, budget, 3);
        assert!(plan.suggestions.is_empty(), "budget {budget}");
    }
}

#[test]
fn unaffordable_candidates_are_passed_over() {
    let engine = engine(vec![
        player(1, FWD, 60, 2.0),
        player(2, FWD, 90, 12.0),
        player(3, FWD, 70, 5.0),
    ]);
    let plan = engine.recommend_transfers(&[1], 1.0, 1);
    assert_eq!(plan.suggestions.len(), 1);
    assert_eq!(plan.suggestions[0].incoming.id, 3);

    // Exactly on the limit is affordable.
    let plan = engine.recommend_transfers(&[1], 3.0, 1);
    assert_eq!(plan.suggestions[0].incoming.id, 2);
}

#[test]
fn negative_budget_requires_a_cheaper_replacement() {
    let engine = engine(vec![
        player(1, MID, 80, 3.0),
        player(2, MID, 80, 9.0),
        player(3, MID, 65, 6.0),
    ]);
    let plan = engine.recommend_transfers(&[1], -1.0, 1);
    assert_eq!(plan.suggestions[0].incoming.id, 3);
    assert!(approx(plan.suggestions[0].cost_change, -1.5));
}

#[test]
fn weakest_player_claims_the_best_candidate_first() {
    let engine = engine(vec![
        player(1, DEF, 50, 1.0),
        player(2, DEF, 50, 2.0),
        player(3, DEF, 50, 5.0),
    ]);
    let plan = engine.recommend_transfers(&[2, 1], 0.0, 2);
    assert_eq!(plan.suggestions.len(), 1, "an incoming player is used once");
    assert_eq!(plan.suggestions[0].outgoing.id, 1);
    assert_eq!(plan.suggestions[0].incoming.id, 3);
}

#[test]
fn final_ranking_is_by_gain_not_by_visit_order() {
    let engine = engine(vec![
        player(1, DEF, 50, 1.0),
        player(2, MID, 80, 3.0),
        player(3, DEF, 50, 2.0),
        player(4, MID, 80, 9.0),
    ]);
    let plan = engine.recommend_transfers(&[1, 2], 0.0, 1);
    assert_eq!(plan.suggestions.len(), 1);
    assert_eq!(plan.suggestions[0].outgoing.id, 2);
    assert_eq!(plan.suggestions[0].incoming.id, 4);
    assert!(approx(plan.suggestions[0].points_gain, 6.0));

    let plan = engine.recommend_transfers(&[1, 2], 0.0, 2);
    let gains: Vec<f64> = plan.suggestions.iter().map(|s| s.points_gain).collect();
    assert_eq!(gains.len(), 2);
    assert!(approx(gains[0], 6.0) && approx(gains[1], 1.0));
}

#[test]
fn ties_go_to_the_lowest_id() {
    let engine = engine(vec![
        player(1, GK, 45, 1.0),
        player(7, GK, 45, 4.0),
        player(4, GK, 45, 4.0),
    ]);
    let plan = engine.recommend_transfers(&[1], 0.0, 1);
    assert_eq!(plan.suggestions[0].incoming.id, 4);
}

#[test]
fn squad_members_are_never_incoming() {
    let engine = engine(vec![player(1, DEF, 50, 1.0), player(2, DEF, 50, 6.0)]);
    let plan = engine.recommend_transfers(&[1, 2], 5.0, 2);
    assert!(plan.suggestions.is_empty());
}

#[test]
fn unknown_and_invalid_squad_ids_are_skipped() {
    let mut bad_position = player(5, DEF, 50, 1.0);
    bad_position.element_type = 7;
    let engine = engine(vec![player(1, DEF, 50, 1.0), player(2, DEF, 50, 4.0), bad_position]);

    let plan = engine.recommend_transfers(&[999, 5, 1, 1], 0.0, 1);
    assert_eq!(plan.suggestions.len(), 1);
    assert_eq!(plan.suggestions[0].outgoing.id, 1);

    let reasons: Vec<(u32, &SkipReason)> = plan.skipped.iter().map(|s| (s.id, &s.reason)).collect();
    assert_eq!(reasons.len(), 3);
    assert_eq!(reasons[0], (999, &SkipReason::NotInCatalog));
    assert!(matches!(reasons[1], (5, SkipReason::InvalidRecord { .. })));
    assert_eq!(reasons[2], (1, &SkipReason::Duplicate));
}

#[test]
fn plans_hold_invariants_over_synthetic_catalogs() {
    for seed in 1..=12u64 {
        let records = synthetic_records(300, seed);
        let engine = Engine::from_parts(records, synthetic_model_artifact()).unwrap();
        let catalog = engine.catalog();

        let squad: Vec<u32> = (0..15).map(|i| 1 + i * 19 + seed as u32).collect();
        let owned: HashSet<u32> = squad.iter().copied().collect();

        for (budget, free_transfers) in [(0.0, 1usize), (1.5, 2), (-0.5, 3), (4.0, 5)] {
            let plan = engine.recommend_transfers(&squad, budget, free_transfers);
            assert!(plan.suggestions.len() <= free_transfers);

            let mut outgoing = HashSet::new();
            let mut incoming = HashSet::new();
            for (idx, s) in plan.suggestions.iter().enumerate() {
                assert!(outgoing.insert(s.outgoing.id));
                assert!(incoming.insert(s.incoming.id));
                assert!(owned.contains(&s.outgoing.id));
                assert!(!owned.contains(&s.incoming.id));
                assert!(s.points_gain > MIN_POINTS_GAIN);
                assert!(s.incoming.cost <= s.outgoing.cost + budget + 1e-9);
                assert_eq!(s.incoming.position, s.outgoing.position);
                assert_eq!(
                    catalog.get(s.incoming.id).map(|p| p.position),
                    Some(s.incoming.position)
                );
                if idx > 0 {
                    assert!(plan.suggestions[idx - 1].points_gain >= s.points_gain);
                }
            }
        }
    }
}

#[test]
fn repeated_calls_give_identical_plans() {
    let engine = Engine::from_parts(synthetic_records(450, 3), synthetic_model_artifact()).unwrap();
    let squad: Vec<u32> = (1..=15).map(|i| i * 7).collect();
    let first = engine.recommend_transfers(&squad, 2.0, 3);
    let second = engine.clone().recommend_transfers(&squad, 2.0, 3);
    assert_eq!(first, second);
}
