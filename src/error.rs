use serde::Serialize;
use thiserror::Error;

use crate::player::PositionClass;

/// Data-integrity faults found while turning a snapshot record into a catalog player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("unknown position code {code}")]
    UnknownPosition { code: u8 },
    #[error("unknown team id {team_id}")]
    UnknownTeam { team_id: u32 },
}

/// Failure while scoring a single player. Never aborts a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreError {
    #[error("{class} pipeline expects {expected} features, got {actual}")]
    FeatureCount {
        class: PositionClass,
        expected: usize,
        actual: usize,
    },
    #[error("{class} pipeline produced a non-finite score")]
    NonFinite { class: PositionClass },
}

/// Structural problems in a model artifact. Always a configuration fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{class} feature order mismatch: expected {expected:?}, found {found:?}")]
    FeatureOrder {
        class: PositionClass,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("{class} scaler has {means} means and {scales} scales for {features} features")]
    ScalerShape {
        class: PositionClass,
        means: usize,
        scales: usize,
        features: usize,
    },
    #[error("{class} linear regressor has {coeffs} coefficients for {features} features")]
    LinearShape {
        class: PositionClass,
        coeffs: usize,
        features: usize,
    },
    #[error("{class} forest has no trees")]
    EmptyForest { class: PositionClass },
    #[error("{class} tree {tree}: {message}")]
    InvalidTree {
        class: PositionClass,
        tree: usize,
        message: String,
    },
}

/// Rejection of one incoming request. Process state is unaffected.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("budget must be a finite number, got {0}")]
    InvalidBudget(f64),
    #[error("invalid player id {0:?}")]
    InvalidPlayerId(String),
    #[error("missing required argument {0}")]
    MissingArgument(&'static str),
    #[error("invalid value {value:?} for {name}")]
    InvalidArgument { name: &'static str, value: String },
}

/// Why a requested squad id produced no output row.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("player is not in the catalog")]
    NotInCatalog,
    #[error("player record rejected: {error}")]
    InvalidRecord { error: RecordError },
    #[error("scoring failed: {error}")]
    ScoringFailed { error: ScoreError },
    #[error("player id repeated in request")]
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPlayer {
    pub id: u32,
    #[serde(flatten)]
    pub reason: SkipReason,
}
