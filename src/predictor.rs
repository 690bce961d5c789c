use rayon::prelude::*;

use crate::error::ScoreError;
use crate::features::feature_vector;
use crate::model::{ModelArtifact, Pipeline};
use crate::player::{Player, PositionClass};

/// Expected points over the next three gameweeks, one pipeline per class.
pub struct PointPredictor {
    defensive: Pipeline,
    attacking: Pipeline,
}

impl PointPredictor {
    pub fn new(defensive: Pipeline, attacking: Pipeline) -> Self {
        debug_assert_eq!(defensive.class(), PositionClass::Defensive);
        debug_assert_eq!(attacking.class(), PositionClass::Attacking);
        Self {
            defensive,
            attacking,
        }
    }

    /// Caller is expected to have validated the artifact.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self::new(
            Pipeline::from_artifact(PositionClass::Defensive, artifact.defensive),
            Pipeline::from_artifact(PositionClass::Attacking, artifact.attacking),
        )
    }

    fn pipeline(&self, class: PositionClass) -> &Pipeline {
        match class {
            PositionClass::Defensive => &self.defensive,
            PositionClass::Attacking => &self.attacking,
        }
    }

    pub fn predict(&self, player: &Player) -> Result<f64, ScoreError> {
        self.pipeline(player.class()).score(&feature_vector(player))
    }

    /// Scores a batch in parallel. Output order matches input order and one
    /// failure never affects the other rows.
    pub fn predict_many<'a>(
        &self,
        players: &[&'a Player],
    ) -> Vec<(&'a Player, Result<f64, ScoreError>)> {
        players
            .par_iter()
            .map(|p| (*p, self.predict(p)))
            .collect()
    }
}
