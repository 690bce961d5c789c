use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::info;

use crate::catalog_store;
use crate::config::EngineConfig;
use crate::model::{self, ModelArtifact};
use crate::player::{PlayerCatalog, PlayerRecord};
use crate::predictor::PointPredictor;
use crate::squad::{self, SquadAnalysis};
use crate::transfers::{self, TransferPlan};

/// Immutable service context: one catalog snapshot plus one frozen model.
/// Cloning shares both.
#[derive(Clone)]
pub struct Engine {
    catalog: Arc<PlayerCatalog>,
    predictor: Arc<PointPredictor>,
}

impl Engine {
    pub fn new(catalog: PlayerCatalog, predictor: PointPredictor) -> Self {
        Self {
            catalog: Arc::new(catalog),
            predictor: Arc::new(predictor),
        }
    }

    /// Builds an engine from in-memory inputs. Any configuration fault
    /// (invalid model, no usable players) is returned as an error.
    pub fn from_parts(records: Vec<PlayerRecord>, artifact: ModelArtifact) -> Result<Self> {
        artifact.validate().context("invalid model artifact")?;
        let total = records.len();
        let catalog = PlayerCatalog::from_records(records);
        if catalog.is_empty() {
            bail!("player snapshot has no usable players ({total} records)");
        }
        info!(
            "catalog ready: {} players, {} rejected",
            catalog.len(),
            catalog.rejected().len()
        );
        Ok(Self::new(catalog, PointPredictor::from_artifact(artifact)))
    }

    /// Startup path. Errors here are fatal: the engine is never built from a
    /// missing or malformed snapshot or model.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let records = catalog_store::load_records(&config.snapshot_path)?;
        info!(
            "loaded {} player records from {}",
            records.len(),
            config.snapshot_path.display()
        );
        let artifact = model::load_model_artifact(&config.model_path)?;
        info!(
            "loaded model artifact v{} ({}) from {}",
            artifact.version,
            artifact.generated_at,
            config.model_path.display()
        );
        Self::from_parts(records, artifact)
            .with_context(|| format!("snapshot {}", config.snapshot_path.display()))
    }

    pub fn catalog(&self) -> &PlayerCatalog {
        &self.catalog
    }

    pub fn predictor(&self) -> &PointPredictor {
        &self.predictor
    }

    pub fn analyze_squad(&self, squad_ids: &[u32]) -> SquadAnalysis {
        squad::analyze_squad(&self.catalog, &self.predictor, squad_ids)
    }

    pub fn recommend_transfers(
        &self,
        squad_ids: &[u32],
        budget: f64,
        free_transfers: usize,
    ) -> TransferPlan {
        transfers::recommend_transfers(
            &self.catalog,
            &self.predictor,
            squad_ids,
            budget,
            free_transfers,
        )
    }
}
