use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ScoreError};
use crate::features::feature_names;
use crate::player::PositionClass;

/// Zero-mean/unit-variance transform with frozen parameters.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, raw: &[f64]) -> Vec<f64>;
    fn n_features(&self) -> usize;
}

/// Learned scoring function over a scaled feature vector.
pub trait PointsRegressor: Send + Sync {
    fn predict(&self, scaled: &[f64]) -> f64;
    fn n_features(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .enumerate()
            .map(|(idx, x)| {
                let mean = self.mean.get(idx).copied().unwrap_or(0.0);
                let scale = self.scale.get(idx).copied().unwrap_or(1.0);
                // Constant columns are fitted with scale 0; leave them centred only.
                let scale = if scale.abs() < 1e-12 { 1.0 } else { scale };
                (x - mean) / scale
            })
            .collect()
    }

    fn n_features(&self) -> usize {
        self.mean.len()
    }
}

/// One regression tree in flat array form. Node 0 is the root; `-1` in
/// `children_left` marks a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    pub fn leaf(value: f64) -> Self {
        Self {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
        }
    }

    /// Checks the invariants `predict` relies on: consistent lengths, children
    /// pointing forward inside the array, split features in range.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.value.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(format!(
                "array lengths differ (left {}, right {}, feature {}, threshold {}, value {})",
                self.children_left.len(),
                self.children_right.len(),
                self.feature.len(),
                self.threshold.len(),
                n
            ));
        }
        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left == -1 && right == -1 {
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {node} splits on feature {feature}"));
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            let v = x.get(feature).copied().unwrap_or(0.0);
            node = if v <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl PointsRegressor for ForestRegressor {
    fn predict(&self, scaled: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(scaled)).sum();
        sum / self.trees.len() as f64
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    #[serde(default)]
    pub intercept: f64,
    pub coeffs: Vec<f64>,
}

impl PointsRegressor for LinearRegressor {
    fn predict(&self, scaled: &[f64]) -> f64 {
        self.intercept
            + self
                .coeffs
                .iter()
                .zip(scaled)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    fn n_features(&self) -> usize {
        self.coeffs.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Forest(ForestRegressor),
    Linear(LinearRegressor),
}

impl RegressorArtifact {
    pub fn into_regressor(self) -> Box<dyn PointsRegressor> {
        match self {
            Self::Forest(f) => Box::new(f),
            Self::Linear(l) => Box::new(l),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub regressor: RegressorArtifact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    pub defensive: PipelineArtifact,
    pub attacking: PipelineArtifact,
}

impl PipelineArtifact {
    pub fn validate(&self, class: PositionClass) -> Result<(), ModelError> {
        let expected = feature_names(class);
        if self.feature_names.len() != expected.len()
            || self
                .feature_names
                .iter()
                .zip(expected)
                .any(|(found, want)| found != want)
        {
            return Err(ModelError::FeatureOrder {
                class,
                expected: expected.iter().map(|s| s.to_string()).collect(),
                found: self.feature_names.clone(),
            });
        }

        let n = expected.len();
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Err(ModelError::ScalerShape {
                class,
                means: self.scaler.mean.len(),
                scales: self.scaler.scale.len(),
                features: n,
            });
        }

        match &self.regressor {
            RegressorArtifact::Linear(l) => {
                if l.coeffs.len() != n {
                    return Err(ModelError::LinearShape {
                        class,
                        coeffs: l.coeffs.len(),
                        features: n,
                    });
                }
            }
            RegressorArtifact::Forest(f) => {
                if f.trees.is_empty() {
                    return Err(ModelError::EmptyForest { class });
                }
                if f.n_features != n {
                    return Err(ModelError::InvalidTree {
                        class,
                        tree: 0,
                        message: format!("forest declares {} features, expected {n}", f.n_features),
                    });
                }
                for (idx, tree) in f.trees.iter().enumerate() {
                    tree.validate(n).map_err(|message| ModelError::InvalidTree {
                        class,
                        tree: idx,
                        message,
                    })?;
                }
            }
        }
        Ok(())
    }
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<(), ModelError> {
        self.defensive.validate(PositionClass::Defensive)?;
        self.attacking.validate(PositionClass::Attacking)?;
        Ok(())
    }
}

pub fn load_model_artifact(path: &Path) -> Result<ModelArtifact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read model artifact {}", path.display()))?;
    let artifact = serde_json::from_str::<ModelArtifact>(&raw)
        .with_context(|| format!("parse model artifact {}", path.display()))?;
    artifact
        .validate()
        .with_context(|| format!("validate model artifact {}", path.display()))?;
    Ok(artifact)
}

/// Scaler + regressor pair for one position class.
pub struct Pipeline {
    class: PositionClass,
    scaler: Box<dyn FeatureScaler>,
    regressor: Box<dyn PointsRegressor>,
}

impl Pipeline {
    pub fn new(
        class: PositionClass,
        scaler: Box<dyn FeatureScaler>,
        regressor: Box<dyn PointsRegressor>,
    ) -> Self {
        Self {
            class,
            scaler,
            regressor,
        }
    }

    pub fn from_artifact(class: PositionClass, artifact: PipelineArtifact) -> Self {
        Self::new(
            class,
            Box::new(artifact.scaler),
            artifact.regressor.into_regressor(),
        )
    }

    pub fn class(&self) -> PositionClass {
        self.class
    }

    pub fn score(&self, raw: &[f64]) -> Result<f64, ScoreError> {
        let expected = self.scaler.n_features();
        if raw.len() != expected || self.regressor.n_features() != expected {
            return Err(ScoreError::FeatureCount {
                class: self.class,
                expected,
                actual: raw.len(),
            });
        }
        let scaled = self.scaler.transform(raw);
        let points = self.regressor.predict(&scaled);
        if !points.is_finite() {
            return Err(ScoreError::NonFinite { class: self.class });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> RegressionTree {
        // x[0] <= 0.0 -> 1.0 else 3.0
        RegressionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.0, -2.0, -2.0],
            value: vec![2.0, 1.0, 3.0],
        }
    }

    #[test]
    fn scaler_standardizes_and_tolerates_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![5.0, 2.0],
            scale: vec![2.0, 0.0],
        };
        assert_eq!(scaler.transform(&[9.0, 3.0]), vec![2.0, 1.0]);
    }

    #[test]
    fn tree_routes_on_threshold_inclusive_left() {
        let tree = stump();
        assert_eq!(tree.predict(&[0.0]), 1.0);
        assert_eq!(tree.predict(&[-4.0]), 1.0);
        assert_eq!(tree.predict(&[0.1]), 3.0);
    }

    #[test]
    fn forest_averages_trees() {
        let forest = ForestRegressor {
            n_features: 1,
            trees: vec![stump(), RegressionTree::leaf(5.0)],
        };
        assert_eq!(forest.predict(&[1.0]), 4.0);
        assert_eq!(forest.predict(&[-1.0]), 3.0);
    }

    #[test]
    fn tree_validation_rejects_backward_children() {
        let mut tree = stump();
        tree.children_right[0] = 0;
        assert!(tree.validate(1).is_err());

        let mut tree = stump();
        tree.feature[0] = 3;
        assert!(tree.validate(1).is_err());

        let mut tree = stump();
        tree.value.pop();
        assert!(tree.validate(1).is_err());

        assert!(stump().validate(1).is_ok());
    }

    #[test]
    fn pipeline_validation_checks_feature_order() {
        let mut names: Vec<String> = feature_names(PositionClass::Defensive)
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.swap(3, 4);
        let pipeline = PipelineArtifact {
            feature_names: names,
            scaler: StandardScaler {
                mean: vec![0.0; 5],
                scale: vec![1.0; 5],
            },
            regressor: RegressorArtifact::Linear(LinearRegressor {
                intercept: 0.0,
                coeffs: vec![0.0; 5],
            }),
        };
        assert!(matches!(
            pipeline.validate(PositionClass::Defensive),
            Err(ModelError::FeatureOrder { .. })
        ));
    }

    #[test]
    fn pipeline_reports_arity_and_non_finite() {
        let pipeline = Pipeline::new(
            PositionClass::Attacking,
            Box::new(StandardScaler {
                mean: vec![0.0; 2],
                scale: vec![1.0; 2],
            }),
            Box::new(LinearRegressor {
                intercept: 0.0,
                coeffs: vec![1.0, 1.0],
            }),
        );
        assert_eq!(pipeline.score(&[1.0, 2.0]), Ok(3.0));
        assert_eq!(
            pipeline.score(&[1.0]),
            Err(ScoreError::FeatureCount {
                class: PositionClass::Attacking,
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            pipeline.score(&[f64::INFINITY, 1.0]),
            Err(ScoreError::NonFinite {
                class: PositionClass::Attacking
            })
        );
    }
}
