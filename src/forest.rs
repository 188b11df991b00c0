//! Regression tree ensemble exported to JSON.
//!
//! Each tree is a flat node array rooted at index 0. A split sends a row left
//! when `row[feature] <= threshold`. Children always sit after their parent,
//! so every walk terminates. The forest predicts the mean of its trees.

use crate::errors::{RecommendError, RecommendResult};
use crate::matrix::FeatureMatrix;
use crate::oracle::{read_json, ScoringOracle};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {idx} splits on feature {feature} of {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return *value,
            }
        }
    }
}

/// Averaging ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestOracle {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl ForestOracle {
    pub fn new(n_features: usize, trees: Vec<RegressionTree>) -> RecommendResult<Self> {
        let forest = Self { n_features, trees };
        forest
            .validate()
            .map_err(|message| RecommendError::model_load("<memory>", message))?;
        Ok(forest)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RecommendResult<Self> {
        let forest: Self = read_json(path.as_ref())?;
        forest
            .validate()
            .map_err(|message| RecommendError::model_load(path.as_ref().display().to_string(), message))?;
        Ok(forest)
    }

    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("forest declares zero features".into());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        total / self.trees.len() as f64
    }
}

impl ScoringOracle for ForestOracle {
    fn name(&self) -> &str {
        "forest"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
        if batch.width() != self.n_features {
            return Err(RecommendError::oracle(
                self.name(),
                format!("expected {} inputs, got {}", self.n_features, batch.width()),
            ));
        }
        Ok(batch.iter_rows().map(|row| self.predict(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = ForestOracle::new(2, vec![stump(0, 0.5, 10.0, 20.0), stump(1, 0.5, 0.0, 40.0)])
            .unwrap();
        assert_eq!(forest.predict(&[0.0, 0.0]), 5.0);
        assert_eq!(forest.predict(&[1.0, 0.0]), 10.0);
        assert_eq!(forest.predict(&[1.0, 1.0]), 30.0);
        // Equal to the threshold goes left
        assert_eq!(forest.predict(&[0.5, 0.5]), 5.0);
    }

    #[test]
    fn test_invalid_trees_rejected() {
        let backwards = RegressionTree {
            nodes: vec![
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                },
            ],
        };
        assert!(ForestOracle::new(1, vec![backwards]).is_err());
        assert!(ForestOracle::new(1, vec![stump(3, 0.0, 1.0, 2.0)]).is_err());
        assert!(ForestOracle::new(1, vec![]).is_err());
    }

    #[test]
    fn test_forest_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"n_features": 1, "trees": [{{"nodes": [
                {{"feature": 0, "threshold": 2.0, "left": 1, "right": 2}},
                {{"value": -1.0}},
                {{"value": 1.0}}
            ]}}]}}"#
        )
        .unwrap();

        let forest = ForestOracle::from_file(file.path()).unwrap();
        let batch = FeatureMatrix::from_rows(vec![vec![1.0], vec![3.0]]).unwrap();
        assert_eq!(forest.score(&batch).unwrap(), vec![-1.0, 1.0]);
    }
}
