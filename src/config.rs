// Recommender configuration: defaults, then recommender.toml, then RECOMMENDER_* env vars

use crate::errors::{RecommendError, RecommendResult};
use crate::features::MissingFeaturePolicy;
use crate::interventions::STANDARD_INTERVENTION_COUNT;
use crate::ranker::RankingPolicy;
use crate::recommend::DEFAULT_TOP_K;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "recommender.toml";
pub const ENV_PREFIX: &str = "RECOMMENDER_";

/// Which scoring model backs the oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Row-sum stub, no artifact needed
    #[default]
    Sum,
    /// JSON `{bias, weights}`
    Linear,
    /// JSON tree ensemble
    Forest,
    /// safetensors feed-forward network
    Mlp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ModelConfig {
    pub fn require_path(&self) -> RecommendResult<&Path> {
        self.path.as_deref().ok_or_else(|| {
            RecommendError::config(format!("model kind {:?} requires model.path", self.kind))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub ranking_policy: RankingPolicy,
    #[serde(default)]
    pub missing_features: MissingFeaturePolicy,
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            ranking_policy: RankingPolicy::default(),
            missing_features: MissingFeaturePolicy::default(),
            model: ModelConfig::default(),
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> RecommendResult<()> {
        let combinations = 1usize << STANDARD_INTERVENTION_COUNT;
        if self.top_k > combinations {
            return Err(RecommendError::config(format!(
                "top_k {} exceeds the {} available combinations",
                self.top_k, combinations
            )));
        }
        if self.model.kind != ModelKind::Sum {
            self.model.require_path()?;
        }
        Ok(())
    }
}

/// Load configuration, reading `path` or `recommender.toml` when present.
pub fn load_config(path: Option<&Path>) -> RecommendResult<RecommenderConfig> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let figment = Figment::from(Serialized::defaults(RecommenderConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: RecommenderConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
