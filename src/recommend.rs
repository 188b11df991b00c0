//! The recommendation pipeline: build the batch, score it, rank it, assemble.

use crate::config::RecommenderConfig;
use crate::errors::{RecommendError, RecommendResult};
use crate::features::{ClientProfile, FeatureNormalizer, FeatureVector};
use crate::interventions::InterventionSet;
use crate::matrix::{baseline_row, build_batch, check_width};
use crate::oracle::{score_baseline, score_batch, ScoringOracle};
use crate::ranker::{rank, RankedCombination, RankingPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Default number of combinations returned
pub const DEFAULT_TOP_K: usize = 3;

/// Baseline prediction plus the ranked intervention combinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub baseline: f64,
    pub interventions: Vec<RankedCombination>,
}

impl Recommendation {
    /// Highest-scoring combination regardless of list order
    pub fn best(&self) -> Option<&RankedCombination> {
        self.interventions
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Recommend with the compatibility ordering (`RankingPolicy::AscendingTail`).
pub fn recommend(
    features: &FeatureVector,
    interventions: &InterventionSet,
    top_k: usize,
    oracle: &dyn ScoringOracle,
) -> RecommendResult<Recommendation> {
    recommend_with_policy(features, interventions, top_k, oracle, RankingPolicy::AscendingTail)
}

/// Score every intervention combination for one client and keep the top `top_k`.
pub fn recommend_with_policy(
    features: &FeatureVector,
    interventions: &InterventionSet,
    top_k: usize,
    oracle: &dyn ScoringOracle,
    policy: RankingPolicy,
) -> RecommendResult<Recommendation> {
    let combinations = interventions.combination_count();
    if top_k > combinations {
        return Err(RecommendError::config(format!(
            "top_k {top_k} exceeds the {combinations} available combinations"
        )));
    }
    check_width(features, interventions, oracle)?;

    let batch = build_batch(features, interventions);
    let baseline = baseline_row(features, interventions);
    debug!(rows = batch.rows(), width = batch.width(), "scoring batch built");

    let scores = score_batch(oracle, &batch)?;
    let baseline = score_baseline(oracle, &baseline)?;

    let ranked = rank(&batch, &scores, interventions, top_k, policy);
    Ok(Recommendation {
        baseline,
        interventions: ranked,
    })
}

/// Pipeline bound to one injected oracle and intervention program
pub struct Recommender {
    oracle: Arc<dyn ScoringOracle>,
    interventions: InterventionSet,
    normalizer: FeatureNormalizer,
    top_k: usize,
    policy: RankingPolicy,
}

impl Recommender {
    pub fn new(oracle: Arc<dyn ScoringOracle>, interventions: InterventionSet) -> Self {
        Self {
            oracle,
            interventions,
            normalizer: FeatureNormalizer::default(),
            top_k: DEFAULT_TOP_K,
            policy: RankingPolicy::default(),
        }
    }

    pub fn from_config(
        config: &RecommenderConfig,
        oracle: Arc<dyn ScoringOracle>,
    ) -> RecommendResult<Self> {
        let interventions = InterventionSet::standard();
        if config.top_k > interventions.combination_count() {
            return Err(RecommendError::config(format!(
                "top_k {} exceeds the {} available combinations",
                config.top_k,
                interventions.combination_count()
            )));
        }
        Ok(Self {
            oracle,
            interventions,
            normalizer: FeatureNormalizer::new(config.missing_features),
            top_k: config.top_k,
            policy: config.ranking_policy,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_normalizer(mut self, normalizer: FeatureNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn interventions(&self) -> &InterventionSet {
        &self.interventions
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    pub fn recommend(&self, features: &FeatureVector) -> RecommendResult<Recommendation> {
        let span = info_span!(
            "recommend",
            request_id = %Uuid::new_v4(),
            oracle = self.oracle.name(),
            top_k = self.top_k,
            policy = %self.policy,
        );
        let _enter = span.enter();

        match recommend_with_policy(
            features,
            &self.interventions,
            self.top_k,
            self.oracle.as_ref(),
            self.policy,
        ) {
            Ok(recommendation) => {
                info!(
                    baseline = recommendation.baseline,
                    best = ?recommendation.best().map(|b| b.score),
                    "recommendation complete"
                );
                Ok(recommendation)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "recommendation failed");
                Err(e)
            }
        }
    }

    /// Normalize an intake profile, then recommend
    pub fn recommend_profile(&self, profile: &ClientProfile) -> RecommendResult<Recommendation> {
        let features = self.normalizer.normalize(profile)?;
        self.recommend(&features)
    }
}
