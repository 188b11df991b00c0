//! Library root for the `intervention_ranker` crate
//!
//! Given one client's feature vector and an injected scoring oracle, scores
//! every combination of interventions and returns the baseline prediction plus
//! the top-K combinations with their display names.

// Core error handling
pub mod errors;

// Data model
pub mod combinations;
pub mod features;
pub mod interventions;
pub mod matrix;

// Scoring oracles
pub mod forest;
pub mod mlp;
pub mod oracle;

// Ranking & assembly
pub mod ranker;
pub mod recommend;

// Configuration & CLI
pub mod cli;
pub mod config;


pub use errors::{RecommendError, RecommendResult};
pub use features::{ClientProfile, FeatureNormalizer, FeatureVector, MissingFeaturePolicy};
pub use interventions::InterventionSet;
pub use oracle::ScoringOracle;
pub use ranker::{RankedCombination, RankingPolicy};
pub use recommend::{recommend, recommend_with_policy, Recommendation, Recommender};
