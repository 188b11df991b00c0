//! Top-K selection over scored combinations.

use crate::interventions::InterventionSet;
use crate::matrix::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the selected top-K combinations are ordered.
///
/// `AscendingTail` keeps the K highest scores but lists them lowest first,
/// which is the order existing consumers expect. `BestFirst` lists the
/// highest score first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    #[default]
    AscendingTail,
    BestFirst,
}

impl fmt::Display for RankingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingPolicy::AscendingTail => write!(f, "ascending_tail"),
            RankingPolicy::BestFirst => write!(f, "best_first"),
        }
    }
}

impl FromStr for RankingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ascending_tail" => Ok(RankingPolicy::AscendingTail),
            "best_first" => Ok(RankingPolicy::BestFirst),
            other => Err(format!("unknown ranking policy '{other}'")),
        }
    }
}

/// One selected combination with its predicted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCombination {
    pub score: f64,
    pub names: Vec<String>,
}

impl RankedCombination {
    /// Improvement over the no-intervention prediction
    pub fn uplift(&self, baseline: f64) -> f64 {
        self.score - baseline
    }
}

/// Select `top_k` rows of `batch` by score and resolve their flags to names.
///
/// Ties keep enumeration order (stable sort). Callers validate `top_k`;
/// a larger value simply returns every row.
pub fn rank(
    batch: &FeatureMatrix,
    scores: &[f64],
    interventions: &InterventionSet,
    top_k: usize,
    policy: RankingPolicy,
) -> Vec<RankedCombination> {
    debug_assert_eq!(batch.rows(), scores.len());

    let mut order: Vec<usize> = (0..scores.len()).collect();
    let selected: Vec<usize> = match policy {
        RankingPolicy::AscendingTail => {
            order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));
            let start = order.len().saturating_sub(top_k);
            order[start..].to_vec()
        }
        RankingPolicy::BestFirst => {
            order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
            order.truncate(top_k);
            order
        }
    };

    let flag_start = batch.width() - interventions.len();
    selected
        .into_iter()
        .map(|row| RankedCombination {
            score: scores[row],
            names: interventions.names_for_flags(&batch.row(row)[flag_start..]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::matrix::build_batch;

    fn setup() -> (FeatureMatrix, InterventionSet) {
        let set = InterventionSet::from_names(&["A", "B", "C"]).unwrap();
        let features = FeatureVector::from_values(vec![0.0]).unwrap();
        (build_batch(&features, &set), set)
    }

    #[test]
    fn test_ascending_tail_keeps_highest_lowest_first() {
        let (batch, set) = setup();
        // masks 0..8 -> [], A, B, AB, C, AC, BC, ABC
        let scores = [0.1, 0.9, 0.3, 0.2, 0.8, 0.4, 0.7, 0.5];
        let ranked = rank(&batch, &scores, &set, 3, RankingPolicy::AscendingTail);

        let got: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(got, vec![0.7, 0.8, 0.9]);
        assert_eq!(ranked[0].names, vec!["B", "C"]);
        assert_eq!(ranked[1].names, vec!["C"]);
        assert_eq!(ranked[2].names, vec!["A"]);
    }

    #[test]
    fn test_best_first_reverses_presentation() {
        let (batch, set) = setup();
        let scores = [0.1, 0.9, 0.3, 0.2, 0.8, 0.4, 0.7, 0.5];
        let ranked = rank(&batch, &scores, &set, 3, RankingPolicy::BestFirst);
        let got: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(got, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_ties_resolve_by_enumeration_order() {
        let (batch, set) = setup();
        let scores = [1.0; 8];

        let tail = rank(&batch, &scores, &set, 2, RankingPolicy::AscendingTail);
        assert_eq!(tail[0].names, vec!["B", "C"]);
        assert_eq!(tail[1].names, vec!["A", "B", "C"]);

        let best = rank(&batch, &scores, &set, 2, RankingPolicy::BestFirst);
        assert!(best[0].names.is_empty());
        assert_eq!(best[1].names, vec!["A"]);
    }

    #[test]
    fn test_top_k_bounds() {
        let (batch, set) = setup();
        let scores = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert!(rank(&batch, &scores, &set, 0, RankingPolicy::AscendingTail).is_empty());
        assert_eq!(rank(&batch, &scores, &set, 8, RankingPolicy::AscendingTail).len(), 8);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("best-first".parse::<RankingPolicy>().unwrap(), RankingPolicy::BestFirst);
        assert_eq!(
            "ascending_tail".parse::<RankingPolicy>().unwrap(),
            RankingPolicy::AscendingTail
        );
        assert!("random".parse::<RankingPolicy>().is_err());
        assert_eq!(RankingPolicy::default().to_string(), "ascending_tail");
    }
}
