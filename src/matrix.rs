//! Scoring batch construction: one client row per intervention combination.

use crate::combinations::{all_combinations, Combination};
use crate::errors::{RecommendError, RecommendResult};
use crate::features::FeatureVector;
use crate::interventions::InterventionSet;
use crate::oracle::ScoringOracle;

/// Row-major matrix of `rows` x `width` values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    rows: usize,
    width: usize,
}

impl FeatureMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> RecommendResult<Self> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return Err(RecommendError::config("matrix rows have differing widths"));
        }
        let count = rows.len();
        Ok(Self {
            data: rows.into_iter().flatten().collect(),
            rows: count,
            width,
        })
    }

    fn with_capacity(rows: usize, width: usize) -> Self {
        Self {
            data: Vec::with_capacity(rows * width),
            rows: 0,
            width,
        }
    }

    fn push_row(&mut self, features: &[f64], flags: &[f64]) {
        self.data.extend_from_slice(features);
        self.data.extend_from_slice(flags);
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.width;
        &self.data[start..start + self.width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.width.max(1)).take(self.rows)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Fail when the client row plus intervention flags does not fill the
/// oracle's input exactly. Nothing is truncated or padded.
pub fn check_width(
    features: &FeatureVector,
    interventions: &InterventionSet,
    oracle: &dyn ScoringOracle,
) -> RecommendResult<()> {
    if features.is_empty() {
        return Err(RecommendError::config("feature vector is empty"));
    }
    if let Some(expected) = oracle.input_width() {
        let actual = features.len() + interventions.len();
        if actual != expected {
            return Err(RecommendError::config(format!(
                "oracle '{}' expects {} inputs but got {} features + {} interventions",
                oracle.name(),
                expected,
                features.len(),
                interventions.len()
            )));
        }
    }
    Ok(())
}

/// One row per combination, in enumeration order, each ending with the
/// combination's flags.
pub fn build_batch(features: &FeatureVector, interventions: &InterventionSet) -> FeatureMatrix {
    let count = interventions.combination_count();
    let mut matrix = FeatureMatrix::with_capacity(count, features.len() + interventions.len());
    for combination in all_combinations(interventions.len()) {
        matrix.push_row(features.as_slice(), &combination.flags(interventions.len()));
    }
    matrix
}

/// Single row with every intervention switched off
pub fn baseline_row(features: &FeatureVector, interventions: &InterventionSet) -> FeatureMatrix {
    let mut matrix = FeatureMatrix::with_capacity(1, features.len() + interventions.len());
    matrix.push_row(
        features.as_slice(),
        &Combination::none().flags(interventions.len()),
    );
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{LinearOracle, SumOracle};

    fn features() -> FeatureVector {
        FeatureVector::from_values(vec![3.0, 1.5, 0.0]).unwrap()
    }

    #[test]
    fn test_batch_layout() {
        let set = InterventionSet::from_names(&["A", "B"]).unwrap();
        let batch = build_batch(&features(), &set);

        assert_eq!(batch.rows(), 4);
        assert_eq!(batch.width(), 5);
        assert_eq!(batch.row(0), &[3.0, 1.5, 0.0, 0.0, 0.0]);
        assert_eq!(batch.row(1), &[3.0, 1.5, 0.0, 1.0, 0.0]);
        assert_eq!(batch.row(2), &[3.0, 1.5, 0.0, 0.0, 1.0]);
        assert_eq!(batch.row(3), &[3.0, 1.5, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_feature_prefix_identical_across_rows() {
        let set = InterventionSet::standard();
        let f = features();
        let batch = build_batch(&f, &set);
        let base = baseline_row(&f, &set);

        for row in batch.iter_rows().chain(base.iter_rows()) {
            assert_eq!(&row[..f.len()], f.as_slice());
        }
        assert_eq!(batch.iter_rows().count(), 128);
    }

    #[test]
    fn test_baseline_row_has_no_interventions() {
        let set = InterventionSet::standard();
        let base = baseline_row(&features(), &set);
        assert_eq!(base.rows(), 1);
        assert!(base.row(0)[3..].iter().all(|v| *v == 0.0));
        assert!(set.names_for_flags(&base.row(0)[3..]).is_empty());
    }

    #[test]
    fn test_width_mismatch_is_configuration_error() {
        let set = InterventionSet::from_names(&["A", "B"]).unwrap();
        let oracle = LinearOracle::new(0.0, vec![1.0; 6]);
        let err = check_width(&features(), &set, &oracle).unwrap_err();
        assert!(matches!(err, RecommendError::Config { .. }));

        let fitting = LinearOracle::new(0.0, vec![1.0; 5]);
        assert!(check_width(&features(), &set, &fitting).is_ok());
        assert!(check_width(&features(), &set, &SumOracle).is_ok());
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        assert!(FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        let m = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }
}
