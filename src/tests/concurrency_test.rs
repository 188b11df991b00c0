// Independent requests sharing one read-only oracle

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::interventions::InterventionSet;
use crate::oracle::LinearOracle;
use crate::recommend::Recommender;
use std::sync::Arc;
use std::thread;

#[test]
fn test_shared_recommender_across_threads() {
    let mut weights = vec![0.02; FEATURE_COUNT];
    weights.extend([0.1, 0.2, -0.1, 0.05, 0.3, -0.2, 0.15]);
    let recommender = Arc::new(Recommender::new(
        Arc::new(LinearOracle::new(0.1, weights)),
        InterventionSet::standard(),
    ));

    let features = FeatureVector::from_values(vec![1.0; FEATURE_COUNT]).unwrap();
    let expected = recommender.recommend(&features).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let recommender = Arc::clone(&recommender);
            let features = features.clone();
            thread::spawn(move || recommender.recommend(&features).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
