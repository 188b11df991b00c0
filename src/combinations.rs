//! Enumeration of every on/off assignment over the intervention set.
//!
//! Combination `n` switches on flag `j` exactly when bit `j` of `n` is set.
//! The ranker's tie-break depends on this order, so it must not change.

/// One assignment of on/off flags, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination {
    mask: u32,
}

impl Combination {
    pub fn from_mask(mask: u32) -> Self {
        Self { mask }
    }

    /// The all-off assignment used for the baseline row
    pub fn none() -> Self {
        Self { mask: 0 }
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn is_active(&self, flag: usize) -> bool {
        flag < 32 && self.mask & (1 << flag) != 0
    }

    pub fn active_count(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Flags as the numeric slots appended to a feature row
    pub fn flags(&self, interventions: usize) -> Vec<f64> {
        (0..interventions)
            .map(|j| if self.is_active(j) { 1.0 } else { 0.0 })
            .collect()
    }
}

/// All `2^interventions` combinations in binary counting order.
pub fn all_combinations(interventions: usize) -> impl Iterator<Item = Combination> {
    debug_assert!(interventions < 32);
    (0..(1u32 << interventions)).map(Combination::from_mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cardinality_and_uniqueness() {
        for i in 0..=8 {
            let rows: Vec<Vec<u8>> = all_combinations(i)
                .map(|c| c.flags(i).iter().map(|f| *f as u8).collect())
                .collect();
            assert_eq!(rows.len(), 1 << i);
            let unique: HashSet<_> = rows.iter().cloned().collect();
            assert_eq!(unique.len(), rows.len());
            assert!(rows.iter().all(|r| r.len() == i));
        }
    }

    #[test]
    fn test_bit_j_is_flag_j() {
        let combos: Vec<Combination> = all_combinations(3).collect();
        assert_eq!(combos[0].flags(3), vec![0.0, 0.0, 0.0]);
        assert_eq!(combos[1].flags(3), vec![1.0, 0.0, 0.0]);
        assert_eq!(combos[4].flags(3), vec![0.0, 0.0, 1.0]);
        assert_eq!(combos[6].flags(3), vec![0.0, 1.0, 1.0]);
        assert_eq!(combos[7].active_count(), 3);
    }

    #[test]
    fn test_enumeration_is_reproducible() {
        let a: Vec<_> = all_combinations(7).collect();
        let b: Vec<_> = all_combinations(7).collect();
        assert_eq!(a, b);
        assert_eq!(Combination::none().flags(7), vec![0.0; 7]);
    }
}
