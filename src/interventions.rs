//! Named intervention flags and the flag-to-name mapping.

use crate::errors::{RecommendError, RecommendResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on the number of interventions; the search space is `2^I`.
pub const MAX_INTERVENTIONS: usize = 16;

/// Number of interventions offered by the standard program.
pub const STANDARD_INTERVENTION_COUNT: usize = 7;

/// Interventions of the standard program, in flag order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intervention {
    LifeStabilization,
    GeneralEmploymentAssistance,
    RetentionServices,
    SpecializedServices,
    EmploymentRelatedFinancialSupports,
    EmployerFinancialSupports,
    EnhancedReferrals,
}

impl Intervention {
    pub const ALL: [Intervention; STANDARD_INTERVENTION_COUNT] = [
        Intervention::LifeStabilization,
        Intervention::GeneralEmploymentAssistance,
        Intervention::RetentionServices,
        Intervention::SpecializedServices,
        Intervention::EmploymentRelatedFinancialSupports,
        Intervention::EmployerFinancialSupports,
        Intervention::EnhancedReferrals,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Label shown to case workers
    pub fn label(self) -> &'static str {
        match self {
            Intervention::LifeStabilization => "Life Stabilization",
            Intervention::GeneralEmploymentAssistance => "General Employment Assistance Services",
            Intervention::RetentionServices => "Retention Services",
            Intervention::SpecializedServices => "Specialized Services",
            Intervention::EmploymentRelatedFinancialSupports => {
                "Employment-Related Financial Supports"
            }
            Intervention::EmployerFinancialSupports => "Employer Financial Supports",
            Intervention::EnhancedReferrals => "Enhanced Referrals",
        }
    }

    /// Column name in the training data
    pub fn column(self) -> &'static str {
        match self {
            Intervention::LifeStabilization => "life_stabilization",
            Intervention::GeneralEmploymentAssistance => "employment_assistance",
            Intervention::RetentionServices => "retention_services",
            Intervention::SpecializedServices => "specialized_services",
            Intervention::EmploymentRelatedFinancialSupports => {
                "employment_related_financial_supports"
            }
            Intervention::EmployerFinancialSupports => "employer_financial_supports",
            Intervention::EnhancedReferrals => "enhanced_referrals",
        }
    }
}

/// Ordered, unique display names; position `j` names flag `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct InterventionSet {
    names: Vec<String>,
}

impl InterventionSet {
    /// The standard seven-intervention program
    pub fn standard() -> Self {
        Self {
            names: Intervention::ALL.iter().map(|i| i.label().to_string()).collect(),
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> RecommendResult<Self> {
        if names.is_empty() {
            return Err(RecommendError::config("intervention set is empty"));
        }
        if names.len() > MAX_INTERVENTIONS {
            return Err(RecommendError::config(format!(
                "{} interventions exceeds the maximum of {}",
                names.len(),
                MAX_INTERVENTIONS
            )));
        }
        let mut seen = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                return Err(RecommendError::config("intervention name cannot be empty"));
            }
            if !seen.insert(name) {
                return Err(RecommendError::config(format!(
                    "duplicate intervention name '{name}'"
                )));
            }
        }
        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Size of the combination space, `2^I`
    pub fn combination_count(&self) -> usize {
        1usize << self.names.len()
    }

    /// Names of the active flags in a row's trailing intervention slots.
    ///
    /// Only a value of exactly `1.0` is active. Names come back in set order.
    pub fn names_for_flags(&self, flags: &[f64]) -> Vec<String> {
        flags
            .iter()
            .zip(&self.names)
            .filter(|(flag, _)| **flag == 1.0)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

impl TryFrom<Vec<String>> for InterventionSet {
    type Error = RecommendError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_names(&names)
    }
}

impl From<InterventionSet> for Vec<String> {
    fn from(set: InterventionSet) -> Self {
        set.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_order() {
        let set = InterventionSet::standard();
        assert_eq!(set.len(), STANDARD_INTERVENTION_COUNT);
        assert_eq!(set.combination_count(), 128);
        assert_eq!(set.names()[0], "Life Stabilization");
        assert_eq!(set.names()[6], "Enhanced Referrals");
    }

    #[test]
    fn test_names_for_flags_exact_one_only() {
        let set = InterventionSet::from_names(&["A", "B", "C"]).unwrap();
        assert_eq!(set.names_for_flags(&[1.0, 0.0, 1.0]), vec!["A", "C"]);
        assert!(set.names_for_flags(&[0.0, 0.0, 0.0]).is_empty());
        // Anything other than exactly 1 is inactive
        assert_eq!(set.names_for_flags(&[0.999, 2.0, 1.0]), vec!["C"]);
    }

    #[test]
    fn test_invalid_sets_rejected() {
        let empty: [&str; 0] = [];
        assert!(InterventionSet::from_names(&empty).is_err());
        assert!(InterventionSet::from_names(&["A", "A"]).is_err());
        assert!(InterventionSet::from_names(&["A", " "]).is_err());

        let too_many: Vec<String> = (0..=MAX_INTERVENTIONS).map(|i| format!("i{i}")).collect();
        assert!(InterventionSet::from_names(&too_many).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let set: InterventionSet = serde_json::from_str(r#"["X", "Y"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(serde_json::from_str::<InterventionSet>(r#"["X", "X"]"#).is_err());
    }
}
