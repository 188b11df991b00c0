//! Client feature vectors and the authoritative text-to-code normalizer.
//!
//! The oracle consumes demographics as a fixed-order numeric row. `Feature`
//! pins that order at compile time so no code path indexes a row by a string
//! key.

use crate::errors::{RecommendError, RecommendResult};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Number of demographic slots the standard model expects.
pub const FEATURE_COUNT: usize = 24;

/// Value substituted for an absent attribute under `MissingFeaturePolicy::Default`.
pub const MISSING_FEATURE_DEFAULT: f64 = 0.0;

/// One demographic or contextual attribute, in canonical oracle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Gender,
    WorkExperience,
    CanadaWorkex,
    DepNum,
    CanadaBorn,
    CitizenStatus,
    LevelOfSchooling,
    FluentEnglish,
    ReadingEnglishScale,
    SpeakingEnglishScale,
    WritingEnglishScale,
    NumeracyScale,
    ComputerScale,
    TransportationBool,
    CaregiverBool,
    Housing,
    IncomeSource,
    FelonyBool,
    AttendingSchool,
    CurrentlyEmployed,
    SubstanceUse,
    TimeUnemployed,
    NeedMentalHealthSupportBool,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Gender,
        Feature::WorkExperience,
        Feature::CanadaWorkex,
        Feature::DepNum,
        Feature::CanadaBorn,
        Feature::CitizenStatus,
        Feature::LevelOfSchooling,
        Feature::FluentEnglish,
        Feature::ReadingEnglishScale,
        Feature::SpeakingEnglishScale,
        Feature::WritingEnglishScale,
        Feature::NumeracyScale,
        Feature::ComputerScale,
        Feature::TransportationBool,
        Feature::CaregiverBool,
        Feature::Housing,
        Feature::IncomeSource,
        Feature::FelonyBool,
        Feature::AttendingSchool,
        Feature::CurrentlyEmployed,
        Feature::SubstanceUse,
        Feature::TimeUnemployed,
        Feature::NeedMentalHealthSupportBool,
    ];

    /// Position of this attribute in the oracle's input row
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used by the training data and client payloads
    pub fn column(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Gender => "gender",
            Feature::WorkExperience => "work_experience",
            Feature::CanadaWorkex => "canada_workex",
            Feature::DepNum => "dep_num",
            Feature::CanadaBorn => "canada_born",
            Feature::CitizenStatus => "citizen_status",
            Feature::LevelOfSchooling => "level_of_schooling",
            Feature::FluentEnglish => "fluent_english",
            Feature::ReadingEnglishScale => "reading_english_scale",
            Feature::SpeakingEnglishScale => "speaking_english_scale",
            Feature::WritingEnglishScale => "writing_english_scale",
            Feature::NumeracyScale => "numeracy_scale",
            Feature::ComputerScale => "computer_scale",
            Feature::TransportationBool => "transportation_bool",
            Feature::CaregiverBool => "caregiver_bool",
            Feature::Housing => "housing",
            Feature::IncomeSource => "income_source",
            Feature::FelonyBool => "felony_bool",
            Feature::AttendingSchool => "attending_school",
            Feature::CurrentlyEmployed => "currently_employed",
            Feature::SubstanceUse => "substance_use",
            Feature::TimeUnemployed => "time_unemployed",
            Feature::NeedMentalHealthSupportBool => "need_mental_health_support_bool",
        }
    }

    /// Categorical table specific to this column, if it has one
    fn category_table(self) -> Option<&'static HashMap<&'static str, f64>> {
        match self {
            Feature::LevelOfSchooling => Some(&*SCHOOLING_CODES),
            Feature::Housing => Some(&*HOUSING_CODES),
            Feature::IncomeSource => Some(&*INCOME_SOURCE_CODES),
            _ => None,
        }
    }
}

lazy_static! {
    static ref YES_NO_CODES: HashMap<&'static str, f64> = HashMap::from([
        ("", 0.0),
        ("true", 1.0),
        ("false", 0.0),
        ("no", 0.0),
        ("yes", 1.0),
        ("No", 0.0),
        ("Yes", 1.0),
    ]);
    static ref SCHOOLING_CODES: HashMap<&'static str, f64> = HashMap::from([
        ("Grade 0-8", 1.0),
        ("Grade 9", 2.0),
        ("Grade 10", 3.0),
        ("Grade 11", 4.0),
        ("Grade 12 or equivalent", 5.0),
        ("OAC or Grade 13", 6.0),
        ("Some college", 7.0),
        ("Some university", 8.0),
        ("Some apprenticeship", 9.0),
        ("Certificate of Apprenticeship", 10.0),
        ("Journeyperson", 11.0),
        ("Certificate/Diploma", 12.0),
        ("Bachelor\u{2019}s degree", 13.0),
        ("Post graduate", 14.0),
    ]);
    static ref HOUSING_CODES: HashMap<&'static str, f64> = HashMap::from([
        ("Renting-private", 1.0),
        ("Renting-subsidized", 2.0),
        ("Boarding or lodging", 3.0),
        ("Homeowner", 4.0),
        ("Living with family/friend", 5.0),
        ("Institution", 6.0),
        ("Temporary second residence", 7.0),
        ("Band-owned home", 8.0),
        ("Homeless or transient", 9.0),
        ("Emergency hostel", 10.0),
    ]);
    static ref INCOME_SOURCE_CODES: HashMap<&'static str, f64> = HashMap::from([
        ("No Source of Income", 1.0),
        ("Employment Insurance", 2.0),
        ("Workplace Safety and Insurance Board", 3.0),
        ("Ontario Works applied or receiving", 4.0),
        ("Ontario Disability Support Program applied or receiving", 5.0),
        ("Dependent of someone receiving OW or ODSP", 6.0),
        ("Crown Ward", 7.0),
        ("Employment", 8.0),
        ("Self-Employment", 9.0),
        ("Other (specify)", 10.0),
    ]);
}

/// Normalized numeric representation of one client, in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Build a vector from already-numeric values. Any non-finite value is
    /// rejected; the length is checked later against the oracle width.
    pub fn from_values(values: Vec<f64>) -> RecommendResult<Self> {
        if let Some((idx, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            let name = Feature::ALL
                .get(idx)
                .map(|f| f.column().to_string())
                .unwrap_or_else(|| format!("slot_{idx}"));
            return Err(RecommendError::invalid_feature(name, value.to_string()));
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value for a named attribute; only meaningful for standard-width vectors
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.0.get(feature.index()).copied()
    }
}

/// One raw answer as it arrives from the intake form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<f64> for RawAnswer {
    fn from(value: f64) -> Self {
        RawAnswer::Number(value)
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        RawAnswer::Text(value.to_string())
    }
}

/// Client intake payload with one optional answer per `Feature`.
///
/// Unknown keys are rejected so a misspelled column never silently
/// falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientProfile {
    pub age: Option<RawAnswer>,
    pub gender: Option<RawAnswer>,
    pub work_experience: Option<RawAnswer>,
    pub canada_workex: Option<RawAnswer>,
    pub dep_num: Option<RawAnswer>,
    pub canada_born: Option<RawAnswer>,
    pub citizen_status: Option<RawAnswer>,
    pub level_of_schooling: Option<RawAnswer>,
    pub fluent_english: Option<RawAnswer>,
    pub reading_english_scale: Option<RawAnswer>,
    pub speaking_english_scale: Option<RawAnswer>,
    pub writing_english_scale: Option<RawAnswer>,
    pub numeracy_scale: Option<RawAnswer>,
    pub computer_scale: Option<RawAnswer>,
    pub transportation_bool: Option<RawAnswer>,
    pub caregiver_bool: Option<RawAnswer>,
    pub housing: Option<RawAnswer>,
    pub income_source: Option<RawAnswer>,
    pub felony_bool: Option<RawAnswer>,
    pub attending_school: Option<RawAnswer>,
    pub currently_employed: Option<RawAnswer>,
    pub substance_use: Option<RawAnswer>,
    pub time_unemployed: Option<RawAnswer>,
    pub need_mental_health_support_bool: Option<RawAnswer>,
}

impl ClientProfile {
    /// Profile with every attribute set from numeric values in canonical order
    pub fn from_numbers(values: [f64; FEATURE_COUNT]) -> Self {
        let mut profile = Self::default();
        for (feature, value) in Feature::ALL.iter().zip(values) {
            *profile.slot_mut(*feature) = Some(RawAnswer::Number(value));
        }
        profile
    }

    /// Builder-style setter
    pub fn with(mut self, feature: Feature, answer: impl Into<RawAnswer>) -> Self {
        *self.slot_mut(feature) = Some(answer.into());
        self
    }

    pub fn get(&self, feature: Feature) -> Option<&RawAnswer> {
        match feature {
            Feature::Age => self.age.as_ref(),
            Feature::Gender => self.gender.as_ref(),
            Feature::WorkExperience => self.work_experience.as_ref(),
            Feature::CanadaWorkex => self.canada_workex.as_ref(),
            Feature::DepNum => self.dep_num.as_ref(),
            Feature::CanadaBorn => self.canada_born.as_ref(),
            Feature::CitizenStatus => self.citizen_status.as_ref(),
            Feature::LevelOfSchooling => self.level_of_schooling.as_ref(),
            Feature::FluentEnglish => self.fluent_english.as_ref(),
            Feature::ReadingEnglishScale => self.reading_english_scale.as_ref(),
            Feature::SpeakingEnglishScale => self.speaking_english_scale.as_ref(),
            Feature::WritingEnglishScale => self.writing_english_scale.as_ref(),
            Feature::NumeracyScale => self.numeracy_scale.as_ref(),
            Feature::ComputerScale => self.computer_scale.as_ref(),
            Feature::TransportationBool => self.transportation_bool.as_ref(),
            Feature::CaregiverBool => self.caregiver_bool.as_ref(),
            Feature::Housing => self.housing.as_ref(),
            Feature::IncomeSource => self.income_source.as_ref(),
            Feature::FelonyBool => self.felony_bool.as_ref(),
            Feature::AttendingSchool => self.attending_school.as_ref(),
            Feature::CurrentlyEmployed => self.currently_employed.as_ref(),
            Feature::SubstanceUse => self.substance_use.as_ref(),
            Feature::TimeUnemployed => self.time_unemployed.as_ref(),
            Feature::NeedMentalHealthSupportBool => self.need_mental_health_support_bool.as_ref(),
        }
    }

    fn slot_mut(&mut self, feature: Feature) -> &mut Option<RawAnswer> {
        match feature {
            Feature::Age => &mut self.age,
            Feature::Gender => &mut self.gender,
            Feature::WorkExperience => &mut self.work_experience,
            Feature::CanadaWorkex => &mut self.canada_workex,
            Feature::DepNum => &mut self.dep_num,
            Feature::CanadaBorn => &mut self.canada_born,
            Feature::CitizenStatus => &mut self.citizen_status,
            Feature::LevelOfSchooling => &mut self.level_of_schooling,
            Feature::FluentEnglish => &mut self.fluent_english,
            Feature::ReadingEnglishScale => &mut self.reading_english_scale,
            Feature::SpeakingEnglishScale => &mut self.speaking_english_scale,
            Feature::WritingEnglishScale => &mut self.writing_english_scale,
            Feature::NumeracyScale => &mut self.numeracy_scale,
            Feature::ComputerScale => &mut self.computer_scale,
            Feature::TransportationBool => &mut self.transportation_bool,
            Feature::CaregiverBool => &mut self.caregiver_bool,
            Feature::Housing => &mut self.housing,
            Feature::IncomeSource => &mut self.income_source,
            Feature::FelonyBool => &mut self.felony_bool,
            Feature::AttendingSchool => &mut self.attending_school,
            Feature::CurrentlyEmployed => &mut self.currently_employed,
            Feature::SubstanceUse => &mut self.substance_use,
            Feature::TimeUnemployed => &mut self.time_unemployed,
            Feature::NeedMentalHealthSupportBool => &mut self.need_mental_health_support_bool,
        }
    }
}

/// What to do when a profile leaves an attribute out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFeaturePolicy {
    /// Fill with `MISSING_FEATURE_DEFAULT`
    #[default]
    Default,
    /// Fail the request
    Reject,
}

/// Converts intake answers into a `FeatureVector`
#[derive(Debug, Clone, Default)]
pub struct FeatureNormalizer {
    missing: MissingFeaturePolicy,
}

impl FeatureNormalizer {
    pub fn new(missing: MissingFeaturePolicy) -> Self {
        Self { missing }
    }

    pub fn normalize(&self, profile: &ClientProfile) -> RecommendResult<FeatureVector> {
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        for feature in Feature::ALL {
            let value = match profile.get(feature) {
                Some(answer) => Self::convert_answer(feature, answer)?,
                None => match self.missing {
                    MissingFeaturePolicy::Default => {
                        debug!(feature = feature.column(), "attribute missing, using default");
                        MISSING_FEATURE_DEFAULT
                    }
                    MissingFeaturePolicy::Reject => {
                        return Err(RecommendError::invalid_feature(feature.column(), "<missing>"));
                    }
                },
            };
            values.push(value);
        }
        FeatureVector::from_values(values)
    }

    pub fn convert_answer(feature: Feature, answer: &RawAnswer) -> RecommendResult<f64> {
        match answer {
            RawAnswer::Number(n) if n.is_finite() => Ok(*n),
            RawAnswer::Number(n) => Err(RecommendError::invalid_feature(feature.column(), n.to_string())),
            RawAnswer::Flag(b) => Ok(if *b { 1.0 } else { 0.0 }),
            RawAnswer::Text(text) => Self::convert_text(feature, text),
        }
    }

    /// Column table first, then yes/no answers, then numeric text.
    fn convert_text(feature: Feature, text: &str) -> RecommendResult<f64> {
        if let Some(code) = feature.category_table().and_then(|table| table.get(text)) {
            return Ok(*code);
        }
        if let Some(code) = YES_NO_CODES.get(text) {
            return Ok(*code);
        }
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(RecommendError::invalid_feature(feature.column(), text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_is_canonical() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
        assert_eq!(Feature::ALL[0].column(), "age");
        assert_eq!(Feature::ALL[FEATURE_COUNT - 1].column(), "need_mental_health_support_bool");
    }

    #[test]
    fn test_categorical_text_maps_to_codes() {
        let n = |f, t: &str| FeatureNormalizer::convert_answer(f, &RawAnswer::from(t)).unwrap();
        assert_eq!(n(Feature::LevelOfSchooling, "Post graduate"), 14.0);
        assert_eq!(n(Feature::Housing, "Homeowner"), 4.0);
        assert_eq!(n(Feature::IncomeSource, "Crown Ward"), 7.0);
        assert_eq!(n(Feature::FelonyBool, "Yes"), 1.0);
        assert_eq!(n(Feature::CaregiverBool, ""), 0.0);
        assert_eq!(n(Feature::Age, "23"), 23.0);
        assert_eq!(n(Feature::Age, " 4.5 "), 4.5);
    }

    #[test]
    fn test_labels_are_bound_to_their_column() {
        // "Homeowner" is a housing answer; it must not leak into schooling.
        let err = FeatureNormalizer::convert_answer(
            Feature::LevelOfSchooling,
            &RawAnswer::from("Homeowner"),
        )
        .unwrap_err();
        assert!(matches!(err, RecommendError::InvalidFeatureValue { .. }));
    }

    #[test]
    fn test_unmapped_text_fails_fast() {
        let err = FeatureNormalizer::convert_answer(Feature::Housing, &RawAnswer::from("Castle"))
            .unwrap_err();
        match err {
            RecommendError::InvalidFeatureValue { feature, value } => {
                assert_eq!(feature, "housing");
                assert_eq!(value, "Castle");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_policy() {
        let profile = ClientProfile::default().with(Feature::Age, 30.0);

        let filled = FeatureNormalizer::new(MissingFeaturePolicy::Default)
            .normalize(&profile)
            .unwrap();
        assert_eq!(filled.len(), FEATURE_COUNT);
        assert_eq!(filled.get(Feature::Age), Some(30.0));
        assert_eq!(filled.get(Feature::Housing), Some(MISSING_FEATURE_DEFAULT));

        let rejected = FeatureNormalizer::new(MissingFeaturePolicy::Reject).normalize(&profile);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_profile_json_rejects_unknown_keys() {
        let ok: ClientProfile =
            serde_json::from_str(r#"{"age": "23", "housing": "Homeowner", "felony_bool": true}"#)
                .unwrap();
        assert_eq!(ok.age, Some(RawAnswer::Text("23".into())));
        assert_eq!(ok.felony_bool, Some(RawAnswer::Flag(true)));

        let typo = serde_json::from_str::<ClientProfile>(r#"{"agee": 23}"#);
        assert!(typo.is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = FeatureVector::from_values(vec![1.0, f64::NAN]).unwrap_err();
        assert!(err.to_string().contains("gender"));
    }
}
