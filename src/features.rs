//! Feature Derivation and Assembly

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// BMI bin edges, right-closed: (0,18.5], (18.5,25], (25,30], (30,100]
pub const BMI_BIN_EDGES: [f64; 5] = [0.0, 18.5, 25.0, 30.0, 100.0];

/// Age bin edges, right-closed: (0,30], (30,45], (45,60], (60,100]
pub const AGE_BIN_EDGES: [f64; 5] = [0.0, 30.0, 45.0, 60.0, 100.0];

/// Bucket assigned to values outside every bin
pub const OUT_OF_BINS: i32 = -1;

/// Number of features the model consumes
pub const FEATURE_COUNT: usize = 12;

/// Patient health metrics for one prediction request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientInput {
    /// Age in years
    pub age: f64,
    /// Body mass index
    pub bmi: f64,
    /// Weight (kg)
    pub weight: f64,
    /// Height (cm)
    pub height: f64,
    /// Systolic blood pressure (mmHg)
    pub systolic_bp: f64,
    /// Family history of diabetes (0/1)
    pub family_history: i64,
    /// Physical activity level
    pub physical_activity: i64,
    /// Diet quality score
    pub diet_quality: f64,
    /// Location code
    pub location: i64,
    /// Smoker (0/1)
    pub smoking: i64,
}

/// Categorical features derived by binning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedFeatures {
    /// BMI bucket in {-1, 0, 1, 2, 3}
    pub bmi_category: i32,
    /// Age bucket in {-1, 0, 1, 2, 3}
    pub age_group: i32,
}

impl DerivedFeatures {
    /// Bin BMI and age
    pub fn derive(input: &PatientInput) -> Self {
        Self {
            bmi_category: bin_right_closed(input.bmi, &BMI_BIN_EDGES),
            age_group: bin_right_closed(input.age, &AGE_BIN_EDGES),
        }
    }

    /// Whether either value fell outside its bins
    pub fn has_out_of_bins(&self) -> bool {
        self.bmi_category == OUT_OF_BINS || self.age_group == OUT_OF_BINS
    }
}

/// Index of the right-closed interval `(edges[i], edges[i + 1]]` holding `value`,
/// or [`OUT_OF_BINS`]. NaN matches no interval.
pub fn bin_right_closed(value: f64, edges: &[f64]) -> i32 {
    edges
        .windows(2)
        .position(|w| value > w[0] && value <= w[1])
        .map_or(OUT_OF_BINS, |i| i as i32)
}

/// One named model input, declared in [`FEATURE_ORDER`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Age in years
    Age,
    /// Body mass index
    Bmi,
    /// Weight in kg
    Weight,
    /// Height in cm
    Height,
    /// Systolic blood pressure, mmHg
    SystolicBp,
    /// Family history flag
    FamilyHistory,
    /// Physical activity flag
    PhysicalActivity,
    /// Diet quality score
    DietQuality,
    /// Location code
    Location,
    /// Smoking flag
    Smoking,
    /// Binned BMI
    BmiCategory,
    /// Binned age
    AgeGroup,
}

/// Column order the scaler and classifier were fitted with
pub const FEATURE_ORDER: [Feature; FEATURE_COUNT] = [
    Feature::Age,
    Feature::Bmi,
    Feature::Weight,
    Feature::Height,
    Feature::SystolicBp,
    Feature::FamilyHistory,
    Feature::PhysicalActivity,
    Feature::DietQuality,
    Feature::Location,
    Feature::Smoking,
    Feature::BmiCategory,
    Feature::AgeGroup,
];

impl Feature {
    /// Column name in the training data
    pub const fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Bmi => "bmi",
            Feature::Weight => "weight",
            Feature::Height => "height",
            Feature::SystolicBp => "systolic_bp",
            Feature::FamilyHistory => "family_history",
            Feature::PhysicalActivity => "physical_activity",
            Feature::DietQuality => "diet_quality",
            Feature::Location => "location",
            Feature::Smoking => "smoking",
            Feature::BmiCategory => "bmi_category",
            Feature::AgeGroup => "age_group",
        }
    }

    /// Position in [`FEATURE_ORDER`]
    pub const fn index(self) -> usize {
        self as usize
    }

    fn extract(self, input: &PatientInput, derived: &DerivedFeatures) -> f64 {
        match self {
            Feature::Age => input.age,
            Feature::Bmi => input.bmi,
            Feature::Weight => input.weight,
            Feature::Height => input.height,
            Feature::SystolicBp => input.systolic_bp,
            Feature::FamilyHistory => input.family_history as f64,
            Feature::PhysicalActivity => input.physical_activity as f64,
            Feature::DietQuality => input.diet_quality,
            Feature::Location => input.location as f64,
            Feature::Smoking => input.smoking as f64,
            Feature::BmiCategory => f64::from(derived.bmi_category),
            Feature::AgeGroup => f64::from(derived.age_group),
        }
    }
}

/// Feature names in model order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    FEATURE_ORDER.map(Feature::name)
}

/// Ordered model input for one patient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Lay out raw and derived features in [`FEATURE_ORDER`]
    pub fn assemble(input: &PatientInput, derived: &DerivedFeatures) -> Self {
        Self {
            values: FEATURE_ORDER.map(|f| f.extract(input, derived)),
        }
    }

    /// Value of a named feature
    #[inline]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Get as slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Single-row batch, shape `(1, FEATURE_COUNT)`
    pub fn to_batch(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| self.values[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(age: f64, bmi: f64) -> PatientInput {
        PatientInput {
            age,
            bmi,
            weight: 70.0,
            height: 170.0,
            systolic_bp: 120.0,
            family_history: 1,
            physical_activity: 1,
            diet_quality: 0.7,
            location: 0,
            smoking: 0,
        }
    }

    #[test]
    fn test_bmi_boundaries() {
        let bin = |v| bin_right_closed(v, &BMI_BIN_EDGES);
        assert_eq!(bin(18.5), 0);
        assert_eq!(bin(18.50001), 1);
        assert_eq!(bin(25.0), 1);
        assert_eq!(bin(25.00001), 2);
        assert_eq!(bin(30.0), 2);
        assert_eq!(bin(30.00001), 3);
        assert_eq!(bin(100.0), 3);
    }

    #[test]
    fn test_age_boundaries() {
        let bin = |v| bin_right_closed(v, &AGE_BIN_EDGES);
        assert_eq!(bin(30.0), 0);
        assert_eq!(bin(30.00001), 1);
        assert_eq!(bin(45.0), 1);
        assert_eq!(bin(45.00001), 2);
        assert_eq!(bin(60.0), 2);
        assert_eq!(bin(60.00001), 3);
    }

    #[test]
    fn test_out_of_bins() {
        for v in [0.0, -3.0, 100.00001, 250.0, f64::NAN, f64::INFINITY] {
            assert_eq!(bin_right_closed(v, &BMI_BIN_EDGES), OUT_OF_BINS, "bmi {v}");
            assert_eq!(bin_right_closed(v, &AGE_BIN_EDGES), OUT_OF_BINS, "age {v}");
        }
        assert_eq!(bin_right_closed(0.0001, &BMI_BIN_EDGES), 0);

        let derived = DerivedFeatures::derive(&patient(120.0, 24.0));
        assert_eq!(derived.age_group, OUT_OF_BINS);
        assert!(derived.has_out_of_bins());
    }

    #[test]
    fn test_derived_range() {
        let mut v = -10.0;
        while v < 120.0 {
            let derived = DerivedFeatures::derive(&patient(v, v));
            assert!((-1..=3).contains(&derived.bmi_category));
            assert!((-1..=3).contains(&derived.age_group));
            v += 0.25;
        }
    }

    #[test]
    fn test_assemble_reference_patient() {
        let input = patient(45.0, 24.9);
        let derived = DerivedFeatures::derive(&input);
        assert_eq!(derived, DerivedFeatures { bmi_category: 1, age_group: 1 });

        let fv = FeatureVector::assemble(&input, &derived);
        assert_eq!(
            fv.as_slice(),
            &[45.0, 24.9, 70.0, 170.0, 120.0, 1.0, 1.0, 0.7, 0.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(fv.get(Feature::DietQuality), 0.7);
        assert_eq!(fv.get(Feature::AgeGroup), 1.0);
    }

    #[test]
    fn test_feature_order_names() {
        assert_eq!(
            feature_names(),
            [
                "age", "bmi", "weight", "height", "systolic_bp", "family_history",
                "physical_activity", "diet_quality", "location", "smoking",
                "bmi_category", "age_group",
            ]
        );
        for (i, feature) in FEATURE_ORDER.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn test_to_batch_shape() {
        let input = patient(52.0, 31.0);
        let fv = FeatureVector::assemble(&input, &DerivedFeatures::derive(&input));
        let batch = fv.to_batch();
        assert_eq!(batch.dim(), (1, FEATURE_COUNT));
        assert_eq!(batch[[0, Feature::BmiCategory.index()]], 3.0);
        assert_eq!(batch[[0, Feature::AgeGroup.index()]], 2.0);
    }
}
