use serde::{Serialize, Deserialize};

pub const NUM_FEATURES: usize = 8;

/// Name of the label column in the source file.
pub const OUTCOME_COLUMN: &str = "Outcome";

/// Feature columns of the Pima Indians diabetes dataset, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

impl Feature {
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
        Feature::DiabetesPedigreeFunction,
        Feature::Age,
    ];

    /// Fields where a recorded zero is a missing measurement, not a reading.
    pub const ZERO_AS_MISSING: [Feature; 5] = [
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "BloodPressure",
            Feature::SkinThickness => "SkinThickness",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::DiabetesPedigreeFunction => "DiabetesPedigreeFunction",
            Feature::Age => "Age",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.column_name() == name)
    }

    pub fn zero_means_missing(self) -> bool {
        Feature::ZERO_AS_MISSING.contains(&self)
    }
}

/// Expected header of the source file.
pub fn expected_header() -> Vec<&'static str> {
    Feature::ALL.iter()
        .map(|f| f.column_name())
        .chain(std::iter::once(OUTCOME_COLUMN))
        .collect()
}

/// Binary diagnosis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Negative,
    Positive,
}

impl Outcome {
    pub const BOTH: [Outcome; 2] = [Outcome::Negative, Outcome::Positive];

    pub fn from_value(value: f64) -> Option<Outcome> {
        if value == 0.0 {
            Some(Outcome::Negative)
        } else if value == 1.0 {
            Some(Outcome::Positive)
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_f64(self) -> f64 {
        self.index() as f64
    }
}

/// One subject: eight measurements plus the outcome.
///
/// `id` is the 0-based data row in the source file and survives every
/// transform, so partitions can be traced back to the source rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: usize,
    pub features: [f64; NUM_FEATURES],
    pub outcome: Outcome,
}

impl Record {
    pub fn get(&self, feature: Feature) -> f64 {
        self.features[feature.index()]
    }
}

/// Ordered, immutable collection of records. Transforms build new datasets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Dataset {
        Dataset { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per outcome, indexed by `Outcome::index`.
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.records)
    }

    pub fn column(&self, feature: Feature) -> Vec<f64> {
        self.records.iter().map(|r| r.get(feature)).collect()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.outcome.as_f64()).collect()
    }

    /// Applies `f` to every feature row, keeping ids and outcomes.
    pub fn map_features<F>(&self, f: F) -> Dataset
    where
        F: Fn(&Record) -> [f64; NUM_FEATURES],
    {
        Dataset {
            records: self.records.iter()
                .map(|r| Record { id: r.id, features: f(r), outcome: r.outcome })
                .collect(),
        }
    }
}

pub(crate) fn class_counts(records: &[Record]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for r in records {
        counts[r.outcome.index()] += 1;
    }
    counts
}
