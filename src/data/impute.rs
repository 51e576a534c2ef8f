use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::record::{Dataset, Feature, Outcome};
use crate::data::summary::median;
use crate::error::{PipelineError, Result};

/// Class-conditional medians of the zero-as-missing fields, computed from
/// present (non-zero) values only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationTable {
    /// Per field: `[median for Negative, median for Positive]`.
    medians: BTreeMap<Feature, [f64; 2]>,
}

impl ImputationTable {
    /// Computes the table from `dataset` before anything is overwritten.
    ///
    /// Fails with `InsufficientData` when a class has no present value for a
    /// field, since its median is undefined.
    pub fn compute(dataset: &Dataset) -> Result<ImputationTable> {
        let mut medians = BTreeMap::new();
        for feature in Feature::ZERO_AS_MISSING {
            let mut per_class = [0.0; 2];
            for outcome in Outcome::BOTH {
                let present: Vec<f64> = dataset.records().iter()
                    .filter(|r| r.outcome == outcome)
                    .map(|r| r.get(feature))
                    .filter(|&v| v != 0.0)
                    .collect();
                per_class[outcome.index()] = median(&present).ok_or_else(|| {
                    PipelineError::InsufficientData(format!(
                        "no present {} values for outcome {}",
                        feature.column_name(),
                        outcome.index()
                    ))
                })?;
            }
            debug!(
                field = feature.column_name(),
                negative = per_class[0],
                positive = per_class[1],
                "class-conditional median"
            );
            medians.insert(feature, per_class);
        }
        Ok(ImputationTable { medians })
    }

    /// Median of `feature` within `outcome`, for the zero-as-missing fields.
    pub fn median(&self, feature: Feature, outcome: Outcome) -> Option<f64> {
        self.medians.get(&feature).map(|m| m[outcome.index()])
    }

    /// Replaces every missing (zero) value with the median for the record's
    /// own outcome.
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        dataset.map_features(|record| {
            let mut features = record.features;
            for (&feature, per_class) in &self.medians {
                let value = &mut features[feature.index()];
                if *value == 0.0 {
                    *value = per_class[record.outcome.index()];
                }
            }
            features
        })
    }
}

/// Class-conditional median imputation of the zero-as-missing fields.
pub fn impute(dataset: &Dataset) -> Result<(Dataset, ImputationTable)> {
    let table = ImputationTable::compute(dataset)?;
    let imputed = table.apply(dataset);
    Ok((imputed, table))
}
