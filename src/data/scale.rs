use serde::{Serialize, Deserialize};

use crate::data::record::{Dataset, NUM_FEATURES};
use crate::error::{PipelineError, Result};

/// Per-feature standardization fit over the whole imputed dataset.
///
/// Only the eight feature columns are modelled. Standardization treats
/// columns independently, so the outcome column's statistics could never
/// influence a feature's transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingModel {
    pub means: [f64; NUM_FEATURES],
    /// Population standard deviation; 1.0 for constant columns.
    pub scales: [f64; NUM_FEATURES],
}

impl ScalingModel {
    pub fn fit(dataset: &Dataset) -> Result<ScalingModel> {
        if dataset.is_empty() {
            return Err(PipelineError::InsufficientData("cannot fit scaling on an empty dataset".into()));
        }
        let n = dataset.len() as f64;

        let mut means = [0.0; NUM_FEATURES];
        for record in dataset.records() {
            for (m, v) in means.iter_mut().zip(record.features.iter()) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = [0.0; NUM_FEATURES];
        for record in dataset.records() {
            for ((s, v), m) in scales.iter_mut().zip(record.features.iter()).zip(means.iter()) {
                *s += (v - m).powi(2);
            }
        }
        for s in scales.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > 0.0 { std } else { 1.0 };
        }

        Ok(ScalingModel { means, scales })
    }

    pub fn transform_features(&self, features: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            out[i] = (features[i] - self.means[i]) / self.scales[i];
        }
        out
    }

    pub fn transform(&self, dataset: &Dataset) -> Dataset {
        dataset.map_features(|r| self.transform_features(&r.features))
    }

    /// Scales one raw input vector for inference.
    pub fn transform_raw(&self, raw: &[f64]) -> Result<[f64; NUM_FEATURES]> {
        let features: [f64; NUM_FEATURES] = raw.try_into()
            .map_err(|_| PipelineError::Shape { expected: NUM_FEATURES, actual: raw.len() })?;
        Ok(self.transform_features(&features))
    }
}

/// Fits a scaling model on `dataset` and returns the scaled copy with it.
pub fn scale(dataset: &Dataset) -> Result<(Dataset, ScalingModel)> {
    let model = ScalingModel::fit(dataset)?;
    Ok((model.transform(dataset), model))
}
