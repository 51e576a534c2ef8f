use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::data::impute::{impute, ImputationTable};
use crate::data::loader::load_dataset;
use crate::data::record::Dataset;
use crate::data::scale::{scale, ScalingModel};
use crate::data::split::{stratified_split, Partitions, SplitConfig};
use crate::data::summary::{describe, histogram, ColumnSummary, Histogram};
use crate::error::Result;

/// Bins of the data histogram view.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Everything the load → impute → scale sequence produces.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedData {
    pub raw: Dataset,
    pub imputation: ImputationTable,
    pub imputed: Dataset,
    pub scaling: ScalingModel,
    pub scaled: Dataset,
}

/// Stateless service that owns the data pipeline steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataManager;

impl DataManager {
    pub fn new() -> DataManager {
        DataManager
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        load_dataset(path)
    }

    pub fn impute(&self, dataset: &Dataset) -> Result<(Dataset, ImputationTable)> {
        impute(dataset)
    }

    pub fn scale(&self, dataset: &Dataset) -> Result<(Dataset, ScalingModel)> {
        scale(dataset)
    }

    pub fn split(&self, scaled: &Dataset, config: &SplitConfig) -> Result<Partitions> {
        stratified_split(scaled, config)
    }

    pub fn prepare<P: AsRef<Path>>(&self, path: P) -> Result<PreparedData> {
        let raw = self.load(path)?;
        let (imputed, imputation) = self.impute(&raw)?;
        let (scaled, scaling) = self.scale(&imputed)?;

        let counts = raw.class_counts();
        info!(
            records = raw.len(),
            negative = counts[0],
            positive = counts[1],
            "data prepared"
        );

        Ok(PreparedData { raw, imputation, imputed, scaling, scaled })
    }

    pub fn describe(&self, dataset: &Dataset) -> Vec<ColumnSummary> {
        describe(dataset)
    }

    pub fn histogram(&self, dataset: &Dataset, column: &str) -> Result<Histogram> {
        histogram(dataset, column, DEFAULT_HISTOGRAM_BINS)
    }
}
