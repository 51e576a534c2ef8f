use serde::{Serialize, Deserialize};

use crate::data::record::{Dataset, Feature, OUTCOME_COLUMN};
use crate::error::{PipelineError, Result};

/// Descriptive statistics of one column, as shown in the data table view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 in the denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Equal-width histogram of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub column: String,
    /// `counts.len() + 1` bin edges; the last bin includes its right edge.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Quantile of already sorted values with linear interpolation between
/// closest ranks. `None` for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median of unsorted values; the mean of the two middle values for an
/// even count.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile(&sorted, 0.5)
}

fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = if n > 0 { values.iter().sum::<f64>() / n as f64 } else { f64::NAN };
    let std = if n > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    let q = |p: f64| quantile(&sorted, p).unwrap_or(f64::NAN);

    ColumnSummary {
        name: name.to_string(),
        count: n,
        mean,
        std,
        min: q(0.0),
        q25: q(0.25),
        median: q(0.5),
        q75: q(0.75),
        max: q(1.0),
    }
}

/// One summary per feature column followed by the outcome column.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    let mut summaries: Vec<ColumnSummary> = Feature::ALL.iter()
        .map(|&f| summarize(f.column_name(), &dataset.column(f)))
        .collect();
    summaries.push(summarize(OUTCOME_COLUMN, &dataset.labels()));
    summaries
}

/// Values of a column addressed by its header name.
pub fn column_by_name(dataset: &Dataset, column: &str) -> Result<Vec<f64>> {
    if column == OUTCOME_COLUMN {
        return Ok(dataset.labels());
    }
    Feature::from_column_name(column)
        .map(|f| dataset.column(f))
        .ok_or_else(|| PipelineError::UnknownColumn(column.to_string()))
}

/// Equal-width histogram over the column's range. A constant column gets
/// the range `value ± 0.5`.
pub fn histogram(dataset: &Dataset, column: &str, bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(PipelineError::Config("histogram needs at least one bin".into()));
    }
    let values = column_by_name(dataset, column)?;
    if values.is_empty() {
        return Err(PipelineError::InsufficientData(format!("column {} is empty", column)));
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { column: column.to_string(), edges, counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::{Outcome, Record};

    fn dataset(glucose: &[f64]) -> Dataset {
        Dataset::new(glucose.iter().enumerate().map(|(id, &g)| {
            let mut features = [1.0; 8];
            features[Feature::Glucose.index()] = g;
            Record { id, features, outcome: if id % 2 == 0 { Outcome::Negative } else { Outcome::Positive } }
        }).collect())
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_describe_quartiles() {
        let summary = describe(&dataset(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let glucose = &summary[Feature::Glucose.index()];
        assert_eq!(glucose.name, "Glucose");
        assert_eq!(glucose.count, 5);
        assert_eq!(glucose.mean, 3.0);
        assert_eq!(glucose.q25, 2.0);
        assert_eq!(glucose.q75, 4.0);
        assert!((glucose.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.last().unwrap().name, "Outcome");
    }

    #[test]
    fn test_histogram_bins() {
        let hist = histogram(&dataset(&[0.0, 1.0, 2.0, 10.0]), "Glucose", 10).unwrap();
        assert_eq!(hist.edges.len(), 11);
        assert_eq!(hist.counts.iter().sum::<usize>(), 4);
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[9], 1);

        let constant = histogram(&dataset(&[3.0, 3.0]), "Glucose", 2).unwrap();
        assert_eq!(constant.edges, vec![2.5, 3.0, 3.5]);

        assert!(matches!(histogram(&dataset(&[1.0]), "Sugar", 10), Err(PipelineError::UnknownColumn(_))));
    }
}
