use rand::{Rng, SeedableRng};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::record::{class_counts, Dataset, Record};
use crate::error::{PipelineError, Result};

/// Fractions and seed of the stratified train/validation/test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of the whole dataset held out as the testing partition.
    pub test_fraction: f64,
    /// Share of the remainder held out as the validation partition.
    pub validation_fraction: f64,
    /// Fixed seed for a reproducible split; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig { test_fraction: 0.1, validation_fraction: 0.2, seed: None }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("test_fraction", self.test_fraction), ("validation_fraction", self.validation_fraction)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(PipelineError::Config(format!("{} must be in (0, 1), got {}", name, value)));
            }
        }
        Ok(())
    }

    /// Seeded generator for this split, or one seeded from entropy.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Training,
    Validation,
    Testing,
    Holdout,
}

impl PartitionKind {
    pub fn name(self) -> &'static str {
        match self {
            PartitionKind::Training => "training",
            PartitionKind::Validation => "validation",
            PartitionKind::Testing => "testing",
            PartitionKind::Holdout => "holdout",
        }
    }
}

/// A named slice of the scaled dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub kind: PartitionKind,
    pub records: Vec<Record>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature matrix, one row per record.
    pub fn inputs(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.features.to_vec()).collect()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.outcome.as_f64()).collect()
    }

    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.records)
    }

    pub fn ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partitions {
    pub training: Partition,
    pub validation: Partition,
    pub testing: Partition,
}

impl Partitions {
    /// Testing records followed by validation records.
    pub fn holdout(&self) -> Partition {
        holdout(&self.testing, &self.validation)
    }
}

/// Concatenates `testing` and `validation` into the holdout partition.
pub fn holdout(testing: &Partition, validation: &Partition) -> Partition {
    let records = testing.records.iter()
        .chain(validation.records.iter())
        .cloned()
        .collect();
    Partition { kind: PartitionKind::Holdout, records }
}

/// Splits `dataset` into training, validation and testing partitions, each
/// stratified by outcome.
pub fn stratified_split(dataset: &Dataset, config: &SplitConfig) -> Result<Partitions> {
    config.validate()?;
    let mut rng = config.rng();

    let (rest, testing) = split_off(dataset.records(), config.test_fraction, &mut rng);
    let (training, validation) = split_off(&rest, config.validation_fraction, &mut rng);

    let partitions = Partitions {
        training: Partition { kind: PartitionKind::Training, records: training },
        validation: Partition { kind: PartitionKind::Validation, records: validation },
        testing: Partition { kind: PartitionKind::Testing, records: testing },
    };

    for p in [&partitions.training, &partitions.validation, &partitions.testing] {
        let counts = p.class_counts();
        debug!(partition = p.kind.name(), negative = counts[0], positive = counts[1], "split");
        if counts.contains(&0) {
            return Err(PipelineError::InsufficientData(format!(
                "{} partition would hold {} negative and {} positive records",
                p.kind.name(), counts[0], counts[1]
            )));
        }
    }
    Ok(partitions)
}

/// Shuffles `records` and moves `ceil(fraction * n)` of them, apportioned
/// across classes, into the second returned vector.
fn split_off<R: Rng + ?Sized>(records: &[Record], fraction: f64, rng: &mut R) -> (Vec<Record>, Vec<Record>) {
    let n = records.len();
    let n_held = ((fraction * n as f64).ceil() as usize).min(n);
    let allocation = allocate(class_counts(records), n_held);

    let mut kept = Vec::with_capacity(n - n_held);
    let mut held = Vec::with_capacity(n_held);
    for (class, &take) in allocation.iter().enumerate() {
        let mut members: Vec<&Record> = records.iter()
            .filter(|r| r.outcome.index() == class)
            .collect();
        members.shuffle(rng);
        held.extend(members[..take].iter().map(|&r| r.clone()));
        kept.extend(members[take..].iter().map(|&r| r.clone()));
    }
    kept.shuffle(rng);
    held.shuffle(rng);
    (kept, held)
}

/// Per-class share of `total` proportional to `counts`, largest remainder
/// first; ties go to the lower class index.
fn allocate(counts: [usize; 2], total: usize) -> [usize; 2] {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return [0, 0];
    }
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * total as f64 / n as f64).collect();
    let mut alloc = [exact[0].floor() as usize, exact[1].floor() as usize];

    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    let mut remaining = total - alloc.iter().sum::<usize>();
    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[class] < counts[class] {
            alloc[class] += 1;
            remaining -= 1;
        }
    }
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Outcome;
    use std::collections::BTreeSet;

    fn dataset(negatives: usize, positives: usize) -> Dataset {
        Dataset::new((0..negatives + positives).map(|id| Record {
            id,
            features: [id as f64; 8],
            outcome: if id < negatives { Outcome::Negative } else { Outcome::Positive },
        }).collect())
    }

    fn seeded(seed: u64) -> SplitConfig {
        SplitConfig { seed: Some(seed), ..SplitConfig::default() }
    }

    #[test]
    fn test_allocation_largest_remainder() {
        assert_eq!(allocate([500, 268], 77), [50, 27]);
        assert_eq!(allocate([10, 10], 2), [1, 1]);
        assert_eq!(allocate([3, 1], 1), [1, 0]);
    }

    #[test]
    fn test_partitions_cover_dataset_once() {
        let data = dataset(500, 268);
        let parts = stratified_split(&data, &seeded(42)).unwrap();

        assert_eq!(parts.testing.len(), 77);
        assert_eq!(parts.validation.len(), 139);
        assert_eq!(parts.training.len(), 552);

        let mut ids: Vec<usize> = parts.training.ids();
        ids.extend(parts.validation.ids());
        ids.extend(parts.testing.ids());
        let unique: BTreeSet<usize> = ids.iter().copied().collect();
        assert_eq!(ids.len(), data.len());
        assert_eq!(unique, (0..data.len()).collect());
    }

    #[test]
    fn test_class_proportions_preserved() {
        let data = dataset(500, 268);
        let parts = stratified_split(&data, &seeded(1)).unwrap();
        let overall = 268.0 / 768.0;
        for p in [&parts.training, &parts.validation, &parts.testing] {
            let counts = p.class_counts();
            let share = counts[1] as f64 / p.len() as f64;
            assert!((share - overall).abs() < 0.02, "{:?} share {}", p.kind, share);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let data = dataset(30, 20);
        let a = stratified_split(&data, &seeded(9)).unwrap();
        let b = stratified_split(&data, &seeded(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_holdout_is_testing_then_validation() {
        let parts = stratified_split(&dataset(30, 20), &seeded(3)).unwrap();
        let holdout = parts.holdout();
        let mut expected = parts.testing.ids();
        expected.extend(parts.validation.ids());
        assert_eq!(holdout.ids(), expected);
        assert_eq!(holdout.kind, PartitionKind::Holdout);
    }

    #[test]
    fn test_too_few_records_of_a_class() {
        let err = stratified_split(&dataset(30, 1), &seeded(0)).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn test_invalid_fraction() {
        let config = SplitConfig { test_fraction: 1.0, ..SplitConfig::default() };
        assert!(matches!(stratified_split(&dataset(5, 5), &config), Err(PipelineError::Config(_))));
    }
}
