use serde::{Serialize, Deserialize};

/// One epoch of a training run: what `train_loop` sends on its progress
/// channel and what a `TrainingRun` keeps as history for its loss and
/// accuracy curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Starts at 1.
    pub epoch: usize,
    /// Epoch ceiling of the run, not the count early stopping ends up with.
    pub total_epochs: usize,
    /// Mean BCE over the training partition, dropout active.
    pub train_loss: f64,
    pub val_loss: Option<f64>,
    pub train_accuracy: f64,
    pub val_accuracy: Option<f64>,
    pub elapsed_ms: u64,
}

impl EpochStats {
    /// True for the epoch that reaches the configured ceiling.
    pub fn is_last(&self) -> bool {
        self.epoch == self.total_epochs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_last() {
        let mut stats = EpochStats {
            epoch: 3,
            total_epochs: 5,
            train_loss: 0.6,
            val_loss: None,
            train_accuracy: 0.7,
            val_accuracy: None,
            elapsed_ms: 1,
        };
        assert!(!stats.is_last());
        stats.epoch = 5;
        assert!(stats.is_last());
    }
}
