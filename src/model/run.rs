use serde::{Serialize, Deserialize};

use crate::model::roc::RocCurve;
use crate::train::epoch_stats::EpochStats;

/// Accuracy of the trained model on each partition, as fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionAccuracy {
    pub training: f64,
    pub validation: f64,
    pub testing: f64,
    /// Testing followed by validation.
    pub holdout: f64,
}

/// Immutable result of one build-and-train cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    /// Hidden-layer sizes in order; empty for a plain logistic model.
    pub topology: Vec<usize>,
    /// Hidden layers used the identity activation instead of ReLU.
    pub linear: bool,
    pub dropout: bool,
    pub early_stopping: bool,
    pub configured_epochs: usize,
    /// Epochs actually run; lower than configured when training stopped early.
    pub realized_epochs: usize,
    pub history: Vec<EpochStats>,
    pub accuracy: PartitionAccuracy,
    /// ROC curve of the holdout probabilities.
    pub roc: RocCurve,
    pub auc: f64,
    /// 0-based epoch of the lowest validation loss, when confirmed by a full
    /// patience window before the epoch ceiling.
    pub best_epoch: Option<usize>,
    /// Training was interrupted by the stop flag.
    pub was_stopped: bool,
}

impl TrainingRun {
    /// Legend text for ROC overlays, e.g.
    /// `[8, 4] e(50) -> acc(0.50, 77.92%) / AUC(0.84)`.
    pub fn label(&self) -> String {
        let epochs = self.best_epoch.unwrap_or(self.configured_epochs);
        let mut label = if self.topology.is_empty() {
            format!("no hidden layers e({}", epochs)
        } else {
            format!("{:?} e({}", self.topology, epochs)
        };
        label.push_str(if self.linear {
            ")/l"
        } else if self.dropout {
            ")/d"
        } else {
            ")"
        });
        label.push_str(&format!(
            " -> acc(0.50, {:.2}%) / AUC({:.2})",
            self.accuracy.holdout * 100.0,
            self.auc
        ));
        label
    }

    /// Training and validation loss per epoch, for the loss plot.
    pub fn loss_curves(&self) -> (Vec<f64>, Vec<Option<f64>>) {
        self.history.iter().map(|s| (s.train_loss, s.val_loss)).unzip()
    }

    /// Training and validation accuracy per epoch, for the accuracy plot.
    pub fn accuracy_curves(&self) -> (Vec<f64>, Vec<Option<f64>>) {
        self.history.iter().map(|s| (s.train_accuracy, s.val_accuracy)).unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(topology: Vec<usize>, linear: bool, dropout: bool, best_epoch: Option<usize>) -> TrainingRun {
        TrainingRun {
            topology,
            linear,
            dropout,
            early_stopping: best_epoch.is_some(),
            configured_epochs: 50,
            realized_epochs: 50,
            history: Vec::new(),
            accuracy: PartitionAccuracy { training: 0.8, validation: 0.75, testing: 0.8, holdout: 0.7792 },
            roc: RocCurve { fpr: vec![0.0, 1.0], tpr: vec![0.0, 1.0], thresholds: vec![2.0, 1.0] },
            auc: 0.8412,
            best_epoch,
            was_stopped: false,
        }
    }

    #[test]
    fn test_label_formats() {
        assert_eq!(run(vec![8, 4], false, false, None).label(), "[8, 4] e(50) -> acc(0.50, 77.92%) / AUC(0.84)");
        assert_eq!(run(vec![], false, false, None).label(), "no hidden layers e(50) -> acc(0.50, 77.92%) / AUC(0.84)");
        assert_eq!(run(vec![12], true, true, None).label(), "[12] e(50)/l -> acc(0.50, 77.92%) / AUC(0.84)");
        assert_eq!(run(vec![12], false, true, Some(17)).label(), "[12] e(17)/d -> acc(0.50, 77.92%) / AUC(0.84)");
    }
}
