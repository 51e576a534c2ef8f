use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::network::network::{Network, WeightSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingConfig {
    /// Epochs without improvement before training stops.
    pub patience: usize,
    /// Minimum decrease of the validation loss that counts as improvement.
    pub min_delta: f64,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        EarlyStoppingConfig { patience: 50, min_delta: 0.0 }
    }
}

/// Tracks the validation loss, remembers the best weights and decides when
/// to stop.
pub struct EarlyStopping {
    config: EarlyStoppingConfig,
    best_loss: f64,
    best_epoch: Option<usize>,
    best_weights: Option<WeightSnapshot>,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(config: EarlyStoppingConfig) -> Self {
        EarlyStopping {
            config,
            best_loss: f64::INFINITY,
            best_epoch: None,
            best_weights: None,
            wait: 0,
        }
    }

    /// Records the validation loss of the 0-based `epoch_index` and returns
    /// `true` once `patience` consecutive epochs failed to improve.
    pub fn observe(&mut self, epoch_index: usize, val_loss: f64, network: &Network) -> bool {
        if val_loss < self.best_loss - self.config.min_delta {
            self.best_loss = val_loss;
            self.best_epoch = Some(epoch_index);
            self.best_weights = Some(network.snapshot());
            self.wait = 0;
        } else {
            self.wait += 1;
        }
        self.wait >= self.config.patience
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    /// Restores the weights of the best epoch into `network`, if any epoch
    /// was observed.
    pub fn restore_best(self, network: &mut Network) {
        if let Some(weights) = self.best_weights {
            debug!(best_epoch = ?self.best_epoch, best_loss = self.best_loss, "restoring best weights");
            network.restore(weights);
        }
    }
}

/// 0-based index of the lowest validation loss, reported only when it lies
/// at least `patience` epochs before the `epochs` ceiling. A later minimum has
/// not been confirmed by a full patience window and yields `None`.
pub fn distinguished_best_epoch(val_losses: &[f64], patience: usize, epochs: usize) -> Option<usize> {
    let best = val_losses.iter()
        .enumerate()
        .filter(|(_, l)| !l.is_nan())
        .fold(None::<(usize, f64)>, |acc, (i, &l)| match acc {
            Some((_, best)) if best <= l => acc,
            _ => Some((i, l)),
        })
        .map(|(i, _)| i)?;
    if best + patience < epochs { Some(best) } else { None }
}
