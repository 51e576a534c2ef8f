use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::train::early_stopping::EarlyStoppingConfig;
use crate::train::epoch_stats::EpochStats;

/// Settings for one `train_loop` call, assembled by `ModelManager::train`
/// from the pipeline's `TrainingConfig` and the request's options.
///
/// A dropped `progress_tx` receiver ends the loop like a raised `stop_flag`.
/// Both are checked once per epoch.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub early_stopping: Option<EarlyStoppingConfig>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// No early stopping, no progress channel, no stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            early_stopping: None,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
