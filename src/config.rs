use std::path::Path;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::split::SplitConfig;
use crate::error::{PipelineError, Result};
use crate::optim::optimizer::OptimizerKind;

/// Hyperparameters shared by every run of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Epochs used when the epoch field is left blank.
    pub epochs: usize,
    pub batch_size: usize,
    /// Early-stopping patience in epochs.
    pub patience: usize,
    pub dropout_rate: f64,
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
}

impl TrainingConfig {
    /// Rejects values that would make building or training a network panic.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PipelineError::Config("training.epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::Config("training.batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(PipelineError::Config(format!("training.dropout_rate must be in [0, 1), got {}", self.dropout_rate)));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PipelineError::Config(format!("training.learning_rate must be positive, got {}", self.learning_rate)));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 50,
            batch_size: 1,
            patience: 50,
            dropout_rate: 0.5,
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.001,
        }
    }
}

/// Top-level configuration, loadable from a JSON file. Missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub split: SplitConfig,
    pub training: TrainingConfig,
}

impl PipelineConfig {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let config: PipelineConfig = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.training.validate()
    }
}
