use serde::{Serialize, Deserialize};

use crate::layers::dense::{Dense, LayerGradients};
use crate::optim::{adam::Adam, sgd::Sgd};

/// A weight-update rule applied once per mini-batch.
pub trait Optimizer: Send {
    /// Called once per mini-batch, before the per-layer `step` calls.
    fn begin_batch(&mut self) {}

    /// Applies one update to the layer at `index` from batch-averaged gradients.
    fn step(&mut self, index: usize, layer: &mut Dense, grads: &LayerGradients);
}

/// Selects the optimizer in `TrainingConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
        }
    }
}
