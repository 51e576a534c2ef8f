pub mod roc;
pub mod run;
pub mod manager;

pub use roc::{auc, roc_curve, RocCurve};
pub use run::{PartitionAccuracy, TrainingRun};
pub use manager::{ModelManager, ModelState, TrainOptions};
