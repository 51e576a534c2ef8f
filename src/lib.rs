//! Feed-forward network training and evaluation on the Pima Indians diabetes
//! dataset.
//!
//! The data pipeline (`data`) loads the table, fills zero-coded missing
//! measurements with class-conditional medians, standardizes the features and
//! produces stratified training, validation and testing partitions. The model
//! layer (`model`) builds a small dense network from scratch, trains it with
//! optional dropout and early stopping, and reports accuracies, the ROC curve
//! and AUC on the holdout set. `session` ties both together behind the plain
//! strings of a training form.
//!
//! ```no_run
//! use pima_nn::{PipelineConfig, Session, TrainForm};
//!
//! let mut session = Session::new(PipelineConfig::default())?;
//! session.load("data/diabetes.csv")?;
//! let run = session.train_from_form(&TrainForm {
//!     topology: "8,4".into(),
//!     epochs: "50".into(),
//!     early_stopping: true,
//!     ..TrainForm::default()
//! })?;
//! println!("{}", run.label());
//! # Ok::<(), pima_nn::PipelineError>(())
//! ```

pub mod error;
pub mod config;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;
pub mod model;
pub mod session;
pub mod cli;

// Convenience re-exports
pub use error::{PipelineError, Result};
pub use config::{PipelineConfig, TrainingConfig};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use network::{Network, NetworkSpec};
pub use optim::OptimizerKind;
pub use train::EpochStats;
pub use data::{DataManager, Dataset, PreparedData, ScalingModel, SplitConfig};
pub use model::{ModelManager, RocCurve, TrainOptions, TrainingRun};
pub use session::{Session, SessionStatus, TrainForm};
