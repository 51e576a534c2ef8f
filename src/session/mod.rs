pub mod parse;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use serde::{Serialize, Deserialize};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::data::manager::{DataManager, PreparedData};
use crate::data::split::SplitConfig;
use crate::error::{PipelineError, Result};
use crate::model::manager::{ModelManager, TrainOptions};
use crate::model::run::TrainingRun;
use crate::train::epoch_stats::EpochStats;

pub use parse::{parse_epochs, parse_epochs_or, parse_feature_values, parse_topology, DEFAULT_EPOCHS};

/// Raw values of the training form, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainForm {
    /// Comma-separated hidden-layer sizes; blank for no hidden layers.
    pub topology: String,
    /// Epoch count; blank for the configured default.
    pub epochs: String,
    pub linear: bool,
    pub dropout: bool,
    pub early_stopping: bool,
}

/// Visible state of the last training request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing has been trained yet.
    Idle,
    /// A run is in progress.
    Training { run: usize, total_epochs: usize },
    /// The last run finished; `was_stopped` when the stop flag ended it.
    Done { was_stopped: bool },
    /// The last request failed; the session stays usable.
    Failed { reason: String },
}

/// Owns the data pipeline, the model and the history of completed runs.
///
/// Every training request re-splits the prepared data. With a configured
/// seed the n-th run (0-based) uses `seed + n`, so runs differ from each
/// other yet a whole session is reproducible.
pub struct Session {
    config: PipelineConfig,
    data_manager: DataManager,
    model_manager: ModelManager,
    data: Option<PreparedData>,
    status: SessionStatus,
    runs: Vec<TrainingRun>,
}

impl Session {
    pub fn new(config: PipelineConfig) -> Result<Session> {
        config.validate()?;
        let model_manager = match config.split.seed {
            Some(seed) => ModelManager::with_seed(config.training.clone(), seed)?,
            None => ModelManager::new(config.training.clone())?,
        };
        Ok(Session {
            config,
            data_manager: DataManager::new(),
            model_manager,
            data: None,
            status: SessionStatus::Idle,
            runs: Vec::new(),
        })
    }

    /// Loads, imputes and scales the dataset at `path`, replacing any data
    /// loaded before.
    ///
    /// A new dataset brings a new scaling model, so the current network and
    /// the run history are discarded with the old data. A failed load keeps
    /// everything as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<&PreparedData> {
        let prepared = self.data_manager.prepare(path)?;
        if self.data.is_some() {
            info!("Dataset replaced; discarding the model and {} runs", self.runs.len());
        }
        self.model_manager.reset();
        self.runs.clear();
        self.status = SessionStatus::Idle;
        Ok(self.data.insert(prepared))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn data_manager(&self) -> &DataManager {
        &self.data_manager
    }

    pub fn model_manager(&self) -> &ModelManager {
        &self.model_manager
    }

    pub fn data(&self) -> Option<&PreparedData> {
        self.data.as_ref()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Completed runs, oldest first.
    pub fn runs(&self) -> &[TrainingRun] {
        &self.runs
    }

    pub fn clear_runs(&mut self) {
        self.runs.clear();
    }

    /// Parses the form, trains a freshly built model on a fresh split and
    /// records the run.
    pub fn train_from_form(&mut self, form: &TrainForm) -> Result<&TrainingRun> {
        self.train_with_progress(form, None, None)
    }

    /// Like `train_from_form`, reporting every epoch on `progress_tx` and
    /// checking `stop_flag` between epochs.
    pub fn train_with_progress(
        &mut self,
        form: &TrainForm,
        progress_tx: Option<mpsc::Sender<EpochStats>>,
        stop_flag: Option<Arc<AtomicBool>>,
    ) -> Result<&TrainingRun> {
        match self.run_training(form, progress_tx, stop_flag) {
            Ok(run) => {
                info!("{}", run.label());
                self.status = SessionStatus::Done { was_stopped: run.was_stopped };
                self.runs.push(run);
                Ok(&self.runs[self.runs.len() - 1])
            }
            Err(e) => {
                if e.is_input_error() {
                    warn!("Training request rejected: {}", e);
                } else {
                    error!("Training failed: {}", e);
                }
                self.status = SessionStatus::Failed { reason: e.to_string() };
                Err(e)
            }
        }
    }

    fn run_training(
        &mut self,
        form: &TrainForm,
        progress_tx: Option<mpsc::Sender<EpochStats>>,
        stop_flag: Option<Arc<AtomicBool>>,
    ) -> Result<TrainingRun> {
        let topology = parse_topology(&form.topology)?;
        let epochs = parse_epochs_or(&form.epochs, self.config.training.epochs)?;
        let data = self.data.as_ref().ok_or_else(|| {
            PipelineError::InsufficientData("no dataset loaded".into())
        })?;

        let split = self.split_config_for_run(self.runs.len());
        let partitions = self.data_manager.split(&data.scaled, &split)?;

        self.status = SessionStatus::Training { run: self.runs.len(), total_epochs: epochs };
        self.model_manager.build_model(&topology, !form.linear, form.dropout)?;
        let options = TrainOptions {
            epochs,
            early_stopping: form.early_stopping,
            progress_tx,
            stop_flag,
        };
        self.model_manager.train(&partitions.training, &partitions.validation, &partitions.testing, options)
    }

    fn split_config_for_run(&self, run: usize) -> SplitConfig {
        SplitConfig {
            seed: self.config.split.seed.map(|s| s.wrapping_add(run as u64)),
            ..self.config.split.clone()
        }
    }

    /// Parses one string per feature and returns P(positive) from the
    /// current trained model.
    pub fn predict_from_form<S: AsRef<str>>(&self, fields: &[S]) -> Result<f64> {
        let values = parse_feature_values(fields)?;
        let data = self.data.as_ref().ok_or(PipelineError::ModelNotBuilt)?;
        self.model_manager.predict(&values, &data.scaling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_without_data_fails_visibly() {
        let mut session = Session::new(PipelineConfig::default()).unwrap();
        assert_eq!(session.status(), &SessionStatus::Idle);

        let form = TrainForm { topology: "8,4".into(), ..TrainForm::default() };
        assert!(session.train_from_form(&form).is_err());
        assert!(matches!(session.status(), SessionStatus::Failed { .. }));
        assert!(session.runs().is_empty());
    }

    #[test]
    fn test_bad_topology_sets_failed_status() {
        let mut session = Session::new(PipelineConfig::default()).unwrap();
        let form = TrainForm { topology: "a,b".into(), ..TrainForm::default() };
        let err = session.train_from_form(&form).unwrap_err();
        assert!(err.is_input_error());
        match session.status() {
            SessionStatus::Failed { reason } => assert!(reason.contains("a,b")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_per_run_seeds() {
        let mut config = PipelineConfig::default();
        config.split.seed = Some(u64::MAX);
        let session = Session::new(config).unwrap();
        assert_eq!(session.split_config_for_run(0).seed, Some(u64::MAX));
        assert_eq!(session.split_config_for_run(1).seed, Some(0));
        assert_eq!(session.split_config_for_run(1).test_fraction, 0.1);
    }

    #[test]
    fn test_predict_without_model() {
        let session = Session::new(PipelineConfig::default()).unwrap();
        let fields = ["1"; 8];
        assert!(matches!(session.predict_from_form(&fields), Err(PipelineError::ModelNotBuilt)));
        assert!(matches!(
            session.predict_from_form(&["x"]),
            Err(PipelineError::InvalidFeatureValue(_))
        ));
    }
}
