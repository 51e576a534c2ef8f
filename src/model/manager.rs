use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::activation::activation::ActivationFunction;
use crate::config::TrainingConfig;
use crate::data::record::NUM_FEATURES;
use crate::data::scale::ScalingModel;
use crate::data::split::{holdout, Partition};
use crate::error::{PipelineError, Result};
use crate::model::roc::roc_curve;
use crate::model::run::{PartitionAccuracy, TrainingRun};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::early_stopping::{distinguished_best_epoch, EarlyStoppingConfig};
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::{evaluate, predict_proba, train_loop};
use crate::train::train_config::TrainConfig;

/// Per-run training options.
///
/// # Fields
/// - `epochs`         — epoch ceiling of this run
/// - `early_stopping` — stop on a validation-loss plateau and keep the best weights
/// - `progress_tx`    — receives one `EpochStats` per completed epoch
/// - `stop_flag`      — checked between epochs; `true` ends the run
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub early_stopping: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainOptions {
    pub fn new(epochs: usize) -> TrainOptions {
        TrainOptions { epochs, early_stopping: false, progress_tx: None, stop_flag: None }
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions::new(TrainingConfig::default().epochs)
    }
}

/// Lifecycle of the managed model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unbuilt,
    Built,
    Trained,
}

#[derive(Debug)]
struct ManagedModel {
    spec: NetworkSpec,
    network: Network,
    linear: bool,
    trained: bool,
}

/// Builds, trains, evaluates and queries one network at a time.
///
/// `build_model` always replaces the current network, so a trained model is
/// retrained by building it again.
#[derive(Debug)]
pub struct ModelManager {
    config: TrainingConfig,
    rng: ChaCha8Rng,
    model: Option<ManagedModel>,
}

impl ModelManager {
    /// Manager drawing initial weights, shuffles and dropout masks from
    /// entropy. Fails with `Config` if `config` does not validate.
    pub fn new(config: TrainingConfig) -> Result<ModelManager> {
        config.validate()?;
        Ok(ModelManager { config, rng: ChaCha8Rng::from_entropy(), model: None })
    }

    pub fn with_seed(config: TrainingConfig, seed: u64) -> Result<ModelManager> {
        config.validate()?;
        Ok(ModelManager { config, rng: ChaCha8Rng::seed_from_u64(seed), model: None })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn state(&self) -> ModelState {
        match &self.model {
            None => ModelState::Unbuilt,
            Some(m) if m.trained => ModelState::Trained,
            Some(_) => ModelState::Built,
        }
    }

    /// Drops the current model, trained or not.
    pub fn reset(&mut self) {
        if self.model.take().is_some() {
            debug!("model discarded");
        }
    }

    pub fn network(&self) -> Option<&Network> {
        self.model.as_ref().map(|m| &m.network)
    }

    pub fn spec(&self) -> Option<&NetworkSpec> {
        self.model.as_ref().map(|m| &m.spec)
    }

    /// Builds a fresh binary classifier over the eight features, discarding
    /// any previous model.
    pub fn build_model(
        &mut self,
        hidden_layer_sizes: &[usize],
        use_non_linear_activation: bool,
        use_dropout: bool,
    ) -> Result<()> {
        let activation = ActivationFunction::hidden(use_non_linear_activation);
        let dropout_rate = use_dropout.then_some(self.config.dropout_rate);
        let spec = NetworkSpec::binary_classifier(NUM_FEATURES, hidden_layer_sizes, activation, dropout_rate)?;
        let network = Network::from_spec(&spec, &mut self.rng);

        info!(
            topology = ?hidden_layer_sizes,
            activation = activation.name(),
            dropout = use_dropout,
            "model built"
        );
        for (i, layer) in spec.layers.iter().enumerate() {
            debug!(
                layer = i + 1,
                inputs = layer.input_size,
                units = layer.size,
                activation = layer.activation.name(),
                dropout = ?layer.dropout,
                "layer"
            );
        }

        self.model = Some(ManagedModel {
            spec,
            network,
            linear: !use_non_linear_activation,
            trained: false,
        });
        Ok(())
    }

    /// Fits the built model on `training`, monitoring `validation`, then
    /// evaluates every partition and the holdout (`testing` then
    /// `validation`).
    pub fn train(
        &mut self,
        training: &Partition,
        validation: &Partition,
        testing: &Partition,
        options: TrainOptions,
    ) -> Result<TrainingRun> {
        let model = match self.model.as_mut() {
            None => return Err(PipelineError::ModelNotBuilt),
            Some(m) if m.trained => return Err(PipelineError::AlreadyTrained),
            Some(m) => m,
        };
        if options.epochs == 0 {
            return Err(PipelineError::InvalidEpochs(options.epochs.to_string()));
        }
        if training.is_empty() {
            return Err(PipelineError::InsufficientData("training partition is empty".into()));
        }
        let holdout_set = holdout(testing, validation);
        if holdout_set.class_counts().contains(&0) {
            return Err(PipelineError::InsufficientData(
                "holdout (testing & validation) needs both outcomes for the ROC curve".into(),
            ));
        }

        info!(
            training = training.len(),
            validation = validation.len(),
            testing = testing.len(),
            epochs = options.epochs,
            early_stopping = options.early_stopping,
            "training network"
        );

        let early_stopping = options.early_stopping.then_some(EarlyStoppingConfig {
            patience: self.config.patience,
            min_delta: 0.0,
        });
        let train_config = TrainConfig {
            epochs: options.epochs,
            batch_size: self.config.batch_size,
            early_stopping,
            progress_tx: options.progress_tx,
            stop_flag: options.stop_flag,
        };
        let mut optimizer = self.config.optimizer.build(self.config.learning_rate);

        let train_inputs = training.inputs();
        let train_labels = training.labels();
        let val_inputs = validation.inputs();
        let val_labels = validation.labels();

        let outcome = train_loop(
            &mut model.network,
            &train_inputs,
            &train_labels,
            &val_inputs,
            &val_labels,
            optimizer.as_mut(),
            &train_config,
            &mut self.rng,
        );

        let best_epoch = if options.early_stopping {
            let val_losses: Vec<f64> = outcome.history.iter().filter_map(|s| s.val_loss).collect();
            distinguished_best_epoch(&val_losses, self.config.patience, options.epochs)
        } else {
            None
        };

        let network = &model.network;
        let (_, training_acc) = evaluate(network, &train_inputs, &train_labels);
        let (_, validation_acc) = evaluate(network, &val_inputs, &val_labels);
        let (_, testing_acc) = evaluate(network, &testing.inputs(), &testing.labels());

        let holdout_inputs = holdout_set.inputs();
        let holdout_labels = holdout_set.labels();
        let (_, holdout_acc) = evaluate(network, &holdout_inputs, &holdout_labels);

        info!("Accuracy for Training Dataset: {:.2}%", training_acc * 100.0);
        info!("Accuracy for Validation Dataset: {:.2}%", validation_acc * 100.0);
        info!("Accuracy for Testing Dataset: {:.2}%", testing_acc * 100.0);
        info!("Accuracy for Holdout (Testing & Validation) Dataset: {:.2}%", holdout_acc * 100.0);

        let probabilities = predict_proba(network, &holdout_inputs);
        let roc = roc_curve(&holdout_labels, &probabilities)?;
        let auc = roc.auc();
        model.trained = true;

        Ok(TrainingRun {
            topology: model.spec.hidden_sizes(),
            linear: model.linear,
            dropout: model.spec.uses_dropout(),
            early_stopping: options.early_stopping,
            configured_epochs: options.epochs,
            realized_epochs: outcome.history.len(),
            history: outcome.history,
            accuracy: PartitionAccuracy {
                training: training_acc,
                validation: validation_acc,
                testing: testing_acc,
                holdout: holdout_acc,
            },
            roc,
            auc,
            best_epoch,
            was_stopped: outcome.was_stopped,
        })
    }

    /// Writes the trained network's weights as JSON.
    pub fn save_network<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        match &self.model {
            None => Err(PipelineError::ModelNotBuilt),
            Some(m) if !m.trained => Err(PipelineError::ModelNotTrained),
            Some(m) => {
                m.network.save_json(&path)?;
                info!("Saved network to {:?}", path.as_ref());
                Ok(())
            }
        }
    }

    /// Probability of a positive outcome for one record of raw, unscaled
    /// feature values.
    pub fn predict(&self, raw_feature_values: &[f64], scaling: &ScalingModel) -> Result<f64> {
        let network = match &self.model {
            None => return Err(PipelineError::ModelNotBuilt),
            Some(m) if !m.trained => return Err(PipelineError::ModelNotTrained),
            Some(m) => &m.network,
        };
        let scaled = scaling.transform_raw(raw_feature_values)?;
        let probability = network.infer(&scaled)[0];
        debug!(?raw_feature_values, probability, "prediction");
        Ok(probability)
    }
}
