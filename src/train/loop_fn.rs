use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::layers::dense::LayerGradients;
use crate::loss::bce::BceLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::early_stopping::EarlyStopping;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Decision threshold on the sigmoid output for the accuracy metric.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// What a `train_loop` call produced besides the updated network.
#[derive(Debug, Clone, Default)]
pub struct TrainOutcome {
    /// One entry per completed epoch.
    pub history: Vec<EpochStats>,
    /// The stop flag was raised or the progress receiver went away.
    pub was_stopped: bool,
    /// Early stopping ended the run before the epoch ceiling.
    pub stopped_early: bool,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` in place for up to `config.epochs` epochs.
///
/// Samples are reshuffled every epoch with `rng`, which also draws the
/// dropout masks. The validation set is only scored, never trained on; an
/// empty one disables early stopping.
///
/// The loop ends before the ceiling when `config.stop_flag` is raised, when
/// the `progress_tx` receiver is gone, or when early stopping runs out of
/// patience. With early stopping configured the best observed weights are
/// restored before returning, whether or not it fired.
///
/// # Panics
/// Panics if `train_inputs` is empty, lengths mismatch, or `batch_size == 0`.
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    train_inputs: &[Vec<f64>],
    train_labels: &[f64],
    val_inputs: &[Vec<f64>],
    val_labels: &[f64],
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    rng: &mut R,
) -> TrainOutcome {
    assert!(!train_inputs.is_empty(), "train_inputs must not be empty");
    assert_eq!(
        train_inputs.len(),
        train_labels.len(),
        "train_inputs and train_labels must have equal length"
    );
    assert_eq!(
        val_inputs.len(),
        val_labels.len(),
        "val_inputs and val_labels must have equal length"
    );
    assert!(config.batch_size > 0, "batch_size must be at least 1");

    let mut outcome = TrainOutcome::default();
    let mut early_stopping = config.early_stopping.map(EarlyStopping::new);

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            outcome.was_stopped = true;
            break;
        }

        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let (train_loss, train_accuracy) = run_one_epoch(
            network,
            train_inputs,
            train_labels,
            optimizer,
            config.batch_size,
            rng,
        );

        // ── Validation ────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = if val_inputs.is_empty() {
            (None, None)
        } else {
            let (loss, acc) = evaluate(network, val_inputs, val_labels);
            (Some(loss), Some(acc))
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            val_loss,
            train_accuracy,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        debug!(
            epoch,
            train_loss,
            val_loss = ?val_loss,
            train_accuracy,
            "epoch finished"
        );
        outcome.history.push(stats.clone());

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                outcome.was_stopped = true;
                break;
            }
        }

        if let (Some(es), Some(loss)) = (early_stopping.as_mut(), val_loss) {
            if es.observe(epoch - 1, loss, network) {
                info!(epoch, "early stopping: validation loss stopped improving");
                outcome.stopped_early = epoch < config.epochs;
                break;
            }
        }
    }

    if let Some(es) = early_stopping {
        es.restore_best(network);
    }

    outcome
}

/// Mean BCE loss and accuracy over a dataset in inference mode.
pub fn evaluate(network: &Network, inputs: &[Vec<f64>], labels: &[f64]) -> (f64, f64) {
    let n = inputs.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mut total_loss = 0.0;
    let mut correct = 0usize;
    for (input, &label) in inputs.iter().zip(labels.iter()) {
        let output = network.infer(input);
        total_loss += BceLoss::loss(&output, &[label]);
        if is_correct(output[0], label) {
            correct += 1;
        }
    }
    (total_loss / n as f64, correct as f64 / n as f64)
}

/// Positive-class probability for every sample, in inference mode.
pub fn predict_proba(network: &Network, inputs: &[Vec<f64>]) -> Vec<f64> {
    inputs.iter().map(|input| network.infer(input)[0]).collect()
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

fn is_correct(probability: f64, label: f64) -> bool {
    let predicted = if probability > DECISION_THRESHOLD { 1.0 } else { 0.0 };
    predicted == label
}

/// Runs one full epoch of mini-batch training over shuffled data.
/// Returns the mean loss and the accuracy over all samples as seen during
/// the epoch.
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[f64],
    optimizer: &mut dyn Optimizer,
    batch_size: usize,
    rng: &mut R,
) -> (f64, f64) {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut correct = 0usize;

    // Shuffle sample order each epoch.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch in indices.chunks(batch_size) {
        // Zero-initialize accumulated gradient storage.
        let mut acc_grads: Vec<LayerGradients> = network.layers.iter()
            .map(|layer| LayerGradients {
                weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
                biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
            })
            .collect();

        // Accumulate gradients over the mini-batch.
        for &idx in batch {
            let expected = [labels[idx]];
            let output = network.forward(&inputs[idx], rng);

            total_loss += BceLoss::loss(&output, &expected);
            if is_correct(output[0], expected[0]) {
                correct += 1;
            }

            let error = BceLoss::derivative(&output, &expected);
            for (acc, grads) in acc_grads.iter_mut().zip(network.backward(&error)) {
                acc.weights.add_assign(&grads.weights);
                acc.biases.add_assign(&grads.biases);
            }
        }

        // Average and apply.
        let inv_batch = 1.0 / batch.len() as f64;
        optimizer.begin_batch();
        for (i, acc) in acc_grads.into_iter().enumerate() {
            let averaged = LayerGradients {
                weights: acc.weights.map(|x| x * inv_batch),
                biases: acc.biases.map(|x| x * inv_batch),
            };
            optimizer.step(i, &mut network.layers[i], &averaged);
        }
    }

    (total_loss / n as f64, correct as f64 / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::spec::NetworkSpec;
    use crate::optim::adam::Adam;
    use crate::train::early_stopping::EarlyStoppingConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn separable() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut inputs = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let class = (i % 2) as f64;
            let offset = (i as f64) * 0.01;
            inputs.push(vec![if class == 1.0 { 1.0 } else { -1.0 } + offset, offset]);
            labels.push(class);
        }
        (inputs, labels)
    }

    fn network(seed: u64) -> Network {
        let spec = NetworkSpec::binary_classifier(2, &[4], ActivationFunction::ReLU, None).unwrap();
        Network::from_spec(&spec, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_loss_decreases_on_separable_data() {
        let (x, y) = separable();
        let mut net = network(1);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut adam = Adam::new(0.01);
        let outcome = train_loop(&mut net, &x, &y, &x, &y, &mut adam, &TrainConfig::new(60, 1), &mut rng);

        assert_eq!(outcome.history.len(), 60);
        let first = outcome.history[0].train_loss;
        let last = outcome.history[59].train_loss;
        assert!(last < first, "loss went from {first} to {last}");
        assert!(evaluate(&net, &x, &y).1 >= 0.9);
    }

    #[test]
    fn test_progress_channel_receives_every_epoch() {
        let (x, y) = separable();
        let (tx, rx) = mpsc::channel();
        let mut config = TrainConfig::new(3, 4);
        config.progress_tx = Some(tx);

        let mut adam = Adam::new(0.001);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        train_loop(&mut network(3), &x, &y, &x, &y, &mut adam, &config, &mut rng);
        drop(config);

        let epochs: Vec<usize> = rx.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3]);
    }

    #[test]
    fn test_stop_flag_prevents_training() {
        let (x, y) = separable();
        let mut config = TrainConfig::new(10, 1);
        config.stop_flag = Some(Arc::new(AtomicBool::new(true)));

        let mut adam = Adam::new(0.001);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let outcome = train_loop(&mut network(4), &x, &y, &x, &y, &mut adam, &config, &mut rng);
        assert!(outcome.was_stopped);
        assert!(outcome.history.is_empty());
    }

    #[test]
    fn test_early_stopping_halts_before_ceiling() {
        let (x, y) = separable();
        // Validation labels are inverted, so validation loss rises as training fits.
        let flipped: Vec<f64> = y.iter().map(|v| 1.0 - v).collect();
        let mut config = TrainConfig::new(200, 1);
        config.early_stopping = Some(EarlyStoppingConfig { patience: 3, min_delta: 0.0 });

        let mut adam = Adam::new(0.01);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = train_loop(&mut network(5), &x, &y, &x, &flipped, &mut adam, &config, &mut rng);
        assert!(outcome.stopped_early);
        assert!(outcome.history.len() < 200);
    }
}
