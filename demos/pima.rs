use std::env;

use pima_nn::data::DataManager;
use pima_nn::model::{ModelManager, TrainOptions};
use pima_nn::{PipelineError, TrainingConfig};

/// Trains an [8, 4] ReLU network with early stopping on the diabetes table
/// and scores one new record.
///
/// Usage: `cargo run --example pima [path/to/diabetes.csv]`
fn main() -> Result<(), PipelineError> {
    let path = env::args().nth(1).unwrap_or_else(|| "data/diabetes.csv".to_string());

    let data = DataManager::new();
    let prepared = data.prepare(&path)?;
    let parts = data.split(&prepared.scaled, &Default::default())?;
    println!(
        "{} records: {} training, {} validation, {} testing",
        prepared.raw.len(),
        parts.training.len(),
        parts.validation.len(),
        parts.testing.len()
    );

    let config = TrainingConfig { patience: 10, ..TrainingConfig::default() };
    let mut model = ModelManager::new(config)?;
    model.build_model(&[8, 4], true, false)?;
    let options = TrainOptions { early_stopping: true, ..TrainOptions::new(200) };
    let run = model.train(&parts.training, &parts.validation, &parts.testing, options)?;

    for stats in run.history.iter().step_by(10) {
        println!(
            "Epoch {}: loss = {:.4}, val_loss = {:.4}",
            stats.epoch,
            stats.train_loss,
            stats.val_loss.unwrap_or(f64::NAN)
        );
    }
    println!("{}", run.label());

    let subject = [6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0];
    let p = model.predict(&subject, &prepared.scaling)?;
    println!("Input: {:?} -> P(diabetes) = {:.4}", subject, p);
    Ok(())
}
