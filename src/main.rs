use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use pima_nn::cli::{parse_args, setup_logging, Commands, DescribeArgs, TrainArgs};
use pima_nn::data::{DataManager, Dataset};
use pima_nn::{EpochStats, PipelineConfig, Session, TrainForm};
use tracing::{debug, error, info, warn};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Describe(args) => run_describe(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_json(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => PipelineConfig::default(),
    };
    if args.seed.is_some() {
        config.split.seed = args.seed;
    }

    let mut session = Session::new(config).context("Invalid configuration")?;
    session.load(&args.data)
        .with_context(|| format!("Failed to prepare data from {:?}", args.data))?;

    let topologies = if args.topology.is_empty() {
        vec![String::new()]
    } else {
        args.topology.clone()
    };

    for topology in &topologies {
        let form = TrainForm {
            topology: topology.clone(),
            epochs: args.epochs.clone().unwrap_or_default(),
            linear: args.linear,
            dropout: args.dropout,
            early_stopping: args.early_stopping,
        };

        let (tx, rx) = mpsc::channel::<EpochStats>();
        let reporter = thread::spawn(move || report_progress(rx));
        let result = session.train_with_progress(&form, Some(tx), None).map(|run| run.clone());
        // The sender was moved into the run, so the reporter ends with it.
        if reporter.join().is_err() {
            warn!("Progress reporter panicked");
        }

        match result {
            Ok(run) => {
                println!("{}", run.label());
                println!(
                    "  accuracy: training {:.2}%, validation {:.2}%, testing {:.2}%, holdout {:.2}%",
                    run.accuracy.training * 100.0,
                    run.accuracy.validation * 100.0,
                    run.accuracy.testing * 100.0,
                    run.accuracy.holdout * 100.0,
                );
                if let Some((above, below)) = run.roc.threshold_bracket(0.5) {
                    println!(
                        "  threshold 0.5 between {:.2} (fpr {:.3}, tpr {:.3}) and {:.2} (fpr {:.3}, tpr {:.3})",
                        run.roc.thresholds[above], run.roc.fpr[above], run.roc.tpr[above],
                        run.roc.thresholds[below], run.roc.fpr[below], run.roc.tpr[below],
                    );
                }
            }
            // Bad form input only skips this run.
            Err(e) if e.is_input_error() => continue,
            Err(e) => return Err(e).with_context(|| format!("Training topology {:?} failed", topology)),
        }
    }

    if session.runs().is_empty() {
        bail!("no run completed");
    }

    if let Some(path) = &args.export {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), session.runs())
            .context("Failed to write runs")?;
        info!("Exported {} runs to {:?}", session.runs().len(), path);
    }

    if let Some(path) = &args.save_model {
        session.model_manager().save_network(path)
            .with_context(|| format!("Failed to save network to {:?}", path))?;
    }

    for line in &args.predict {
        let fields: Vec<&str> = line.split(',').collect();
        let probability = session.predict_from_form(&fields)
            .with_context(|| format!("Prediction for {:?} failed", line))?;
        println!("P(diabetes | {}) = {:.4}", line, probability);
    }

    Ok(())
}

fn report_progress(rx: mpsc::Receiver<EpochStats>) {
    for stats in rx {
        debug!(
            "epoch {}/{}: loss {:.4}, val_loss {:?}, accuracy {:.4}, val_accuracy {:?} ({} ms)",
            stats.epoch,
            stats.total_epochs,
            stats.train_loss,
            stats.val_loss,
            stats.train_accuracy,
            stats.val_accuracy,
            stats.elapsed_ms,
        );
        if stats.epoch % 10 == 0 || stats.is_last() {
            info!("epoch {}/{}: loss {:.4}", stats.epoch, stats.total_epochs, stats.train_loss);
        }
    }
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    let manager = DataManager::new();

    let raw = manager.load(&args.data)
        .with_context(|| format!("Failed to load data from {:?}", args.data))?;
    let dataset: Dataset = if args.imputed {
        manager.impute(&raw).context("Imputation failed")?.0
    } else {
        raw
    };

    println!(
        "{:<26}{:>7}{:>10}{:>10}{:>9}{:>9}{:>9}{:>9}{:>9}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in manager.describe(&dataset) {
        println!(
            "{:<26}{:>7}{:>10.3}{:>10.3}{:>9.3}{:>9.3}{:>9.3}{:>9.3}{:>9.3}",
            s.name, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }

    if let Some(column) = &args.histogram {
        let hist = manager.histogram(&dataset, column)?;
        println!();
        println!("{}", hist.column);
        let widest = hist.counts.iter().copied().max().unwrap_or(0).max(1);
        for (i, count) in hist.counts.iter().enumerate() {
            let bar = "#".repeat(count * 40 / widest);
            println!("[{:>9.3}, {:>9.3}) {:>5} {}", hist.edges[i], hist.edges[i + 1], count, bar);
        }
    }
    Ok(())
}
