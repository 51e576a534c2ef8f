use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the diabetes table.
pub const DEFAULT_DATA_PATH: &str = "data/diabetes.csv";

/// pima-nn: train and evaluate a feed-forward network on the Pima Indians
/// diabetes dataset
#[derive(Parser, Debug)]
#[command(name = "pima-nn")]
#[command(about = "Train and evaluate a feed-forward network on the Pima Indians diabetes dataset")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one model per topology and report accuracies and AUC
    Train(TrainArgs),

    /// Summarize the dataset columns
    Describe(DescribeArgs),
}

/// Training arguments
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Input data file (CSV with header)
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Hidden-layer sizes, e.g. "8,4"; repeat for several runs, "" for none
    #[arg(short, long)]
    pub topology: Vec<String>,

    /// Number of training epochs; blank uses the configured default
    #[arg(short, long)]
    pub epochs: Option<String>,

    /// Use linear instead of ReLU hidden activations
    #[arg(long)]
    pub linear: bool,

    /// Add dropout after every hidden layer
    #[arg(long)]
    pub dropout: bool,

    /// Stop when the validation loss stops improving
    #[arg(long)]
    pub early_stopping: bool,

    /// Random seed for splits and weight initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pipeline configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write all completed runs to this JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Save the network of the last run as JSON
    #[arg(long)]
    pub save_model: Option<PathBuf>,

    /// Comma-separated raw feature values to predict with the last run
    #[arg(short, long)]
    pub predict: Vec<String>,
}

/// Dataset summary arguments
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    /// Input data file (CSV with header)
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Summarize the data after median imputation
    #[arg(long)]
    pub imputed: bool,

    /// Print a histogram of this column
    #[arg(long)]
    pub histogram: Option<String>,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::parse_from(["pima-nn", "train"]);

        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.data, PathBuf::from(DEFAULT_DATA_PATH));
                assert!(args.topology.is_empty());
                assert_eq!(args.epochs, None);
                assert!(!args.linear && !args.dropout && !args.early_stopping);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_train_args() {
        let cli = Cli::parse_from([
            "pima-nn", "-v", "train",
            "-d", "pima.csv",
            "-t", "8,4",
            "-t", "",
            "-e", "120",
            "--dropout",
            "--early-stopping",
            "--seed", "7",
            "-p", "6,148,72,35,0,33.6,0.627,50",
        ]);
        assert!(cli.verbose);

        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.data, PathBuf::from("pima.csv"));
                assert_eq!(args.topology, vec!["8,4".to_string(), String::new()]);
                assert_eq!(args.epochs.as_deref(), Some("120"));
                assert!(args.dropout && args.early_stopping);
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.predict.len(), 1);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_describe_args() {
        let cli = Cli::parse_from(["pima-nn", "describe", "--imputed", "--histogram", "Glucose"]);

        match cli.command {
            Commands::Describe(args) => {
                assert!(args.imputed);
                assert_eq!(args.histogram.as_deref(), Some("Glucose"));
            }
            _ => panic!("Expected Describe command"),
        }
    }
}
