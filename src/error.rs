use thiserror::Error;

/// Errors produced by the data pipeline, the model manager and form parsing.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file missing, unreadable, malformed, or with an unexpected header.
    #[error("Failed to load data from {path}: {reason}")]
    DataLoad { path: String, reason: String },

    /// A class-conditional statistic or a stratified partition has no samples to work with.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid topology '{input}': {reason}")]
    InvalidTopology { input: String, reason: String },

    #[error("Invalid epoch count '{0}': expected a positive integer")]
    InvalidEpochs(String),

    #[error("Invalid feature value '{0}': expected a number")]
    InvalidFeatureValue(String),

    #[error("No model has been built; call build_model first")]
    ModelNotBuilt,

    #[error("The model has been built but not trained")]
    ModelNotTrained,

    #[error("The model is already trained; rebuild it before training again")]
    AlreadyTrained,

    #[error("Expected {expected} feature values, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn data_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::DataLoad { path: path.into(), reason: reason.into() }
    }

    /// Errors that originate from user-typed form strings rather than from
    /// the data or the model.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidTopology { .. }
                | PipelineError::InvalidEpochs(_)
                | PipelineError::InvalidFeatureValue(_)
                | PipelineError::Shape { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
