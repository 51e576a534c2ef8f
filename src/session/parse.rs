use crate::error::{PipelineError, Result};

/// Epochs used when the epoch field is blank.
pub const DEFAULT_EPOCHS: usize = 50;

/// Parses a comma-separated list of hidden-layer sizes. A blank string is
/// the empty topology; whitespace around each size is ignored.
///
/// Zero sizes parse here and are rejected when the network is built.
pub fn parse_topology(input: &str) -> Result<Vec<usize>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<usize>().map_err(|_| PipelineError::InvalidTopology {
                input: input.to_string(),
                reason: format!("'{}' is not a non-negative integer", token),
            })
        })
        .collect()
}

/// Parses the epoch field; blank means `DEFAULT_EPOCHS`.
pub fn parse_epochs(input: &str) -> Result<usize> {
    parse_epochs_or(input, DEFAULT_EPOCHS)
}

/// Parses the epoch field; blank means `default`.
pub fn parse_epochs_or(input: &str, default: usize) -> Result<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PipelineError::InvalidEpochs(input.to_string())),
    }
}

/// Parses one numeric string per feature field.
pub fn parse_feature_values<S: AsRef<str>>(fields: &[S]) -> Result<Vec<f64>> {
    fields.iter()
        .map(|field| {
            let text = field.as_ref().trim();
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PipelineError::InvalidFeatureValue(text.to_string()))
        })
        .collect()
}
