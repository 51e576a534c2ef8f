use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{PipelineError, Result};

/// Describes one dense layer in a network specification.
///
/// Fields:
/// - `size`       — number of neurons in this layer
/// - `input_size` — output size of the previous layer, or the raw input
///                  dimension for the first layer
/// - `activation` — activation function applied after the linear transform
/// - `dropout`    — dropout rate applied to this layer's output while training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub dropout: Option<f64>,
}

/// Architecture of a binary classifier: hidden dense layers followed by a
/// single sigmoid unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Builds the layer list for `hidden_sizes` hidden layers over `input_size`
    /// inputs. Every hidden layer shares `hidden_activation` and, when
    /// `dropout_rate` is set, is followed by dropout at that rate.
    pub fn binary_classifier(
        input_size: usize,
        hidden_sizes: &[usize],
        hidden_activation: ActivationFunction,
        dropout_rate: Option<f64>,
    ) -> Result<NetworkSpec> {
        if let Some(pos) = hidden_sizes.iter().position(|&s| s == 0) {
            return Err(PipelineError::InvalidTopology {
                input: format!("{:?}", hidden_sizes),
                reason: format!("hidden layer {} has size 0", pos + 1),
            });
        }

        let mut layers = Vec::with_capacity(hidden_sizes.len() + 1);
        let mut fan_in = input_size;
        for &size in hidden_sizes {
            layers.push(LayerSpec {
                size,
                input_size: fan_in,
                activation: hidden_activation,
                dropout: dropout_rate,
            });
            fan_in = size;
        }
        layers.push(LayerSpec {
            size: 1,
            input_size: fan_in,
            activation: ActivationFunction::Sigmoid,
            dropout: None,
        });

        Ok(NetworkSpec { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size).unwrap_or(0)
    }

    /// Sizes of the hidden layers, i.e. every layer but the output unit.
    pub fn hidden_sizes(&self) -> Vec<usize> {
        let n = self.layers.len().saturating_sub(1);
        self.layers[..n].iter().map(|l| l.size).collect()
    }

    pub fn hidden_activation(&self) -> Option<ActivationFunction> {
        let n = self.layers.len().saturating_sub(1);
        self.layers[..n].first().map(|l| l.activation)
    }

    pub fn uses_dropout(&self) -> bool {
        self.layers.iter().any(|l| l.dropout.is_some())
    }
}
