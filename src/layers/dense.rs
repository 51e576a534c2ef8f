use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use crate::layers::dropout::Dropout;

/// Weight and bias gradients of one dense layer for one sample.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    pub weights: Matrix,  // input_size x size
    pub biases: Matrix,   // 1 x size
    pub activator: ActivationFunction,
    pub dropout: Option<Dropout>,
    #[serde(skip)]
    input: Matrix,        // input of the last training pass
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = xW + b) needed for correct derivative
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        dropout_rate: Option<f64>,
        rng: &mut R,
    ) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, rng),
            _ => Matrix::xavier(input_size, size, rng),
        };

        Dense {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            dropout: dropout_rate.map(Dropout::new),
            input: Matrix::default(),
            pre_neurons: Matrix::zeros(1, size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Training-mode forward pass: caches input and z, applies dropout.
    pub fn forward_train<R: Rng + ?Sized>(&mut self, input: Matrix, rng: &mut R) -> Matrix {
        let z = &input * &self.weights + self.biases.clone();
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.input = input;
        match self.dropout.as_mut() {
            Some(dropout) => dropout.forward_train(&a, rng),
            None => a,
        }
    }

    /// Inference-mode forward pass; dropout is the identity here.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        let z = input * &self.weights + self.biases.clone();
        z.map(|x| self.activator.function(x))
    }

    /// Backpropagates `output_delta` (∂L/∂output of this layer) through the
    /// cached training pass. Returns the layer's gradients and ∂L/∂input.
    pub fn compute_gradients(&self, output_delta: &Matrix) -> (LayerGradients, Matrix) {
        let activation_delta = match self.dropout.as_ref() {
            Some(dropout) => dropout.backward(output_delta),
            None => output_delta.clone(),
        };
        // Use pre-activation z so that derivative(z) = σ'(z) is computed correctly
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let layer_delta = activation_delta.hadamard(&act_derivative);

        let weights = &self.input.transpose() * &layer_delta;
        let input_delta = &layer_delta * &self.weights.transpose();

        (LayerGradients { weights, biases: layer_delta }, input_delta)
    }
}
