use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::dense::{Dense, LayerGradients};
use crate::math::matrix::Matrix;
use crate::network::spec::NetworkSpec;

/// Weights and biases of every layer, used to restore the best epoch.
pub type WeightSnapshot = Vec<(Matrix, Matrix)>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Dense>,
}

impl Network {
    /// Builds a freshly initialized network from a spec.
    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Network {
        let layers = spec.layers.iter()
            .map(|l| Dense::new(l.size, l.input_size, l.activation, l.dropout, rng))
            .collect();
        Network { layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    /// Training-mode forward pass; caches activations in each layer for
    /// backprop and samples dropout masks.
    pub fn forward<R: Rng + ?Sized>(&mut self, input: &[f64], rng: &mut R) -> Vec<f64> {
        let mut current = Matrix::row(input);
        for layer in &mut self.layers {
            current = layer.forward_train(current, rng);
        }
        current.first_row()
    }

    /// Inference-mode forward pass.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        let mut current = Matrix::row(input);
        for layer in &self.layers {
            current = layer.infer(&current);
        }
        current.first_row()
    }

    /// Backward pass for the sample of the last `forward` call.
    /// `output_delta` is ∂L/∂a of the output layer.
    pub fn backward(&self, output_delta: &[f64]) -> Vec<LayerGradients> {
        let mut delta = Matrix::row(output_delta);
        let mut grads = Vec::with_capacity(self.layers.len());
        for layer in self.layers.iter().rev() {
            let (layer_grads, input_delta) = layer.compute_gradients(&delta);
            grads.push(layer_grads);
            delta = input_delta;
        }
        grads.reverse();
        grads
    }

    pub fn snapshot(&self) -> WeightSnapshot {
        self.layers.iter().map(|l| (l.weights.clone(), l.biases.clone())).collect()
    }

    pub fn restore(&mut self, snapshot: WeightSnapshot) {
        for (layer, (weights, biases)) in self.layers.iter_mut().zip(snapshot) {
            layer.weights = weights;
            layer.biases = biases;
        }
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::loss::BceLoss;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_network(seed: u64) -> Network {
        let spec = NetworkSpec::binary_classifier(3, &[4], ActivationFunction::Identity, None).unwrap();
        Network::from_spec(&spec, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_output_is_probability() {
        let net = small_network(1);
        let p = net.infer(&[0.2, -1.0, 3.0])[0];
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(net.input_size(), 3);
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let mut net = small_network(7);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let x = [0.5, -0.3, 0.8];
        let y = [1.0];

        let out = net.forward(&x, &mut rng);
        let grads = net.backward(&BceLoss::derivative(&out, &y));

        let h = 1e-6;
        let mut bumped = net.clone();
        bumped.layers[0].weights.data[1][2] += h;
        let loss_hi = BceLoss::loss(&bumped.infer(&x), &y);
        bumped.layers[0].weights.data[1][2] -= 2.0 * h;
        let loss_lo = BceLoss::loss(&bumped.infer(&x), &y);
        let numeric = (loss_hi - loss_lo) / (2.0 * h);

        assert!((grads[0].weights.data[1][2] - numeric).abs() < 1e-5);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut net = small_network(3);
        let snap = net.snapshot();
        net.layers[1].biases.data[0][0] = 42.0;
        net.restore(snap.clone());
        assert_eq!(net.snapshot(), snap);
    }

    #[test]
    fn test_json_round_trip_keeps_predictions() {
        let net = small_network(11);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        net.save_json(&path).unwrap();

        let loaded = Network::load_json(&path).unwrap();
        let x = [1.0, 0.0, -2.0];
        assert_eq!(loaded.layers.len(), net.layers.len());
        assert!((loaded.infer(&x)[0] - net.infer(&x)[0]).abs() < 1e-12);
    }
}
