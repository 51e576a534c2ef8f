use crate::layers::dense::{Dense, LayerGradients};
use crate::optim::optimizer::Optimizer;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, _index: usize, layer: &mut Dense, grads: &LayerGradients) {
        let lr = self.learning_rate;
        layer.weights = layer.weights.clone() - grads.weights.map(|x| x * lr);
        layer.biases = layer.biases.clone() - grads.biases.map(|x| x * lr);
    }
}
