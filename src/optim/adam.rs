use crate::layers::dense::{Dense, LayerGradients};
use crate::math::matrix::Matrix;
use crate::optim::optimizer::Optimizer;

/// First and second moment estimates for one parameter matrix.
#[derive(Debug, Clone)]
struct Moments {
    m: Matrix,
    v: Matrix,
}

impl Moments {
    fn zeros_like(param: &Matrix) -> Moments {
        Moments {
            m: Matrix::zeros(param.rows, param.cols),
            v: Matrix::zeros(param.rows, param.cols),
        }
    }
}

/// Adam with bias-corrected moment estimates.
///
/// Moment buffers are created lazily per layer index on the first step, so one
/// `Adam` must only ever drive one network.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    state: Vec<Option<(Moments, Moments)>>,  // (weights, biases) per layer
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
            state: Vec::new(),
        }
    }

    fn update(&self, param: &mut Matrix, grad: &Matrix, moments: &mut Moments) {
        let (b1, b2) = (self.beta1, self.beta2);
        let correction1 = 1.0 - b1.powi(self.t);
        let correction2 = 1.0 - b2.powi(self.t);

        for i in 0..param.rows {
            for j in 0..param.cols {
                let g = grad.data[i][j];
                let m = b1 * moments.m.data[i][j] + (1.0 - b1) * g;
                let v = b2 * moments.v.data[i][j] + (1.0 - b2) * g * g;
                moments.m.data[i][j] = m;
                moments.v.data[i][j] = v;

                let m_hat = m / correction1;
                let v_hat = v / correction2;
                param.data[i][j] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}

impl Optimizer for Adam {
    fn begin_batch(&mut self) {
        self.t += 1;
    }

    fn step(&mut self, index: usize, layer: &mut Dense, grads: &LayerGradients) {
        if self.state.len() <= index {
            self.state.resize(index + 1, None);
        }
        let (mut w_moments, mut b_moments) = self.state[index].take().unwrap_or_else(|| {
            (Moments::zeros_like(&layer.weights), Moments::zeros_like(&layer.biases))
        });

        self.update(&mut layer.weights, &grads.weights, &mut w_moments);
        self.update(&mut layer.biases, &grads.biases, &mut b_moments);

        self.state[index] = Some((w_moments, b_moments));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut layer = Dense::new(1, 1, ActivationFunction::Identity, None, &mut rng);
        layer.weights = Matrix::row(&[1.0]);
        let grads = LayerGradients { weights: Matrix::row(&[0.3]), biases: Matrix::row(&[-2.0]) };

        let mut adam = Adam::new(0.01);
        adam.begin_batch();
        adam.step(0, &mut layer, &grads);

        // Bias-corrected first step is lr · sign(g) up to epsilon.
        assert!((layer.weights.data[0][0] - 0.99).abs() < 1e-6);
        assert!((layer.biases.data[0][0] - 0.01).abs() < 1e-6);
    }
}
