use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Inverted dropout applied to a layer's activations.
///
/// In training mode each unit is zeroed with probability `rate` and the
/// survivors are scaled by `1 / (1 - rate)`, so inference needs no rescaling
/// and is the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
    #[serde(skip)]
    mask: Matrix,  // keep-mask of the last training pass, already scaled
}

impl Dropout {
    pub fn new(rate: f64) -> Dropout {
        assert!((0.0..1.0).contains(&rate), "dropout rate must be in [0, 1)");
        Dropout { rate, mask: Matrix::default() }
    }

    pub fn forward_train<R: Rng + ?Sized>(&mut self, activations: &Matrix, rng: &mut R) -> Matrix {
        let keep = 1.0 / (1.0 - self.rate);
        let mut mask = Matrix::zeros(activations.rows, activations.cols);
        for row in mask.data.iter_mut() {
            for m in row.iter_mut() {
                *m = if rng.gen::<f64>() < self.rate { 0.0 } else { keep };
            }
        }
        let out = activations.hadamard(&mask);
        self.mask = mask;
        out
    }

    /// Routes ∂L/∂out back through the mask of the last training pass.
    pub fn backward(&self, delta: &Matrix) -> Matrix {
        delta.hadamard(&self.mask)
    }
}
