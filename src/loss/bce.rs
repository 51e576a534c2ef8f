/// Binary cross-entropy, paired with a sigmoid output unit.
pub struct BceLoss;

/// Probabilities are clamped to [EPS, 1 - EPS] so log() stays finite.
const EPS: f64 = 1e-7;

fn clamp(p: f64) -> f64 {
    p.clamp(EPS, 1.0 - EPS)
}

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p) + (1-y)·log(1-p))
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(&p, y)| {
                let p = clamp(p);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum::<f64>() / n
    }

    /// Per-output gradient w.r.t. the sigmoid output: (p - y) / (p · (1 - p))
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(&p, y)| {
                let p = clamp(p);
                (p - y) / (p * (1.0 - p))
            })
            .collect()
    }
}
