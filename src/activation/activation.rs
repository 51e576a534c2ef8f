use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Sigmoid,
    #[serde(rename = "relu")]
    ReLU,
    /// Linear activation.
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
        }
    }

    /// Element-wise derivative, evaluated at the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
        }
    }

    /// Hidden-layer activation for the linear/non-linear switch of the form.
    pub fn hidden(non_linear: bool) -> ActivationFunction {
        if non_linear { ActivationFunction::ReLU } else { ActivationFunction::Identity }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Identity => "linear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_midpoint_and_derivative() {
        let s = ActivationFunction::Sigmoid;
        assert!((s.function(0.0) - 0.5).abs() < 1e-12);
        assert!((s.derivative(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_relu_and_identity() {
        assert_eq!(ActivationFunction::ReLU.function(-2.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(3.0), 1.0);
        assert_eq!(ActivationFunction::Identity.function(-2.5), -2.5);
        assert_eq!(ActivationFunction::hidden(false), ActivationFunction::Identity);
    }
}
