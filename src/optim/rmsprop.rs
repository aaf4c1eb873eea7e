use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// `E = γ·E + (1-γ)·g²; w += -lr/√(E+ε)·g`
#[derive(Debug, Clone)]
pub struct RmsProp {
    gamma: f64,
    epsilon: f64,
    mean_sq: Vec<f64>,
    step2: f64,
}

impl RmsProp {
    pub fn new(gamma: f64, epsilon: f64) -> RmsProp {
        RmsProp { gamma, epsilon, mean_sq: Vec::new(), step2: 0.0 }
    }
}

impl Default for RmsProp {
    fn default() -> Self {
        RmsProp::new(0.9, 1e-8)
    }
}

impl Optimizer for RmsProp {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.mean_sq, weights.len())?;
        let (gamma, eps, mean_sq) = (self.gamma, self.epsilon, &mut self.mean_sq);
        self.step2 = apply(weights, gradient, |i, g| {
            mean_sq[i] = gamma * mean_sq[i] + (1.0 - gamma) * g * g;
            -learning_rate / (mean_sq[i] + eps).sqrt() * g
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "rmsprop"
    }
}
