use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// `G += g²; w += -lr/√(G+ε)·g`
#[derive(Debug, Clone)]
pub struct Adagrad {
    epsilon: f64,
    sum_sq: Vec<f64>,
    step2: f64,
}

impl Adagrad {
    pub fn new(epsilon: f64) -> Adagrad {
        Adagrad { epsilon, sum_sq: Vec::new(), step2: 0.0 }
    }
}

impl Default for Adagrad {
    fn default() -> Self {
        Adagrad::new(1e-8)
    }
}

impl Optimizer for Adagrad {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.sum_sq, weights.len())?;
        let (eps, sum_sq) = (self.epsilon, &mut self.sum_sq);
        self.step2 = apply(weights, gradient, |i, g| {
            sum_sq[i] += g * g;
            -learning_rate / (sum_sq[i] + eps).sqrt() * g
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "adagrad"
    }
}
