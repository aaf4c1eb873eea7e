use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// Classical momentum: `v = μ·v - lr·g; w += v`.
#[derive(Debug, Clone)]
pub struct Momentum {
    mu: f64,
    velocity: Vec<f64>,
    step2: f64,
}

impl Momentum {
    pub fn new(mu: f64) -> Momentum {
        Momentum { mu, velocity: Vec::new(), step2: 0.0 }
    }
}

impl Optimizer for Momentum {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.velocity, weights.len())?;
        let (mu, velocity) = (self.mu, &mut self.velocity);
        self.step2 = apply(weights, gradient, |i, g| {
            velocity[i] = mu * velocity[i] - learning_rate * g;
            velocity[i]
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "momentum"
    }
}
