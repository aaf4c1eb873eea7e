use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// Nesterov accelerated gradient, in the form that only needs the gradient
/// at the current weights:
///
/// ```text
/// v' = μ·v - lr·g
/// w += -μ·v + (1 + μ)·v'
/// v  = v'
/// ```
#[derive(Debug, Clone)]
pub struct Nesterov {
    mu: f64,
    velocity: Vec<f64>,
    step2: f64,
}

impl Nesterov {
    pub fn new(mu: f64) -> Nesterov {
        Nesterov { mu, velocity: Vec::new(), step2: 0.0 }
    }
}

impl Optimizer for Nesterov {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.velocity, weights.len())?;
        let (mu, velocity) = (self.mu, &mut self.velocity);
        self.step2 = apply(weights, gradient, |i, g| {
            let prev = velocity[i];
            let next = mu * prev - learning_rate * g;
            velocity[i] = next;
            -mu * prev + (1.0 + mu) * next
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "nesterov"
    }
}
