use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// Adamax: Adam with the second moment replaced by an infinity norm.
///
/// ```text
/// m  = β1·m + (1-β1)·g
/// u  = max(β2·u, |g|)
/// w += -lr · (m / (1-β1^t)) / (u + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adamax {
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Vec<f64>,
    u: Vec<f64>,
    step2: f64,
}

impl Adamax {
    pub fn new(beta1: f64, beta2: f64, epsilon: f64) -> Adamax {
        Adamax { beta1, beta2, epsilon, t: 0, m: Vec::new(), u: Vec::new(), step2: 0.0 }
    }
}

impl Default for Adamax {
    fn default() -> Self {
        Adamax::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adamax {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.m, weights.len())?;
        ensure_state(self.name(), &mut self.u, weights.len())?;
        self.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let c1 = 1.0 - b1.powi(self.t);
        let (m, u) = (&mut self.m, &mut self.u);
        self.step2 = apply(weights, gradient, |i, g| {
            m[i] = b1 * m[i] + (1.0 - b1) * g;
            u[i] = (b2 * u[i]).max(g.abs());
            -learning_rate * (m[i] / c1) / (u[i] + eps)
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "adamax"
    }
}
