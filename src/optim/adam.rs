use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// Adam: bias-corrected first and second moment estimates.
///
/// ```text
/// m  = β1·m + (1-β1)·g
/// v  = β2·v + (1-β2)·g²
/// m̂  = m / (1-β1^t),  v̂ = v / (1-β2^t)
/// w += -lr · m̂ / (√v̂ + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adam {
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Vec<f64>,
    v: Vec<f64>,
    step2: f64,
}

impl Adam {
    pub fn new(beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam { beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new(), step2: 0.0 }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.m, weights.len())?;
        ensure_state(self.name(), &mut self.v, weights.len())?;
        self.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let c1 = 1.0 - b1.powi(self.t);
        let c2 = 1.0 - b2.powi(self.t);
        let (m, v) = (&mut self.m, &mut self.v);
        self.step2 = apply(weights, gradient, |i, g| {
            m[i] = b1 * m[i] + (1.0 - b1) * g;
            v[i] = b2 * v[i] + (1.0 - b2) * g * g;
            let m_hat = m[i] / c1;
            let v_hat = v[i] / c2;
            -learning_rate * m_hat / (v_hat.sqrt() + eps)
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}
