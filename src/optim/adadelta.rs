use crate::error::Result;
use crate::optim::{apply, check_gradient, ensure_state, Optimizer};

/// Adadelta: the step size comes from the ratio of two running RMS values,
/// of past updates and of past gradients.
///
/// ```text
/// Eg  = ρ·Eg + (1-ρ)·g²
/// Δ   = -√(Ed + ε) / √(Eg + ε) · g
/// Ed  = ρ·Ed + (1-ρ)·Δ²
/// w  += Δ
/// ```
///
/// The learning rate is ignored unless `scaled_by_learning_rate` is set, in
/// which case Δ is multiplied by it.
#[derive(Debug, Clone)]
pub struct Adadelta {
    rho: f64,
    epsilon: f64,
    use_learning_rate: bool,
    mean_sq_grad: Vec<f64>,
    mean_sq_delta: Vec<f64>,
    step2: f64,
}

impl Adadelta {
    pub fn new(rho: f64, epsilon: f64) -> Adadelta {
        Adadelta {
            rho,
            epsilon,
            use_learning_rate: false,
            mean_sq_grad: Vec::new(),
            mean_sq_delta: Vec::new(),
            step2: 0.0,
        }
    }

    pub fn scaled_by_learning_rate(mut self, enabled: bool) -> Adadelta {
        self.use_learning_rate = enabled;
        self
    }
}

impl Default for Adadelta {
    fn default() -> Self {
        Adadelta::new(0.95, 1e-6)
    }
}

impl Optimizer for Adadelta {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        ensure_state(self.name(), &mut self.mean_sq_grad, weights.len())?;
        ensure_state(self.name(), &mut self.mean_sq_delta, weights.len())?;
        let scale = if self.use_learning_rate { learning_rate } else { 1.0 };
        let (rho, eps) = (self.rho, self.epsilon);
        let (eg, ed) = (&mut self.mean_sq_grad, &mut self.mean_sq_delta);
        self.step2 = apply(weights, gradient, |i, g| {
            eg[i] = rho * eg[i] + (1.0 - rho) * g * g;
            let delta = -scale * (ed[i] + eps).sqrt() / (eg[i] + eps).sqrt() * g;
            ed[i] = rho * ed[i] + (1.0 - rho) * delta * delta;
            delta
        });
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "adadelta"
    }
}
