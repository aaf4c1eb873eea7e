use serde::{Serialize, Deserialize};

/// Penalty over the whole flat parameter vector, added to the loss once per
/// optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Regularizer {
    /// λ · sum(|w|)
    L1 { lambda: f64 },
    /// λ/2 · sum(w²)
    L2 { lambda: f64 },
    /// L1 and L2 terms together.
    Composite { l1: f64, l2: f64 },
}

impl Regularizer {
    fn coefficients(&self) -> (f64, f64) {
        match *self {
            Regularizer::L1 { lambda } => (lambda, 0.0),
            Regularizer::L2 { lambda } => (0.0, lambda),
            Regularizer::Composite { l1, l2 } => (l1, l2),
        }
    }

    pub fn is_valid(&self) -> bool {
        let (l1, l2) = self.coefficients();
        l1 >= 0.0 && l2 >= 0.0 && l1.is_finite() && l2.is_finite()
    }

    pub fn value(&self, weights: &[f64]) -> f64 {
        let (l1, l2) = self.coefficients();
        weights.iter().map(|w| l1 * w.abs() + 0.5 * l2 * w * w).sum()
    }

    /// Adds ∂R/∂w into `grad`. The L1 subgradient at zero is zero.
    pub fn accumulate_gradient(&self, weights: &[f64], grad: &mut [f64]) {
        let (l1, l2) = self.coefficients();
        for (g, &w) in grad.iter_mut().zip(weights) {
            let sign = if w > 0.0 { 1.0 } else if w < 0.0 { -1.0 } else { 0.0 };
            *g += l1 * sign + l2 * w;
        }
    }
}
