use crate::error::Result;
use crate::optim::{apply, check_gradient, Optimizer};

/// Plain gradient descent: `w += -lr·g`.
#[derive(Debug, Clone, Default)]
pub struct Sgd {
    step2: f64,
}

impl Sgd {
    pub fn new() -> Sgd {
        Sgd::default()
    }
}

impl Optimizer for Sgd {
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()> {
        check_gradient(weights, gradient)?;
        self.step2 = apply(weights, gradient, |_, g| -learning_rate * g);
        Ok(())
    }

    fn step2(&self) -> f64 {
        self.step2
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}
