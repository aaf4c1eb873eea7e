use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};
use crate::optim::{Adadelta, Adagrad, Adam, Adamax, Momentum, Nesterov, Optimizer, RmsProp, Sgd};

/// Serializable choice of optimizer and its hyperparameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Sgd,
    Momentum { mu: f64 },
    Nesterov { mu: f64 },
    Adagrad { epsilon: f64 },
    RmsProp { gamma: f64, epsilon: f64 },
    Adadelta {
        rho: f64,
        epsilon: f64,
        #[serde(default)]
        use_learning_rate: bool,
    },
    Adam { beta1: f64, beta2: f64, epsilon: f64 },
    Adamax { beta1: f64, beta2: f64, epsilon: f64 },
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} = {value} must lie in [0, 1)")))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} = {value} must be positive")))
    }
}

impl OptimizerKind {
    pub fn validate(&self) -> Result<()> {
        match *self {
            OptimizerKind::Sgd => Ok(()),
            OptimizerKind::Momentum { mu } | OptimizerKind::Nesterov { mu } => unit_interval("mu", mu),
            OptimizerKind::Adagrad { epsilon } => positive("epsilon", epsilon),
            OptimizerKind::RmsProp { gamma, epsilon } => {
                unit_interval("gamma", gamma)?;
                positive("epsilon", epsilon)
            }
            OptimizerKind::Adadelta { rho, epsilon, .. } => {
                unit_interval("rho", rho)?;
                positive("epsilon", epsilon)
            }
            OptimizerKind::Adam { beta1, beta2, epsilon }
            | OptimizerKind::Adamax { beta1, beta2, epsilon } => {
                unit_interval("beta1", beta1)?;
                unit_interval("beta2", beta2)?;
                positive("epsilon", epsilon)
            }
        }
    }

    /// A fresh optimizer with empty auxiliary state.
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerKind::Sgd => Box::new(Sgd::new()),
            OptimizerKind::Momentum { mu } => Box::new(Momentum::new(mu)),
            OptimizerKind::Nesterov { mu } => Box::new(Nesterov::new(mu)),
            OptimizerKind::Adagrad { epsilon } => Box::new(Adagrad::new(epsilon)),
            OptimizerKind::RmsProp { gamma, epsilon } => Box::new(RmsProp::new(gamma, epsilon)),
            OptimizerKind::Adadelta { rho, epsilon, use_learning_rate } => {
                Box::new(Adadelta::new(rho, epsilon).scaled_by_learning_rate(use_learning_rate))
            }
            OptimizerKind::Adam { beta1, beta2, epsilon } => Box::new(Adam::new(beta1, beta2, epsilon)),
            OptimizerKind::Adamax { beta1, beta2, epsilon } => Box::new(Adamax::new(beta1, beta2, epsilon)),
        }
    }
}
