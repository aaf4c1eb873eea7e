//! Gradient-descent weight update rules.
//!
//! Every optimizer works on the network's flat parameter vector and a
//! gradient of the same length. Per-weight auxiliary state is allocated on
//! the first `push` and lives as long as the optimizer; replace the instance
//! to reset it.

pub mod adadelta;
pub mod adagrad;
pub mod adam;
pub mod adamax;
pub mod kind;
pub mod momentum;
pub mod nesterov;
pub mod rmsprop;
pub mod sgd;

pub use adadelta::Adadelta;
pub use adagrad::Adagrad;
pub use adam::Adam;
pub use adamax::Adamax;
pub use kind::OptimizerKind;
pub use momentum::Momentum;
pub use nesterov::Nesterov;
pub use rmsprop::RmsProp;
pub use sgd::Sgd;

use tracing::debug;

use crate::error::{NetError, Result};

pub trait Optimizer: Send {
    /// Applies one update to `weights` from `gradient`, then zeroes
    /// `gradient`.
    ///
    /// Fails with `ParamLength`, leaving everything untouched, when the
    /// gradient does not match the weights or the weight count differs from
    /// the one the optimizer state was sized for.
    fn push(&mut self, weights: &mut [f64], gradient: &mut [f64], learning_rate: f64) -> Result<()>;

    /// Squared norm of the update applied by the last `push`.
    fn step2(&self) -> f64;

    fn name(&self) -> &'static str;
}

pub(crate) fn check_gradient(weights: &[f64], gradient: &[f64]) -> Result<()> {
    if gradient.len() == weights.len() {
        Ok(())
    } else {
        Err(NetError::ParamLength { expected: weights.len(), found: gradient.len() })
    }
}

/// Sizes a per-weight state buffer on first use. Once sized, the buffer
/// only accepts the same weight count.
pub(crate) fn ensure_state(name: &'static str, state: &mut Vec<f64>, len: usize) -> Result<()> {
    if state.is_empty() {
        debug!(optimizer = name, weights = len, "allocating optimizer state");
        state.resize(len, 0.0);
    }
    if state.len() == len {
        Ok(())
    } else {
        Err(NetError::ParamLength { expected: state.len(), found: len })
    }
}

/// Adds `delta[i]` to each weight, zeroes the gradient and returns the
/// squared step.
pub(crate) fn apply<F>(weights: &mut [f64], gradient: &mut [f64], mut delta: F) -> f64
where
    F: FnMut(usize, f64) -> f64,
{
    let mut step2 = 0.0;
    for (i, (w, g)) in weights.iter_mut().zip(gradient.iter_mut()).enumerate() {
        let d = delta(i, *g);
        *w += d;
        *g = 0.0;
        step2 += d * d;
    }
    step2
}
