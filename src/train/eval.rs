use crate::error::Result;
use crate::loss::loss_function::LossFunction;
use crate::math::tensor::Tensor;
use crate::network::network::Network;
use crate::train::backprop::check_dataset;

/// Mean loss and argmax accuracy over a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    /// Fraction of samples whose output argmax equals the target argmax.
    pub accuracy: f64,
}

/// Runs the network in its current mode over every sample, without
/// touching gradients or weights.
pub fn evaluate(
    network: &Network,
    inputs: &[Tensor],
    targets: &[Vec<f64>],
    loss: LossFunction,
) -> Result<Evaluation> {
    check_dataset(network, inputs, targets)?;
    let mut ws = network.workspace(0)?;
    let mut total = 0.0;
    let mut correct = 0usize;
    for (input, target) in inputs.iter().zip(targets) {
        let output = network.forward(input, &mut ws)?.as_slice();
        total += loss.loss(output, target);
        if argmax(output) == argmax(target) {
            correct += 1;
        }
    }
    let n = inputs.len() as f64;
    Ok(Evaluation { loss: total / n, accuracy: correct as f64 / n })
}

/// Class decision for one input: the index of the largest raw output.
pub fn predict(network: &Network, input: &Tensor) -> Result<usize> {
    let mut ws = network.workspace(0)?;
    Ok(argmax(network.forward(input, &mut ws)?.as_slice()))
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
