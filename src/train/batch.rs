use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{NetError, Result};
use crate::loss::loss_function::LossFunction;
use crate::math::tensor::Tensor;
use crate::network::network::Network;
use crate::network::workspace::Workspace;

/// One worker's private scratch: activations, errors and a gradient buffer
/// that is folded into the shared accumulator once per batch.
struct Slot {
    workspace: Workspace,
    gradient: Vec<f64>,
}

/// A fixed pool of `T` scratch sets over one shared network.
///
/// Example `k` of a batch is handed to slot `k mod T`. Holding a slot's lock
/// marks it busy; a worker that targets a busy slot waits for it. Each slot
/// adds its gradient into the accumulator exactly once, under the
/// accumulator's lock, so every example is counted once regardless of
/// scheduling.
pub struct BatchContext {
    slots: Vec<Mutex<Slot>>,
    pool: Option<ThreadPool>,
    params: usize,
}

impl BatchContext {
    pub fn new(network: &Network, threads: usize) -> Result<BatchContext> {
        let threads = threads.max(1);
        let params = network.weights().len();
        let slots = (0..threads)
            .map(|slot| {
                Ok(Mutex::new(Slot {
                    workspace: network.workspace(slot)?,
                    gradient: vec![0.0; params],
                }))
            })
            .collect::<Result<Vec<_>>>()?;
        let pool = if threads > 1 {
            Some(ThreadPoolBuilder::new().num_threads(threads).build()?)
        } else {
            None
        };
        Ok(BatchContext { slots, pool, params })
    }

    pub fn threads(&self) -> usize {
        self.slots.len()
    }

    /// Whether this context was sized for `network`'s parameter vector and
    /// layer chain.
    pub fn fits(&self, network: &Network) -> bool {
        self.params == network.weights().len()
            && self.slots[0].lock().workspace.caches().len() == network.layers().len()
    }

    /// Runs forward and backward passes for `batch` (indices into `inputs`
    /// and `targets`) and adds the gradient, scaled by `1 / batch.len()`,
    /// into `accumulator`. Returns the summed loss of the batch.
    ///
    /// Indices, target widths and the accumulator length are checked up
    /// front; on error `accumulator` is left as it was.
    pub fn accumulate(
        &self,
        network: &Network,
        inputs: &[Tensor],
        targets: &[Vec<f64>],
        batch: &[usize],
        loss: LossFunction,
        accumulator: &mut [f64],
    ) -> Result<f64> {
        self.check_batch(network, inputs, targets, batch, accumulator)?;
        if batch.is_empty() {
            return Ok(0.0);
        }
        let scale = 1.0 / batch.len() as f64;

        let Some(pool) = &self.pool else {
            let mut slot = self.slots[0].lock();
            let mut total = 0.0;
            for &k in batch {
                total += backpropagate(network, &mut slot.workspace, &inputs[k], &targets[k], loss, scale, accumulator)?;
            }
            return Ok(total);
        };

        let threads = self.slots.len();
        let shared = Mutex::new(accumulator);
        let outcome: Mutex<Result<f64>> = Mutex::new(Ok(0.0));
        pool.scope(|s| {
            for (n, slot) in self.slots.iter().enumerate() {
                let shared = &shared;
                let outcome = &outcome;
                s.spawn(move |_| {
                    let mut guard = slot.lock();
                    let Slot { workspace, gradient } = &mut *guard;
                    let mut partial = Ok(0.0);
                    for &k in batch.iter().skip(n).step_by(threads) {
                        match backpropagate(network, workspace, &inputs[k], &targets[k], loss, scale, gradient) {
                            Ok(l) => partial = partial.map(|t| t + l),
                            Err(e) => {
                                partial = Err(e);
                                break;
                            }
                        }
                    }
                    {
                        let mut acc = shared.lock();
                        acc.iter_mut().zip(gradient.iter()).for_each(|(a, g)| *a += g);
                    }
                    gradient.iter_mut().for_each(|g| *g = 0.0);

                    let mut out = outcome.lock();
                    *out = match (std::mem::replace(&mut *out, Ok(0.0)), partial) {
                        (Ok(a), Ok(b)) => Ok(a + b),
                        (Err(e), _) | (_, Err(e)) => Err(e),
                    };
                });
            }
        });
        outcome.into_inner()
    }

    fn check_batch(
        &self,
        network: &Network,
        inputs: &[Tensor],
        targets: &[Vec<f64>],
        batch: &[usize],
        accumulator: &[f64],
    ) -> Result<()> {
        let params = network.weights().len();
        if self.params != params {
            return Err(NetError::ParamLength { expected: self.params, found: params });
        }
        if accumulator.len() != params {
            return Err(NetError::ParamLength { expected: params, found: accumulator.len() });
        }
        if inputs.len() != targets.len() {
            return Err(NetError::LengthMismatch { inputs: inputs.len(), targets: targets.len() });
        }
        if let Some(&index) = batch.iter().find(|&&k| k >= inputs.len()) {
            return Err(NetError::SampleIndex { index, samples: inputs.len() });
        }
        let width = network.output_shape().len();
        if let Some(bad) = batch.iter().map(|&k| &targets[k]).find(|t| t.len() != width) {
            return Err(NetError::TargetWidth { expected: width, found: bad.len() });
        }
        Ok(())
    }
}

/// Forward pass, output error and backward sweep for one example. The
/// output error is `loss'(out, target) ⊙ f'(pre) · scale`.
///
/// `target` must be as wide as the network's output and `grad` as long as
/// its parameter vector; both are checked before the forward pass.
pub fn backpropagate(
    network: &Network,
    ws: &mut Workspace,
    input: &Tensor,
    target: &[f64],
    loss: LossFunction,
    scale: f64,
    grad: &mut [f64],
) -> Result<f64> {
    if !network.is_built() {
        return Err(NetError::NotBuilt);
    }
    let width = network.output_shape().len();
    if target.len() != width {
        return Err(NetError::TargetWidth { expected: width, found: target.len() });
    }
    let params = network.weights().len();
    if grad.len() != params {
        return Err(NetError::ParamLength { expected: params, found: grad.len() });
    }
    let output = network.forward(input, ws)?.as_slice();
    let value = loss.loss(output, target);
    let error = loss.derivative(output, target);

    let last = network.layers().last().ok_or(NetError::EmptyNetwork)?;
    let cache = ws.last_mut().ok_or(NetError::EmptyNetwork)?;
    for (d, e) in cache.delta.as_mut_slice().iter_mut().zip(&error) {
        *d = e * scale;
    }
    last.apply_derivative(cache);
    network.backward(input, ws, grad);
    Ok(value)
}
