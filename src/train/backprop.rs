use std::time::Instant;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::error::{NetError, Result};
use crate::math::tensor::Tensor;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::batch::{backpropagate, BatchContext};
use crate::train::epoch_stats::EpochStats;
use crate::train::stop::{StopCriterion, StopMonitor, StopReason};
use crate::train::train_config::TrainConfig;

/// Where a `Backprop` instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    /// Constructed, no epoch run yet.
    Ready,
    /// At least one epoch run, no stop decision yet.
    Training,
    /// The active criterion was met.
    Converged,
    /// Ended without the criterion being met: epoch limit or observer gone.
    Stopped,
}

/// Summary returned by `Backprop::train`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub final_loss: f64,
    pub state: TrainingState,
    pub reason: StopReason,
}

/// Backpropagation training engine.
///
/// Owns the optimizer (and with it the optimizer's per-weight state), the
/// gradient accumulator and the worker scratch sets. One instance is meant
/// to drive one network; concurrent `train` calls on the same network are
/// ruled out by the `&mut Network` borrow.
pub struct Backprop {
    config: TrainConfig,
    optimizer: Box<dyn Optimizer>,
    gradient: Vec<f64>,
    context: Option<BatchContext>,
    monitor: StopMonitor,
    pending_stop: Option<StopReason>,
    state: TrainingState,
    epochs_run: usize,
    rng: ChaCha8Rng,
}

/// Checks that the dataset is non-empty, paired, and shaped for `network`.
pub(crate) fn check_dataset(network: &Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<()> {
    if inputs.is_empty() {
        return Err(NetError::EmptyDataset);
    }
    if inputs.len() != targets.len() {
        return Err(NetError::LengthMismatch { inputs: inputs.len(), targets: targets.len() });
    }
    let expected = network.input_shape();
    if let Some(bad) = inputs.iter().find(|t| t.shape() != expected) {
        return Err(NetError::InputShape { expected, found: bad.shape() });
    }
    let width = network.output_shape().len();
    if let Some(bad) = targets.iter().find(|t| t.len() != width) {
        return Err(NetError::TargetWidth { expected: width, found: bad.len() });
    }
    Ok(())
}

impl Backprop {
    /// Validates `config` and builds the configured optimizer.
    pub fn new(config: TrainConfig) -> Result<Backprop> {
        config.validate()?;
        let optimizer = config.optimizer.build();
        Ok(Backprop::assemble(config, optimizer))
    }

    /// Like `new`, but with a caller-supplied optimizer instead of
    /// `config.optimizer`.
    pub fn with_optimizer(config: TrainConfig, optimizer: Box<dyn Optimizer>) -> Result<Backprop> {
        config.validate()?;
        Ok(Backprop::assemble(config, optimizer))
    }

    fn assemble(config: TrainConfig, optimizer: Box<dyn Optimizer>) -> Backprop {
        let rng = match config.shuffle_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Backprop {
            monitor: StopMonitor::new(config.stop),
            pending_stop: None,
            config,
            optimizer,
            gradient: Vec::new(),
            context: None,
            state: TrainingState::Ready,
            epochs_run: 0,
            rng,
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    /// Sizes the gradient buffer and worker slots for `network`, once.
    fn prepare(&mut self, network: &Network) -> Result<()> {
        if !network.is_built() {
            return Err(NetError::NotBuilt);
        }
        let fits = self.context.as_ref().is_some_and(|c| c.fits(network));
        if !fits {
            self.context = Some(BatchContext::new(network, self.config.threads)?);
            self.gradient = vec![0.0; network.weights().len()];
        }
        Ok(())
    }

    /// Trains until the stop criterion is met or the epoch limit is reached.
    ///
    /// Dropout layers are switched to training mode for the run and back to
    /// inference mode afterwards.
    pub fn train(&mut self, network: &mut Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<TrainReport> {
        check_dataset(network, inputs, targets)?;
        network.set_training(true);
        let report = self.run(network, inputs, targets);
        network.set_training(false);
        report
    }

    fn run(&mut self, network: &mut Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<TrainReport> {
        let mut last = f64::NAN;
        let mut reason = StopReason::EpochLimit;
        while self.epochs_run < self.config.epochs {
            let stats = self.train_epoch(network, inputs, targets)?;
            last = stats.loss;

            if let Some(tx) = &self.config.progress_tx {
                if tx.send(stats.clone()).is_err() {
                    warn!(epoch = stats.epoch, "progress receiver dropped, stopping");
                    reason = StopReason::ObserverGone;
                    break;
                }
            }
            if let Some(r) = self.pending_stop.take() {
                debug!(epoch = stats.epoch, reason = ?r, "stop criterion met");
                reason = r;
                break;
            }
        }

        self.state = match reason {
            StopReason::EpochLimit if self.config.stop == StopCriterion::EpochCount => TrainingState::Converged,
            StopReason::EpochLimit | StopReason::ObserverGone => TrainingState::Stopped,
            _ => TrainingState::Converged,
        };
        Ok(TrainReport {
            epochs_run: self.epochs_run,
            final_loss: last,
            state: self.state,
            reason,
        })
    }

    /// One pass over the data in shuffled order: every `batch_size` samples
    /// the accumulated gradient (plus the regularizer's) is pushed through
    /// the optimizer and cleared. The stop criterion sees the epoch's loss
    /// before the returned stats are built.
    pub fn train_epoch(&mut self, network: &mut Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<EpochStats> {
        check_dataset(network, inputs, targets)?;
        self.prepare(network)?;
        self.state = TrainingState::Training;
        let t_start = Instant::now();

        let mut order: Vec<usize> = (0..inputs.len()).collect();
        order.shuffle(&mut self.rng);

        let mut total = 0.0;
        for batch in order.chunks(self.config.batch_size) {
            if let Some(ctx) = &self.context {
                total += ctx.accumulate(network, inputs, targets, batch, self.config.loss, &mut self.gradient)?;
            }
            if let Some(reg) = &self.config.regularizer {
                reg.accumulate_gradient(network.weights(), &mut self.gradient);
            }
            self.optimizer.push(network.weights_mut(), &mut self.gradient, self.config.learning_rate)?;
        }

        let penalty = self.config.regularizer.map_or(0.0, |r| r.value(network.weights()));
        let loss = total / inputs.len() as f64 + penalty;
        let step2 = self.optimizer.step2();
        self.pending_stop = self.monitor.observe(loss, step2);
        self.epochs_run += 1;
        let stats = EpochStats {
            epoch: self.epochs_run,
            total_epochs: self.config.epochs,
            loss,
            step2,
            smoothed_loss: self.monitor.smoothed(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            epoch = stats.epoch,
            loss = stats.loss,
            step2 = stats.step2,
            elapsed_ms = stats.elapsed_ms,
            "epoch finished"
        );
        Ok(stats)
    }

    /// The objective over `inputs` treated as one batch: mean loss plus the
    /// regularization term. Weights are not touched.
    pub fn objective(&self, network: &Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<f64> {
        check_dataset(network, inputs, targets)?;
        let mut ws = network.workspace(0)?;
        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            let output = network.forward(input, &mut ws)?;
            total += self.config.loss.loss(output.as_slice(), target);
        }
        let penalty = self.config.regularizer.map_or(0.0, |r| r.value(network.weights()));
        Ok(total / inputs.len() as f64 + penalty)
    }

    /// The objective and its analytic gradient over `inputs` treated as one
    /// batch, without updating the weights or the optimizer.
    pub fn gradient(&self, network: &Network, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<(f64, Vec<f64>)> {
        check_dataset(network, inputs, targets)?;
        let mut ws = network.workspace(0)?;
        let mut grad = vec![0.0; network.weights().len()];
        let scale = 1.0 / inputs.len() as f64;
        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            total += backpropagate(network, &mut ws, input, target, self.config.loss, scale, &mut grad)?;
        }
        let mut value = total * scale;
        if let Some(reg) = &self.config.regularizer {
            reg.accumulate_gradient(network.weights(), &mut grad);
            value += reg.value(network.weights());
        }
        Ok((value, grad))
    }
}
