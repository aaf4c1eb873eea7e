use serde::{Serialize, Deserialize};
use std::sync::mpsc;

use crate::error::{invalid, Result};
use crate::loss::loss_function::LossFunction;
use crate::loss::regularizer::Regularizer;
use crate::optim::OptimizerKind;
use crate::train::epoch_stats::EpochStats;
use crate::train::stop::StopCriterion;

fn default_threads() -> usize {
    1
}

/// Configuration for a `Backprop` run.
///
/// # Fields
/// - `epochs`        — upper bound on full passes over the training data
/// - `learning_rate` — step size handed to the optimizer
/// - `batch_size`    — samples per optimizer step; use `1` for online training
/// - `loss`          — which loss function to use
/// - `optimizer`     — weight update rule and its hyperparameters
/// - `regularizer`   — optional penalty over the whole parameter vector
/// - `stop`          — early-stopping criterion
/// - `threads`       — worker slots used to process a batch concurrently
/// - `shuffle_seed`  — seed for the per-epoch sample order; entropy when absent
/// - `progress_tx`   — optional channel sender; one `EpochStats` is sent per
///                     completed epoch. If the receiver is dropped the run
///                     ends after the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub loss: LossFunction,
    #[serde(default)]
    pub optimizer: OptimizerKind,
    #[serde(default)]
    pub regularizer: Option<Regularizer>,
    #[serde(default)]
    pub stop: StopCriterion,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Plain SGD, no regularizer, fixed epoch count, one thread.
    pub fn new(epochs: usize, learning_rate: f64, batch_size: usize, loss: LossFunction) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            batch_size,
            loss,
            optimizer: OptimizerKind::Sgd,
            regularizer: None,
            stop: StopCriterion::EpochCount,
            threads: 1,
            shuffle_seed: None,
            progress_tx: None,
        }
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.regularizer = Some(regularizer);
        self
    }

    pub fn with_stop(mut self, stop: StopCriterion) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Rejects non-positive counts and rates and out-of-range
    /// optimizer, regularizer or criterion parameters.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(invalid("epoch count must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid(format!("learning rate {} must be positive", self.learning_rate)));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch size must be positive"));
        }
        if self.threads == 0 {
            return Err(invalid("thread count must be positive"));
        }
        if let Some(reg) = &self.regularizer {
            if !reg.is_valid() {
                return Err(invalid(format!("regularizer coefficients must be non-negative: {reg:?}")));
            }
        }
        self.optimizer.validate()?;
        self.stop.validate()
    }

    /// Serializes the configuration (without the progress channel) to a
    /// pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_hyperparameters_are_rejected() {
        let ok = TrainConfig::new(10, 0.1, 4, LossFunction::Euclidean);
        assert!(ok.validate().is_ok());
        assert!(TrainConfig::new(0, 0.1, 4, LossFunction::Euclidean).validate().is_err());
        assert!(TrainConfig::new(10, 0.0, 4, LossFunction::Euclidean).validate().is_err());
        assert!(TrainConfig::new(10, 0.1, 0, LossFunction::Euclidean).validate().is_err());
        assert!(ok.clone().with_threads(0).validate().is_err());
        assert!(ok
            .clone()
            .with_optimizer(OptimizerKind::Momentum { mu: 1.5 })
            .validate()
            .is_err());
    }

    #[test]
    fn json_fills_defaults() {
        let cfg: TrainConfig = serde_json::from_str(
            r#"{"epochs": 5, "learning_rate": 0.5, "batch_size": 2, "loss": "cross_entropy_soft_max",
                "optimizer": {"type": "adam", "beta1": 0.9, "beta2": 0.999, "epsilon": 1e-8}}"#,
        )
        .unwrap();
        assert_eq!(cfg.threads, 1);
        assert_eq!(cfg.stop, StopCriterion::EpochCount);
        assert_eq!(cfg.loss, LossFunction::CrossEntropySoftMax);
        assert!(cfg.progress_tx.is_none());
        assert!(cfg.validate().is_ok());
    }
}
