use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `Backprop::train`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Epoch limit for this run.
    pub total_epochs: usize,
    /// Mean loss over all samples in this epoch, plus the regularization term.
    pub loss: f64,
    /// Squared norm of the last optimizer update in this epoch.
    pub step2: f64,
    /// Exponentially smoothed loss including this epoch, when the
    /// smoothed-loss criterion is active.
    pub smoothed_loss: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
