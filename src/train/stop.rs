use serde::{Serialize, Deserialize};

use crate::error::{invalid, Result};

/// Rule that ends training early. Evaluated once per epoch; the epoch limit
/// in `TrainConfig` always applies as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopCriterion {
    /// Run exactly `TrainConfig::epochs` epochs.
    #[default]
    EpochCount,
    /// Stop when |loss(epoch) - loss(epoch - 1)| < threshold.
    LossDelta { threshold: f64 },
    /// Stop when the squared norm of the last update falls below threshold.
    StepSize { threshold: f64 },
    /// Stop when the smoothed loss `Q = (1-λ)·Q + λ·loss` moves by less than
    /// threshold. `Q` starts at the first epoch's loss.
    SmoothedLoss { lambda: f64, threshold: f64 },
}

impl StopCriterion {
    pub fn validate(&self) -> Result<()> {
        let threshold = match *self {
            StopCriterion::EpochCount => return Ok(()),
            StopCriterion::LossDelta { threshold } | StopCriterion::StepSize { threshold } => threshold,
            StopCriterion::SmoothedLoss { lambda, threshold } => {
                if !(lambda > 0.0 && lambda <= 1.0) {
                    return Err(invalid(format!("smoothing factor {lambda} must lie in (0, 1]")));
                }
                threshold
            }
        };
        if threshold > 0.0 && threshold.is_finite() {
            Ok(())
        } else {
            Err(invalid(format!("stop threshold {threshold} must be positive")))
        }
    }
}

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EpochLimit,
    LossDelta,
    StepSize,
    SmoothedLoss,
    /// The progress receiver was dropped.
    ObserverGone,
}

/// Running state for the active criterion.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopMonitor {
    criterion: StopCriterion,
    last_loss: Option<f64>,
    smoothed: Option<f64>,
}

impl StopMonitor {
    pub(crate) fn new(criterion: StopCriterion) -> StopMonitor {
        StopMonitor { criterion, last_loss: None, smoothed: None }
    }

    pub(crate) fn smoothed(&self) -> Option<f64> {
        self.smoothed
    }

    /// Feeds one epoch's loss and step; returns the reason to stop, if any.
    pub(crate) fn observe(&mut self, loss: f64, step2: f64) -> Option<StopReason> {
        match self.criterion {
            StopCriterion::EpochCount => None,
            StopCriterion::LossDelta { threshold } => {
                let prev = self.last_loss.replace(loss)?;
                ((prev - loss).abs() < threshold).then_some(StopReason::LossDelta)
            }
            StopCriterion::StepSize { threshold } => {
                (step2 < threshold).then_some(StopReason::StepSize)
            }
            StopCriterion::SmoothedLoss { lambda, threshold } => {
                let Some(q) = self.smoothed else {
                    self.smoothed = Some(loss);
                    return None;
                };
                let next = (1.0 - lambda) * q + lambda * loss;
                self.smoothed = Some(next);
                ((next - q).abs() < threshold).then_some(StopReason::SmoothedLoss)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_delta_needs_two_epochs() {
        let mut m = StopMonitor::new(StopCriterion::LossDelta { threshold: 0.1 });
        assert_eq!(m.observe(1.0, 1.0), None);
        assert_eq!(m.observe(0.5, 1.0), None);
        assert_eq!(m.observe(0.45, 1.0), Some(StopReason::LossDelta));
    }

    #[test]
    fn smoothed_loss_tracks_exponential_average() {
        let mut m = StopMonitor::new(StopCriterion::SmoothedLoss { lambda: 0.5, threshold: 0.2 });
        assert_eq!(m.observe(2.0, 0.0), None);
        // Q: 2.0 -> 1.5, moved 0.5
        assert_eq!(m.observe(1.0, 0.0), None);
        assert_eq!(m.smoothed(), Some(1.5));
        // Q: 1.5 -> 1.4, moved 0.1
        assert_eq!(m.observe(1.3, 0.0), Some(StopReason::SmoothedLoss));
    }

    #[test]
    fn thresholds_must_be_positive() {
        assert!(StopCriterion::StepSize { threshold: 0.0 }.validate().is_err());
        assert!(StopCriterion::SmoothedLoss { lambda: 1.5, threshold: 0.1 }.validate().is_err());
        assert!(StopCriterion::LossDelta { threshold: 1e-3 }.validate().is_ok());
    }
}
