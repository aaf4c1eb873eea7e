use serde::{Serialize, Deserialize};

use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::euclidean::EuclideanLoss;

/// Selects which loss the training loop uses.
///
/// - `Euclidean`           — half squared distance; pair with any output activation.
/// - `CrossEntropySoftMax` — softmax applied to the raw output, then
///   categorical cross-entropy against a one-hot target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    Euclidean,
    CrossEntropySoftMax,
}

impl LossFunction {
    pub fn loss(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        match self {
            LossFunction::Euclidean           => EuclideanLoss::loss(predicted, expected),
            LossFunction::CrossEntropySoftMax => CrossEntropyLoss::loss(predicted, expected),
        }
    }

    pub fn derivative(&self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        match self {
            LossFunction::Euclidean           => EuclideanLoss::derivative(predicted, expected),
            LossFunction::CrossEntropySoftMax => CrossEntropyLoss::derivative(predicted, expected),
        }
    }
}
