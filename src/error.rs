use thiserror::Error;

use crate::math::tensor::Shape;

pub type Result<T> = std::result::Result<T, NetError>;

/// Errors raised by network construction, training and persistence.
///
/// Configuration errors are raised before anything is mutated; numeric
/// problems (NaN, infinities) are never turned into errors.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("layer {layer}: expected input shape {expected}, found {found}")]
    ShapeMismatch {
        layer: usize,
        expected: Shape,
        found: Shape,
    },

    #[error("input tensor has shape {found}, network expects {expected}")]
    InputShape { expected: Shape, found: Shape },

    #[error("network is already built; layers can no longer be added")]
    AlreadyBuilt,

    #[error("network must be built before use")]
    NotBuilt,

    #[error("network has no layers")]
    EmptyNetwork,

    #[error("layer {layer} has no activation and the network declares no default")]
    MissingActivation { layer: usize },

    #[error("parameter vector too short: need {expected} values from offset {offset}, {available} available")]
    ParamCountMismatch {
        expected: usize,
        offset: usize,
        available: usize,
    },

    #[error("parameter vector has {found} values, network holds {expected}")]
    ParamLength { expected: usize, found: usize },

    #[error("class labels must cover 0..{classes}; label {missing} never occurs")]
    SparseClasses { classes: usize, missing: usize },

    #[error("target vector has {found} entries, network produces {expected}")]
    TargetWidth { expected: usize, found: usize },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("{inputs} inputs but {targets} targets")]
    LengthMismatch { inputs: usize, targets: usize },

    #[error("batch refers to sample {index}, dataset holds {samples}")]
    SampleIndex { index: usize, samples: usize },

    #[error("label {label} is out of range for {classes} classes")]
    LabelOutOfRange { label: usize, classes: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn invalid(msg: impl Into<String>) -> NetError {
    NetError::InvalidHyperparameter(msg.into())
}
