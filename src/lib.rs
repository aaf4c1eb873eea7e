pub mod activation;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod node;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use error::{NetError, Result};
pub use layers::{ActivationLayer, Convolution, Dense, Dropout, Layer, Pooling, PoolingKind};
pub use loss::{LossFunction, Regularizer};
pub use math::tensor::{Shape, Tensor};
pub use network::{LayerSpec, Network, NetworkSnapshot, NetworkSpec, Workspace};
pub use node::ComputationNode;
pub use optim::{Optimizer, OptimizerKind};
pub use train::{Backprop, EpochStats, StopCriterion, StopReason, TrainConfig, TrainReport, TrainingState};
