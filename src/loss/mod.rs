pub mod cross_entropy;
pub mod euclidean;
pub mod loss_function;
pub mod regularizer;

pub use cross_entropy::{softmax, CrossEntropyLoss};
pub use euclidean::EuclideanLoss;
pub use loss_function::LossFunction;
pub use regularizer::Regularizer;
