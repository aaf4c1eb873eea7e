pub mod backprop;
pub mod batch;
pub mod epoch_stats;
pub mod eval;
pub mod labels;
pub mod stop;
pub mod train_config;

pub use backprop::{Backprop, TrainReport, TrainingState};
pub use batch::{backpropagate, BatchContext};
pub use epoch_stats::EpochStats;
pub use eval::{argmax, evaluate, predict, Evaluation};
pub use labels::{one_hot, one_hot_targets};
pub use stop::{StopCriterion, StopReason};
pub use train_config::TrainConfig;
