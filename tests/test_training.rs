use std::sync::mpsc;

use approx::assert_abs_diff_eq;
use ferrite_conv::train::{evaluate, one_hot_targets, predict};
use ferrite_conv::{
    ActivationFunction, Backprop, Dense, Layer, LossFunction, NetError, Network, OptimizerKind,
    Shape, StopCriterion, StopReason, Tensor, TrainConfig, TrainingState,
};

// y = 2a - b + 0.5, exactly representable by one linear unit.
fn linear_problem() -> (Network, Vec<Tensor>, Vec<Vec<f64>>) {
    let mut net = Network::new(Shape::vector(2));
    net.add_layer(Layer::Dense(
        Dense::new(Shape::vector(2), 1, Some(ActivationFunction::Identity)).unwrap(),
    ))
    .unwrap();
    net.build().unwrap();

    let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    let inputs = points.iter().map(|&(a, b)| Tensor::from(vec![a, b])).collect();
    let targets = points.iter().map(|&(a, b)| vec![2.0 * a - b + 0.5]).collect();
    (net, inputs, targets)
}

fn full_batch(epochs: usize, stop: StopCriterion) -> TrainConfig {
    TrainConfig::new(epochs, 0.5, 4, LossFunction::Euclidean)
        .with_stop(stop)
        .with_shuffle_seed(0)
}

#[test]
fn loss_delta_converges_to_the_exact_fit() {
    let (mut net, inputs, targets) = linear_problem();
    let mut backprop = Backprop::new(full_batch(5000, StopCriterion::LossDelta { threshold: 1e-12 })).unwrap();
    assert_eq!(backprop.state(), TrainingState::Ready);

    let report = backprop.train(&mut net, &inputs, &targets).unwrap();
    assert_eq!(report.reason, StopReason::LossDelta);
    assert_eq!(report.state, TrainingState::Converged);
    assert!(report.epochs_run < 5000);
    for (w, expected) in net.weights().iter().zip([2.0, -1.0, 0.5]) {
        assert_abs_diff_eq!(*w, expected, epsilon = 1e-3);
    }
}

#[test]
fn step_size_and_smoothed_loss_criteria_fire() {
    let criteria = [
        (StopCriterion::StepSize { threshold: 1e-10 }, StopReason::StepSize),
        (StopCriterion::SmoothedLoss { lambda: 0.5, threshold: 1e-9 }, StopReason::SmoothedLoss),
    ];
    for (stop, reason) in criteria {
        let (mut net, inputs, targets) = linear_problem();
        let report = Backprop::new(full_batch(5000, stop))
            .unwrap()
            .train(&mut net, &inputs, &targets)
            .unwrap();
        assert_eq!(report.reason, reason);
        assert_eq!(report.state, TrainingState::Converged);
    }
}

#[test]
fn epoch_limit_always_applies() {
    let (mut net, inputs, targets) = linear_problem();
    let report = Backprop::new(full_batch(3, StopCriterion::LossDelta { threshold: 1e-300 }))
        .unwrap()
        .train(&mut net, &inputs, &targets)
        .unwrap();
    assert_eq!(report.epochs_run, 3);
    assert_eq!(report.reason, StopReason::EpochLimit);
    assert_eq!(report.state, TrainingState::Stopped);

    let (mut net, inputs, targets) = linear_problem();
    let report = Backprop::new(full_batch(3, StopCriterion::EpochCount))
        .unwrap()
        .train(&mut net, &inputs, &targets)
        .unwrap();
    assert_eq!(report.reason, StopReason::EpochLimit);
    assert_eq!(report.state, TrainingState::Converged);
}

#[test]
fn progress_channel_sees_every_epoch() {
    let (mut net, inputs, targets) = linear_problem();
    let (tx, rx) = mpsc::channel();
    let mut backprop = Backprop::new(full_batch(4, StopCriterion::EpochCount).with_progress(tx)).unwrap();
    let report = backprop.train(&mut net, &inputs, &targets).unwrap();
    drop(backprop);

    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.len(), 4);
    assert_eq!(stats.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert!(stats.iter().all(|s| s.total_epochs == 4));
    assert!(stats[3].loss < stats[0].loss);
    assert_eq!(stats[3].loss, report.final_loss);
}

#[test]
fn epoch_stats_carry_the_current_smoothed_loss() {
    let (mut net, inputs, targets) = linear_problem();
    let (tx, rx) = mpsc::channel();
    let lambda = 0.5;
    let stop = StopCriterion::SmoothedLoss { lambda, threshold: 1e-300 };
    let mut backprop = Backprop::new(full_batch(3, stop).with_progress(tx)).unwrap();
    backprop.train(&mut net, &inputs, &targets).unwrap();
    drop(backprop);

    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.len(), 3);
    assert_eq!(stats[0].smoothed_loss, Some(stats[0].loss));
    for pair in stats.windows(2) {
        let q = pair[0].smoothed_loss.unwrap();
        let expected = (1.0 - lambda) * q + lambda * pair[1].loss;
        assert_abs_diff_eq!(pair[1].smoothed_loss.unwrap(), expected, epsilon = 1e-15);
    }
}

#[test]
fn dropped_observer_ends_the_run() {
    let (mut net, inputs, targets) = linear_problem();
    let (tx, rx) = mpsc::channel();
    drop(rx);
    let mut backprop = Backprop::new(full_batch(100, StopCriterion::EpochCount).with_progress(tx)).unwrap();
    let report = backprop.train(&mut net, &inputs, &targets).unwrap();
    assert_eq!(report.epochs_run, 1);
    assert_eq!(report.reason, StopReason::ObserverGone);
    assert_eq!(backprop.state(), TrainingState::Stopped);
}

#[test]
fn single_epochs_can_be_driven_by_hand() {
    let (mut net, inputs, targets) = linear_problem();
    let mut backprop = Backprop::new(full_batch(10, StopCriterion::EpochCount)).unwrap();
    let first = backprop.train_epoch(&mut net, &inputs, &targets).unwrap();
    let second = backprop.train_epoch(&mut net, &inputs, &targets).unwrap();
    assert_eq!((first.epoch, second.epoch), (1, 2));
    assert_eq!(backprop.state(), TrainingState::Training);
    assert!(second.loss < first.loss);
    assert!(second.step2 > 0.0);
}

#[test]
fn bad_datasets_are_rejected() {
    let (mut net, inputs, targets) = linear_problem();
    let mut backprop = Backprop::new(full_batch(1, StopCriterion::EpochCount)).unwrap();

    assert!(matches!(backprop.train(&mut net, &[], &[]), Err(NetError::EmptyDataset)));
    assert!(matches!(
        backprop.train(&mut net, &inputs, &targets[..3]),
        Err(NetError::LengthMismatch { inputs: 4, targets: 3 })
    ));
    let wide = vec![Tensor::from(vec![1.0, 2.0, 3.0])];
    assert!(matches!(
        backprop.train(&mut net, &wide, &targets[..1]),
        Err(NetError::InputShape { .. })
    ));
    assert!(matches!(
        backprop.train(&mut net, &inputs[..1], &[vec![1.0, 0.0]]),
        Err(NetError::TargetWidth { expected: 1, found: 2 })
    ));

    let mut unbuilt = Network::new(Shape::vector(2));
    unbuilt
        .add_layer(Layer::Dense(
            Dense::new(Shape::vector(2), 1, Some(ActivationFunction::Identity)).unwrap(),
        ))
        .unwrap();
    assert!(matches!(
        backprop.train(&mut unbuilt, &inputs, &targets),
        Err(NetError::NotBuilt)
    ));
}

#[test]
fn invalid_configs_are_rejected() {
    let base = full_batch(1, StopCriterion::EpochCount);
    assert!(matches!(
        Backprop::new(base.clone().with_stop(StopCriterion::StepSize { threshold: -1.0 })),
        Err(NetError::InvalidHyperparameter(_))
    ));
    let mut bad = base.clone();
    bad.learning_rate = -0.1;
    assert!(Backprop::new(bad).is_err());
    assert!(Backprop::new(base.with_optimizer(OptimizerKind::RmsProp { gamma: 1.0, epsilon: 1e-8 })).is_err());
}

#[test]
fn classifier_separates_two_clusters() {
    let points = [
        (1.0, 0.0, 0),
        (0.8, 0.1, 0),
        (0.9, -0.5, 0),
        (0.0, 1.0, 1),
        (0.1, 0.9, 1),
        (-0.5, 0.7, 1),
    ];
    let inputs: Vec<Tensor> = points.iter().map(|&(a, b, _)| Tensor::from(vec![a, b])).collect();
    let labels: Vec<usize> = points.iter().map(|&(_, _, c)| c).collect();
    let targets = one_hot_targets(&labels).unwrap();

    let mut net = Network::new(Shape::vector(2));
    net.add_layer(Layer::Dense(
        Dense::new(Shape::vector(2), 2, Some(ActivationFunction::Identity)).unwrap(),
    ))
    .unwrap();
    net.build().unwrap();

    let config = TrainConfig::new(300, 0.05, 2, LossFunction::CrossEntropySoftMax)
        .with_optimizer(OptimizerKind::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 })
        .with_shuffle_seed(4);
    Backprop::new(config).unwrap().train(&mut net, &inputs, &targets).unwrap();

    let eval = evaluate(&net, &inputs, &targets, LossFunction::CrossEntropySoftMax).unwrap();
    assert_eq!(eval.accuracy, 1.0);
    assert!(eval.loss < 0.3);
    for (input, &label) in inputs.iter().zip(&labels) {
        assert_eq!(predict(&net, input).unwrap(), label);
    }
}

#[test]
fn config_survives_a_json_file() {
    let config = TrainConfig::new(7, 0.25, 3, LossFunction::CrossEntropySoftMax)
        .with_optimizer(OptimizerKind::Nesterov { mu: 0.8 })
        .with_stop(StopCriterion::SmoothedLoss { lambda: 0.3, threshold: 1e-4 })
        .with_threads(2)
        .with_shuffle_seed(11);
    let path = std::env::temp_dir().join(format!("ferrite-conv-config-{}.json", std::process::id()));
    let path = path.to_str().unwrap();
    config.save_json(path).unwrap();
    let loaded = TrainConfig::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded.epochs, 7);
    assert_eq!(loaded.optimizer, config.optimizer);
    assert_eq!(loaded.stop, config.stop);
    assert_eq!(loaded.threads, 2);
    assert_eq!(loaded.shuffle_seed, Some(11));
}
