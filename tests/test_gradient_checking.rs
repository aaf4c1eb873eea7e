// Analytic gradients from the backward sweep against central finite
// differences of the objective, over mixed layer stacks, both losses and
// every regularizer.

use ferrite_conv::train::one_hot;
use ferrite_conv::{
    ActivationFunction, ActivationLayer, Backprop, ComputationNode, Convolution, Dense, Dropout,
    Layer, LossFunction, Network, Pooling, PoolingKind, Regularizer, Shape, Tensor, TrainConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const H: f64 = 1e-5;

fn random_tensor(shape: Shape, rng: &mut ChaCha8Rng) -> Tensor {
    let data = (0..shape.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Tensor::from_vec(shape, data).unwrap()
}

// Every parameter, biases included, gets a non-zero random value.
fn scramble(net: &mut Network, rng: &mut ChaCha8Rng) {
    let values: Vec<f64> = (0..net.param_count()).map(|_| rng.gen_range(-0.5..0.5)).collect();
    net.load_weights(&values).unwrap();
}

fn check_gradient(net: &mut Network, backprop: &Backprop, inputs: &[Tensor], targets: &[Vec<f64>]) {
    let (_, analytic) = backprop.gradient(net, inputs, targets).unwrap();
    assert_eq!(analytic.len(), net.param_count());

    for (i, &a) in analytic.iter().enumerate() {
        assert!(net.set_param(i, H, true));
        let up = backprop.objective(net, inputs, targets).unwrap();
        net.set_param(i, -2.0 * H, true);
        let down = backprop.objective(net, inputs, targets).unwrap();
        net.set_param(i, H, true);

        let numeric = (up - down) / (2.0 * H);
        let tolerance = 1e-6 * (1.0 + a.abs() + numeric.abs());
        assert!(
            (a - numeric).abs() <= tolerance,
            "parameter {i}: analytic {a}, numeric {numeric}"
        );
    }
}

fn backprop(loss: LossFunction, regularizer: Option<Regularizer>) -> Backprop {
    let mut config = TrainConfig::new(1, 0.1, 1, loss);
    if let Some(r) = regularizer {
        config = config.with_regularizer(r);
    }
    Backprop::new(config).unwrap()
}

// conv(pad 1) → max pool → dropout (fixed mask) → dense → activation → dense
fn conv_max_pool_net(rng: &mut ChaCha8Rng) -> Network {
    let input = Shape::new(2, 6, 6);
    let mut net = Network::new(input);
    let conv = Convolution::new(input, 3, (3, 3), 1, 1, Some(ActivationFunction::Tanh)).unwrap();
    let after_conv = conv.output_shape();
    net.add_layer(Layer::Convolution(conv)).unwrap();
    let pool = Pooling::max(after_conv, 2).unwrap();
    let pooled = pool.output_shape();
    net.add_layer(Layer::Pooling(pool)).unwrap();

    let keep: Vec<bool> = (0..pooled.len()).map(|i| i % 3 != 1).collect();
    let dropout = Dropout::with_seed(pooled, 0.25, 11).unwrap().with_mask(keep).unwrap();
    net.add_layer(Layer::Dropout(dropout)).unwrap();

    net.add_layer(Layer::Dense(Dense::new(pooled, 4, Some(ActivationFunction::Sigmoid)).unwrap()))
        .unwrap();
    net.add_layer(Layer::Activation(
        ActivationLayer::new(Shape::vector(4), Some(ActivationFunction::Tanh)).unwrap(),
    ))
    .unwrap();
    net.add_layer(Layer::Dense(Dense::new(Shape::vector(4), 3, Some(ActivationFunction::Identity)).unwrap()))
        .unwrap();
    net.build().unwrap();
    net.set_training(true);
    scramble(&mut net, rng);
    net
}

// strided conv → average pool with overlapping windows → dense
fn strided_average_pool_net(rng: &mut ChaCha8Rng) -> Network {
    let input = Shape::new(1, 7, 7);
    let mut net = Network::new(input).with_default_activation(ActivationFunction::Sigmoid);
    let conv = Convolution::new(input, 2, (3, 3), 2, 0, None).unwrap();
    assert_eq!(conv.output_shape(), Shape::new(2, 3, 3));
    net.add_layer(Layer::Convolution(conv)).unwrap();
    let pool = Pooling::new(PoolingKind::Average, Shape::new(2, 3, 3), (2, 2), 1).unwrap();
    assert_eq!(pool.output_shape(), Shape::new(2, 2, 2));
    net.add_layer(Layer::Pooling(pool)).unwrap();
    net.add_layer(Layer::Dense(Dense::new(Shape::new(2, 2, 2), 3, Some(ActivationFunction::Identity)).unwrap()))
        .unwrap();
    net.build().unwrap();
    scramble(&mut net, rng);
    net
}

fn dataset(net: &Network, n: usize, rng: &mut ChaCha8Rng) -> (Vec<Tensor>, Vec<Vec<f64>>) {
    let classes = net.output_shape().len();
    let inputs = (0..n).map(|_| random_tensor(net.input_shape(), rng)).collect();
    let targets = (0..n).map(|k| one_hot(k % classes, classes).unwrap()).collect();
    (inputs, targets)
}

#[test]
fn conv_pool_dropout_dense_euclidean() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut net = conv_max_pool_net(&mut rng);
    let (inputs, targets) = dataset(&net, 3, &mut rng);
    check_gradient(&mut net, &backprop(LossFunction::Euclidean, None), &inputs, &targets);
}

#[test]
fn conv_pool_dropout_dense_cross_entropy() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut net = conv_max_pool_net(&mut rng);
    let (inputs, targets) = dataset(&net, 3, &mut rng);
    check_gradient(&mut net, &backprop(LossFunction::CrossEntropySoftMax, None), &inputs, &targets);
}

#[test]
fn strided_average_pool_with_l2() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut net = strided_average_pool_net(&mut rng);
    let (inputs, targets) = dataset(&net, 4, &mut rng);
    let reg = Regularizer::L2 { lambda: 0.05 };
    check_gradient(&mut net, &backprop(LossFunction::Euclidean, Some(reg)), &inputs, &targets);
}

#[test]
fn strided_average_pool_with_l1() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut net = strided_average_pool_net(&mut rng);
    let (inputs, targets) = dataset(&net, 2, &mut rng);
    let reg = Regularizer::L1 { lambda: 0.01 };
    check_gradient(&mut net, &backprop(LossFunction::CrossEntropySoftMax, Some(reg)), &inputs, &targets);
}

#[test]
fn composite_regularizer_over_mixed_stack() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut net = conv_max_pool_net(&mut rng);
    let (inputs, targets) = dataset(&net, 2, &mut rng);
    let reg = Regularizer::Composite { l1: 0.01, l2: 0.02 };
    check_gradient(&mut net, &backprop(LossFunction::CrossEntropySoftMax, Some(reg)), &inputs, &targets);
}

#[test]
fn dense_only_stack_with_smooth_activations() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut net = Network::new(Shape::vector(5));
    net.add_layer(Layer::Dense(Dense::new(Shape::vector(5), 6, Some(ActivationFunction::Tanh)).unwrap()))
        .unwrap();
    net.add_layer(Layer::Dense(Dense::new(Shape::vector(6), 4, Some(ActivationFunction::Swish)).unwrap()))
        .unwrap();
    net.add_layer(Layer::Dense(Dense::new(Shape::vector(4), 2, Some(ActivationFunction::Sigmoid)).unwrap()))
        .unwrap();
    net.build().unwrap();
    scramble(&mut net, &mut rng);
    let (inputs, targets) = dataset(&net, 5, &mut rng);
    check_gradient(&mut net, &backprop(LossFunction::Euclidean, None), &inputs, &targets);
}
