use ferrite_conv::{
    ActivationFunction, Backprop, ComputationNode, Dense, Layer, LossFunction, Network, OptimizerKind, Shape,
    Tensor, TrainConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> ferrite_conv::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();

    let mut network = Network::new(Shape::vector(2)).with_default_activation(ActivationFunction::Sigmoid);
    network.add_layer(Layer::Dense(Dense::new(Shape::vector(2), 3, None)?))?;
    network.add_layer(Layer::Dense(Dense::new(Shape::vector(3), 1, None)?))?;
    network.build()?;
    network.randomize(&mut ChaCha8Rng::seed_from_u64(3))?;

    let inputs: Vec<Tensor> = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ]
    .into_iter()
    .map(Tensor::from)
    .collect();
    let expected_outputs = vec![vec![1.0], vec![0.0], vec![1.0], vec![0.0]];

    let config = TrainConfig::new(5000, 0.5, 4, LossFunction::Euclidean)
        .with_optimizer(OptimizerKind::Momentum { mu: 0.9 })
        .with_shuffle_seed(1);
    let mut backprop = Backprop::new(config)?;
    let report = backprop.train(&mut network, &inputs, &expected_outputs)?;
    println!("{} epochs, final loss = {:.6}", report.epochs_run, report.final_loss);

    for input in &inputs {
        let output = network.calculate(input)?;
        println!("Input: {:?} -> Output: {:.4}", input.as_slice(), output.as_slice()[0]);
    }
    Ok(())
}
