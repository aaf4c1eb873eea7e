use std::sync::mpsc;
use std::thread;

use ferrite_conv::train::{evaluate, one_hot_targets};
use ferrite_conv::{
    ActivationFunction, Backprop, Convolution, Dense, Dropout, Layer, LossFunction, Network, OptimizerKind, Pooling,
    Shape, StopCriterion, Tensor, TrainConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// 8×8 images containing either a horizontal or a vertical bar.
fn bars(rng: &mut ChaCha8Rng, count: usize) -> (Vec<Tensor>, Vec<usize>) {
    let shape = Shape::new(1, 8, 8);
    let mut inputs = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    for i in 0..count {
        let label = i % 2;
        let mut t = Tensor::zeros(shape);
        let at = rng.gen_range(1..7);
        for k in 0..8 {
            let (row, col) = if label == 0 { (at, k) } else { (k, at) };
            t[(0, row, col)] = 1.0;
        }
        for v in t.as_mut_slice() {
            *v += rng.gen_range(-0.1..0.1);
        }
        inputs.push(t);
        labels.push(label);
    }
    (inputs, labels)
}

fn main() -> ferrite_conv::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let input = Shape::new(1, 8, 8);
    let mut network = Network::new(input).with_default_activation(ActivationFunction::ReLU);
    let conv = Convolution::new(input, 4, (3, 3), 1, 1, None)?;
    let pool = Pooling::max(conv.output_shape(), 2)?;
    let dropout = Dropout::new(pool.output_shape(), 0.2, &mut rng)?;
    let dense = Dense::new(dropout.shape(), 2, Some(ActivationFunction::Identity))?;
    network.add_layer(Layer::Convolution(conv))?;
    network.add_layer(Layer::Pooling(pool))?;
    network.add_layer(Layer::Dropout(dropout))?;
    network.add_layer(Layer::Dense(dense))?;
    network.build()?;
    network.randomize(&mut rng)?;

    let (inputs, labels) = bars(&mut rng, 64);
    let targets = one_hot_targets(&labels)?;

    let (tx, rx) = mpsc::channel::<ferrite_conv::EpochStats>();
    let printer = thread::spawn(move || {
        for stats in rx {
            println!("epoch {:>3}: loss {:.5}", stats.epoch, stats.loss);
        }
    });

    let config = TrainConfig::new(40, 0.01, 8, LossFunction::CrossEntropySoftMax)
        .with_optimizer(OptimizerKind::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 })
        .with_stop(StopCriterion::LossDelta { threshold: 1e-5 })
        .with_threads(4)
        .with_shuffle_seed(7)
        .with_progress(tx);
    let mut backprop = Backprop::new(config)?;
    let report = backprop.train(&mut network, &inputs, &targets)?;
    drop(backprop);
    let _ = printer.join();

    let eval = evaluate(&network, &inputs, &targets, LossFunction::CrossEntropySoftMax)?;
    println!(
        "{:?} after {} epochs: loss {:.4}, accuracy {:.1}%",
        report.reason,
        report.epochs_run,
        eval.loss,
        eval.accuracy * 100.0
    );
    Ok(())
}
