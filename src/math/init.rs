use rand::Rng;
use std::f64::consts::PI;

use crate::activation::activation::ActivationFunction;

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Both uniforms live in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// He initialization: N(0, sqrt(2 / fan_in)).
///
/// Recommended before ReLU-family activations, which zero half of their
/// inputs on average.
pub fn he<R: Rng + ?Sized>(weights: &mut [f64], fan_in: usize, rng: &mut R) {
    let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
    for w in weights {
        *w = sample_standard_normal(rng) * std_dev;
    }
}

/// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
pub fn xavier<R: Rng + ?Sized>(weights: &mut [f64], fan_in: usize, rng: &mut R) {
    let std_dev = (1.0 / fan_in.max(1) as f64).sqrt();
    for w in weights {
        *w = sample_standard_normal(rng) * std_dev;
    }
}

/// Picks He or Xavier depending on the activation that follows the weights.
pub fn for_activation<R: Rng + ?Sized>(
    weights: &mut [f64],
    fan_in: usize,
    activation: Option<&ActivationFunction>,
    rng: &mut R,
) {
    match activation {
        Some(ActivationFunction::ReLU)
        | Some(ActivationFunction::LeakyReLU { .. })
        | Some(ActivationFunction::Elu { .. })
        | Some(ActivationFunction::Gelu)
        | Some(ActivationFunction::Swish) => he(weights, fan_in, rng),
        _ => xavier(weights, fan_in, rng),
    }
}
