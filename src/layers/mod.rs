pub mod activation_layer;
pub mod cache;
pub mod convolution;
pub mod dense;
pub mod dropout;
pub mod pooling;

pub use activation_layer::ActivationLayer;
pub use cache::LayerCache;
pub use convolution::Convolution;
pub use dense::Dense;
pub use dropout::Dropout;
pub use pooling::{Pooling, PoolingKind};

use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::math::tensor::{Shape, Tensor};

/// The closed set of layer kinds a `Network` can hold.
///
/// Every operation is an exhaustive match, so adding a kind means visiting
/// each of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Convolution(Convolution),
    Pooling(Pooling),
    Dense(Dense),
    Dropout(Dropout),
    Activation(ActivationLayer),
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Convolution(_) => "convolution",
            Layer::Pooling(p) if p.is_max() => "max_pooling",
            Layer::Pooling(_) => "average_pooling",
            Layer::Dense(_) => "dense",
            Layer::Dropout(_) => "dropout",
            Layer::Activation(_) => "activation",
        }
    }

    pub fn input_shape(&self) -> Shape {
        match self {
            Layer::Convolution(l) => l.input_shape(),
            Layer::Pooling(l) => l.input_shape(),
            Layer::Dense(l) => l.input_shape(),
            Layer::Dropout(l) => l.shape(),
            Layer::Activation(l) => l.shape(),
        }
    }

    pub fn output_shape(&self) -> Shape {
        match self {
            Layer::Convolution(l) => l.output_shape(),
            Layer::Pooling(l) => l.output_shape(),
            Layer::Dense(l) => l.output_shape(),
            Layer::Dropout(l) => l.shape(),
            Layer::Activation(l) => l.shape(),
        }
    }

    /// Number of scalar weights and biases the layer reads from the flat
    /// parameter vector.
    pub fn param_count(&self) -> usize {
        match self {
            Layer::Convolution(l) => l.param_count(),
            Layer::Dense(l) => l.param_count(),
            Layer::Pooling(_) | Layer::Dropout(_) | Layer::Activation(_) => 0,
        }
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        match self {
            Layer::Convolution(l) => l.activation(),
            Layer::Dense(l) => l.activation(),
            Layer::Activation(l) => l.activation(),
            Layer::Pooling(_) | Layer::Dropout(_) => None,
        }
    }

    /// Whether the layer applies an activation function of its own.
    pub fn has_activation(&self) -> bool {
        matches!(self, Layer::Convolution(_) | Layer::Dense(_) | Layer::Activation(_))
    }

    /// Fills in `default` when the layer declared no activation.
    pub(crate) fn inherit_activation(&mut self, default: ActivationFunction) {
        match self {
            Layer::Convolution(l) if l.activation().is_none() => l.set_activation(default),
            Layer::Dense(l) if l.activation().is_none() => l.set_activation(default),
            Layer::Activation(l) if l.activation().is_none() => l.set_activation(default),
            _ => {}
        }
    }

    pub fn set_training(&mut self, is_training: bool) {
        if let Layer::Dropout(l) = self {
            l.set_training(is_training);
        }
    }

    pub fn init_params<R: Rng + ?Sized>(&self, params: &mut [f64], rng: &mut R) {
        match self {
            Layer::Convolution(l) => l.init_params(params, rng),
            Layer::Dense(l) => l.init_params(params, rng),
            Layer::Pooling(_) | Layer::Dropout(_) | Layer::Activation(_) => {}
        }
    }

    /// Forward pass: writes `cache.pre` and `cache.out`.
    pub fn forward(&self, params: &[f64], input: &Tensor, cache: &mut LayerCache) {
        match self {
            Layer::Convolution(l) => l.forward(params, input, cache),
            Layer::Pooling(l) => l.forward(input, cache),
            Layer::Dense(l) => l.forward(params, input, cache),
            Layer::Dropout(l) => l.forward(input, cache),
            Layer::Activation(l) => l.forward(input, cache),
        }
    }

    /// Adds ∂L/∂input, computed from `cache.delta`, into `prev_delta`.
    pub fn backprop(&self, params: &[f64], cache: &LayerCache, prev_delta: &mut Tensor) {
        match self {
            Layer::Convolution(l) => l.backprop(params, cache, prev_delta),
            Layer::Pooling(l) => l.backprop(cache, prev_delta),
            Layer::Dense(l) => l.backprop(params, cache, prev_delta),
            Layer::Dropout(l) => l.backprop(cache, prev_delta),
            Layer::Activation(l) => l.backprop(cache, prev_delta),
        }
    }

    /// Adds this example's contribution to the layer's slice of the gradient.
    pub fn accumulate_gradient(&self, input: &Tensor, cache: &LayerCache, grad: &mut [f64]) {
        match self {
            Layer::Convolution(l) => l.accumulate_gradient(input, cache, grad),
            Layer::Dense(l) => l.accumulate_gradient(input, cache, grad),
            Layer::Pooling(_) | Layer::Dropout(_) | Layer::Activation(_) => {}
        }
    }

    /// Turns ∂L/∂out held in `cache.delta` into ∂L/∂pre.
    pub fn apply_derivative(&self, cache: &mut LayerCache) {
        match self {
            Layer::Convolution(l) => l.apply_derivative(cache),
            Layer::Dense(l) => l.apply_derivative(cache),
            Layer::Activation(l) => l.apply_derivative(cache),
            Layer::Pooling(_) | Layer::Dropout(_) => {}
        }
    }
}
