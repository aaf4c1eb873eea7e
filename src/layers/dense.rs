use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{invalid, Result};
use crate::layers::cache::LayerCache;
use crate::layers::convolution::Convolution;
use crate::math::tensor::{Shape, Tensor};

/// Fully-connected layer: a convolution whose window spans the whole input,
/// one filter per output unit. Flattens any input to `units × 1 × 1`.
///
/// The parameter layout is the convolution's: for each unit, one weight per
/// input element in depth-major order, then all biases.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    conv: Convolution,
}

impl Dense {
    pub fn new(input: Shape, units: usize, activation: Option<ActivationFunction>) -> Result<Dense> {
        if units == 0 {
            return Err(invalid("dense layer needs at least one unit"));
        }
        let conv = Convolution::new(input, units, (input.height, input.width), 1, 0, activation)?;
        Ok(Dense { conv })
    }

    pub fn units(&self) -> usize {
        self.conv.filters()
    }

    pub fn input_shape(&self) -> Shape {
        self.conv.input_shape()
    }

    pub fn output_shape(&self) -> Shape {
        self.conv.output_shape()
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        self.conv.activation()
    }

    pub(crate) fn set_activation(&mut self, activation: ActivationFunction) {
        self.conv.set_activation(activation);
    }

    pub fn param_count(&self) -> usize {
        self.conv.param_count()
    }

    pub fn init_params<R: Rng + ?Sized>(&self, params: &mut [f64], rng: &mut R) {
        self.conv.init_params(params, rng);
    }

    pub fn forward(&self, params: &[f64], input: &Tensor, cache: &mut LayerCache) {
        self.conv.forward(params, input, cache);
    }

    pub fn backprop(&self, params: &[f64], cache: &LayerCache, prev_delta: &mut Tensor) {
        self.conv.backprop(params, cache, prev_delta);
    }

    pub fn accumulate_gradient(&self, input: &Tensor, cache: &LayerCache, grad: &mut [f64]) {
        self.conv.accumulate_gradient(input, cache, grad);
    }

    pub fn apply_derivative(&self, cache: &mut LayerCache) {
        self.conv.apply_derivative(cache);
    }
}
