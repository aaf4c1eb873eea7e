use crate::activation::activation::ActivationFunction;
use crate::error::{invalid, Result};
use crate::layers::cache::LayerCache;
use crate::math::tensor::{Shape, Tensor};

/// Applies an activation element-wise; no parameters, shape preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationLayer {
    shape: Shape,
    activation: Option<ActivationFunction>,
}

impl ActivationLayer {
    pub fn new(shape: Shape, activation: Option<ActivationFunction>) -> Result<ActivationLayer> {
        if shape.is_empty() {
            return Err(invalid(format!("activation layer shape {shape} is empty")));
        }
        Ok(ActivationLayer { shape, activation })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        self.activation
    }

    pub(crate) fn set_activation(&mut self, activation: ActivationFunction) {
        self.activation = Some(activation);
    }

    fn act(&self) -> ActivationFunction {
        self.activation.unwrap_or(ActivationFunction::Identity)
    }

    pub fn forward(&self, input: &Tensor, cache: &mut LayerCache) {
        let act = self.act();
        cache.pre.copy_from(input);
        for (o, &x) in cache.out.as_mut_slice().iter_mut().zip(input.as_slice()) {
            *o = act.function(x);
        }
    }

    /// The layer's input is its pre-activation, so ∂L/∂input is its delta.
    pub fn backprop(&self, cache: &LayerCache, prev_delta: &mut Tensor) {
        for (p, &d) in prev_delta.as_mut_slice().iter_mut().zip(cache.delta.as_slice()) {
            *p += d;
        }
    }

    pub fn apply_derivative(&self, cache: &mut LayerCache) {
        let act = self.act();
        let LayerCache { pre, delta, .. } = cache;
        for (d, &z) in delta.as_mut_slice().iter_mut().zip(pre.as_slice()) {
            *d *= act.derivative(z);
        }
    }
}
