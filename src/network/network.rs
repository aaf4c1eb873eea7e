use rand::Rng;
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetError, Result};
use crate::layers::Layer;
use crate::math::tensor::{Shape, Tensor};
use crate::network::workspace::Workspace;
use crate::node::{apply_slice, ComputationNode, ParamIndex};

/// An ordered chain of layers sharing one flat parameter vector.
///
/// Layers are appended with `add_layer`, which checks each link of the shape
/// chain immediately. `build` then resolves default activations, lays out
/// the parameter vector (layer order, then each layer's own order) and
/// allocates scratch buffers. A built network accepts no further layers.
#[derive(Debug, Clone)]
pub struct Network {
    input_shape: Shape,
    layers: Vec<Layer>,
    default_activation: Option<ActivationFunction>,
    params: Vec<f64>,
    index: ParamIndex,
    built: bool,
    workspace: Option<Workspace>,
}

impl Network {
    pub fn new(input_shape: Shape) -> Network {
        Network {
            input_shape,
            layers: Vec::new(),
            default_activation: None,
            params: Vec::new(),
            index: ParamIndex::default(),
            built: false,
            workspace: None,
        }
    }

    /// Activation used by every layer that declares none.
    pub fn with_default_activation(mut self, activation: ActivationFunction) -> Network {
        self.default_activation = Some(activation);
        self
    }

    /// Appends `layer` after checking that its input shape equals the
    /// current output shape. On error the network is unchanged.
    pub fn add_layer(&mut self, layer: Layer) -> Result<&mut Network> {
        if self.built {
            return Err(NetError::AlreadyBuilt);
        }
        let expected = self.output_shape();
        let found = layer.input_shape();
        if expected != found {
            return Err(NetError::ShapeMismatch {
                layer: self.layers.len(),
                expected,
                found,
            });
        }
        self.layers.push(layer);
        Ok(self)
    }

    /// Finalizes the network. Can only succeed once.
    pub fn build(&mut self) -> Result<()> {
        if self.built {
            return Err(NetError::AlreadyBuilt);
        }
        if self.layers.is_empty() {
            return Err(NetError::EmptyNetwork);
        }
        if self.default_activation.is_none() {
            if let Some(layer) = self
                .layers
                .iter()
                .position(|l| l.has_activation() && l.activation().is_none())
            {
                return Err(NetError::MissingActivation { layer });
            }
        }
        if let Some(default) = self.default_activation {
            self.layers.iter_mut().for_each(|l| l.inherit_activation(default));
        }

        self.index = ParamIndex::from_counts(self.layers.iter().map(Layer::param_count));
        self.params = vec![0.0; self.index.total()];
        self.built = true;
        self.workspace = Some(Workspace::new(self, 0));
        debug!(
            layers = self.layers.len(),
            params = self.params.len(),
            input = %self.input_shape,
            output = %self.output_shape(),
            "network built"
        );
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    /// Output shape of the last layer, or the input shape when empty.
    pub fn output_shape(&self) -> Shape {
        self.layers
            .last()
            .map_or(self.input_shape, Layer::output_shape)
    }

    pub fn default_activation(&self) -> Option<ActivationFunction> {
        self.default_activation
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The flat parameter vector in canonical order.
    pub fn weights(&self) -> &[f64] {
        &self.params
    }

    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    pub fn param_index(&self) -> &ParamIndex {
        &self.index
    }

    /// Replaces the whole parameter vector. The length must match exactly.
    pub fn load_weights(&mut self, values: &[f64]) -> Result<()> {
        self.ensure_built()?;
        if values.len() != self.params.len() {
            return Err(NetError::ParamLength {
                expected: self.params.len(),
                found: values.len(),
            });
        }
        self.params.copy_from_slice(values);
        Ok(())
    }

    /// Draws fresh weights (He or Xavier by activation) and zero biases.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.ensure_built()?;
        for (i, layer) in self.layers.iter().enumerate() {
            layer.init_params(&mut self.params[self.index.range(i)], rng);
        }
        Ok(())
    }

    /// Switches stochastic layers (dropout) between training and inference.
    pub fn set_training(&mut self, is_training: bool) {
        self.layers.iter_mut().for_each(|l| l.set_training(is_training));
    }

    /// A fresh set of scratch buffers for worker `slot`.
    pub fn workspace(&self, slot: usize) -> Result<Workspace> {
        self.ensure_built()?;
        Ok(Workspace::new(self, slot))
    }

    fn ensure_built(&self) -> Result<()> {
        if self.built {
            Ok(())
        } else {
            Err(NetError::NotBuilt)
        }
    }

    /// Runs every layer in order, caching pre- and post-activation values in
    /// `ws`, and returns the last layer's output.
    pub fn forward<'w>(&self, input: &Tensor, ws: &'w mut Workspace) -> Result<&'w Tensor> {
        self.ensure_built()?;
        if input.shape() != self.input_shape {
            return Err(NetError::InputShape {
                expected: self.input_shape,
                found: input.shape(),
            });
        }
        for i in 0..self.layers.len() {
            let (before, rest) = ws.caches.split_at_mut(i);
            let layer_input = before.last().map_or(input, |c| &c.out);
            self.layers[i].forward(&self.params[self.index.range(i)], layer_input, &mut rest[0]);
        }
        ws.output().ok_or(NetError::EmptyNetwork)
    }

    /// Backward sweep from the last layer to the first.
    ///
    /// Expects the last layer's `delta` to hold ∂L/∂pre already. Every
    /// earlier layer's delta is zeroed and recomputed, and each layer's
    /// gradient contribution is added into `grad` at its own offset.
    pub fn backward(&self, input: &Tensor, ws: &mut Workspace, grad: &mut [f64]) {
        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];
            let range = self.index.range(i);
            let params = &self.params[range.clone()];
            let (before, rest) = ws.caches.split_at_mut(i);
            let cache = &rest[0];
            match before.last_mut() {
                Some(prev) => {
                    prev.delta.fill(0.0);
                    layer.backprop(params, cache, &mut prev.delta);
                    layer.accumulate_gradient(&prev.out, cache, &mut grad[range]);
                    self.layers[i - 1].apply_derivative(prev);
                }
                None => layer.accumulate_gradient(input, cache, &mut grad[range]),
            }
        }
    }
}

impl ComputationNode for Network {
    type Input = Tensor;
    type Output = Tensor;

    fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    fn calculate(&mut self, input: &Tensor) -> Result<Tensor> {
        let mut ws = self.workspace.take().ok_or(NetError::NotBuilt)?;
        let out = self.forward(input, &mut ws).cloned();
        self.workspace = Some(ws);
        out
    }

    fn get_param(&self, index: usize) -> Option<f64> {
        self.params.get(index).copied()
    }

    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool {
        match self.params.get_mut(index) {
            Some(p) if is_delta => *p += value,
            Some(p) => *p = value,
            None => return false,
        }
        true
    }

    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()> {
        self.ensure_built()?;
        apply_slice(&mut self.params, values, is_delta, cursor)
    }

    fn collect_params(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.params);
    }
}
