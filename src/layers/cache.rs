use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::layers::Layer;
use crate::math::tensor::Tensor;

/// Per-layer scratch state for one worker: forward values, the error signal
/// and whatever routing information the backward pass needs.
#[derive(Debug, Clone)]
pub struct LayerCache {
    /// Values before the activation function.
    pub pre: Tensor,
    /// Values after the activation function; the next layer's input.
    pub out: Tensor,
    /// ∂L/∂pre for this layer.
    pub delta: Tensor,
    /// Max pooling: flat input offset that produced each output cell.
    pub argmax: Vec<usize>,
    /// Dropout: multiplier applied to each unit on the last forward pass.
    pub mask: Vec<f64>,
    /// Dropout: generator for this worker slot.
    pub rng: Option<ChaCha8Rng>,
}

impl LayerCache {
    pub fn new(layer: &Layer, slot: usize) -> LayerCache {
        let shape = layer.output_shape();
        let (argmax, mask, rng) = match layer {
            Layer::Pooling(p) if p.is_max() => (vec![0; shape.len()], Vec::new(), None),
            Layer::Dropout(d) => {
                let mut rng = ChaCha8Rng::seed_from_u64(d.seed());
                rng.set_stream(slot as u64);
                (Vec::new(), vec![1.0; shape.len()], Some(rng))
            }
            _ => (Vec::new(), Vec::new(), None),
        };
        LayerCache {
            pre: Tensor::zeros(shape),
            out: Tensor::zeros(shape),
            delta: Tensor::zeros(shape),
            argmax,
            mask,
            rng,
        }
    }
}
