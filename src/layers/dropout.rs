use rand::Rng;

use crate::error::{invalid, Result};
use crate::layers::cache::LayerCache;
use crate::math::tensor::{Shape, Tensor};

/// Inverted dropout.
///
/// While training, each unit is zeroed with probability `rate` and the
/// survivors are scaled by `1 / (1 - rate)`. Outside training the layer is
/// the identity. A fixed mask, when supplied, replaces the random draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Dropout {
    shape: Shape,
    rate: f64,
    seed: u64,
    is_training: bool,
    fixed_mask: Option<Vec<bool>>,
}

impl Dropout {
    /// Draws the layer's mask seed from `rng`.
    pub fn new<R: Rng + ?Sized>(shape: Shape, rate: f64, rng: &mut R) -> Result<Dropout> {
        Dropout::with_seed(shape, rate, rng.gen())
    }

    pub fn with_seed(shape: Shape, rate: f64, seed: u64) -> Result<Dropout> {
        if !(0.0..1.0).contains(&rate) {
            return Err(invalid(format!("dropout rate {rate} must lie in [0, 1)")));
        }
        if shape.is_empty() {
            return Err(invalid(format!("dropout shape {shape} is empty")));
        }
        Ok(Dropout { shape, rate, seed, is_training: false, fixed_mask: None })
    }

    /// Uses `keep` (true = unit survives) instead of random draws.
    pub fn with_mask(mut self, keep: Vec<bool>) -> Result<Dropout> {
        if keep.len() != self.shape.len() {
            return Err(invalid(format!(
                "dropout mask has {} entries, layer has {}",
                keep.len(),
                self.shape.len()
            )));
        }
        self.fixed_mask = Some(keep);
        Ok(self)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_training(&self) -> bool {
        self.is_training
    }

    pub fn set_training(&mut self, is_training: bool) {
        self.is_training = is_training;
    }

    pub fn forward(&self, input: &Tensor, cache: &mut LayerCache) {
        let LayerCache { pre, out, mask, rng, .. } = cache;
        if !self.is_training {
            mask.iter_mut().for_each(|m| *m = 1.0);
        } else {
            let scale = 1.0 / (1.0 - self.rate);
            match (&self.fixed_mask, rng) {
                (Some(keep), _) => {
                    for (m, &k) in mask.iter_mut().zip(keep) {
                        *m = if k { scale } else { 0.0 };
                    }
                }
                (None, Some(rng)) => {
                    for m in mask.iter_mut() {
                        *m = if rng.gen::<f64>() < self.rate { 0.0 } else { scale };
                    }
                }
                (None, None) => mask.iter_mut().for_each(|m| *m = scale),
            }
        }
        pre.copy_from(input);
        for ((o, &x), &m) in out.as_mut_slice().iter_mut().zip(input.as_slice()).zip(mask.iter()) {
            *o = x * m;
        }
    }

    /// Passes each error back through the same multiplier the forward pass
    /// used: scaled for survivors, zero for dropped units.
    pub fn backprop(&self, cache: &LayerCache, prev_delta: &mut Tensor) {
        for ((p, &d), &m) in prev_delta
            .as_mut_slice()
            .iter_mut()
            .zip(cache.delta.as_slice())
            .zip(&cache.mask)
        {
            *p += d * m;
        }
    }
}
